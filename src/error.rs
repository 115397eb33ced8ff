//! Error taxonomy for compilation, binding and execution.

use crate::core::symbol::SourceSpan;
use crate::core::token::TokenKind;
use crate::units::UnitError;
use thiserror::Error;

/// Result type of the pipeline entry points.
pub type Result<T> = std::result::Result<T, RecipeError>;

/// Failures while turning recipe text into a symbol table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// The grammar engine rejected the input.
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// A unit-value literal did not have the `<number><unit>` shape.
    #[error("malformed literal in '{}' at line {}, column {}: {error}", .span.source, .span.start_line, .span.start_column)]
    LexicalFormat {
        span: SourceSpan,
        #[source]
        error: UnitError,
    },

    /// A unit-value literal used a unit outside the recognized set.
    #[error("unrecognized unit in '{}' at line {}, column {}: {error}", .span.source, .span.start_line, .span.start_column)]
    UnrecognizedUnit {
        span: SourceSpan,
        #[source]
        error: UnitError,
    },

    /// A numeric literal that cannot be represented.
    #[error("numeric literal '{text}' out of range in '{}' at line {}", .span.source, .span.start_line)]
    InvalidNumber { span: SourceSpan, text: String },

    /// The syntax tree had a shape the compiler does not accept.
    #[error("malformed syntax tree at line {}: {message}", .span.start_line)]
    Malformed { span: SourceSpan, message: String },
}

impl CompileError {
    /// Map a unit parse failure onto the compile-time category.
    pub fn from_unit(span: SourceSpan, error: UnitError) -> Self {
        match error {
            UnitError::Format { .. } => Self::LexicalFormat { span, error },
            UnitError::UnrecognizedUnit { .. } => Self::UnrecognizedUnit { span, error },
        }
    }

    /// Source span of the offending directive, if known.
    pub fn span(&self) -> Option<&SourceSpan> {
        match self {
            Self::Syntax { .. } => None,
            Self::LexicalFormat { span, .. }
            | Self::UnrecognizedUnit { span, .. }
            | Self::InvalidNumber { span, .. }
            | Self::Malformed { span, .. } => Some(span),
        }
    }
}

/// Failures binding a token group to a usage schema, or reading a bound
/// argument with the wrong type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    #[error("directive '{directive}': argument '{name}' was not supplied")]
    NotSupplied { directive: String, name: String },

    #[error("directive '{directive}': argument '{name}' expects {expected}, found {found}")]
    TypeMismatch {
        directive: String,
        name: String,
        expected: TokenKind,
        found: TokenKind,
    },

    #[error("directive '{directive}' is missing required argument '{name}' ({kind}); usage: {usage}")]
    MissingRequired {
        directive: String,
        name: String,
        kind: TokenKind,
        usage: String,
    },

    #[error("directive '{directive}' got an unexpected {kind} argument at position {position}; usage: {usage}")]
    UnexpectedArgument {
        directive: String,
        position: usize,
        kind: TokenKind,
        usage: String,
    },

    #[error("directive at line {} does not start with a directive name: '{}'", .span.start_line, .span.source)]
    MissingDirectiveName { span: SourceSpan },
}

/// Failures raised by a directive's own lifecycle methods.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DirectiveError {
    /// The directive rejected its arguments during `initialize`.
    #[error("directive '{directive}' rejected its arguments: {message}")]
    Initialization { directive: String, message: String },

    /// A batch could not be processed.
    #[error("directive '{directive}' failed on column '{column}': {message}")]
    Execution {
        directive: String,
        column: String,
        message: String,
    },

    #[error(transparent)]
    Bind(#[from] BindError),
}

/// Any failure surfaced by the recipe pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecipeError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Directive(#[from] DirectiveError),

    #[error("unknown directive '{name}' at line {}", .span.start_line)]
    UnknownDirective { name: String, span: SourceSpan },

    #[error("#pragma load-directives requested unknown directive '{0}'")]
    UnknownLoadableDirective(String),

    #[error("recipe declares grammar version {found}, configuration requires {expected}")]
    VersionMismatch { expected: String, found: String },
}
