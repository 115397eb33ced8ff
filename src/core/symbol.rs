//! Recipe symbol table: the compiled form of a recipe.
//!
//! One [`TokenGroup`] per directive occurrence, in source order, plus the
//! pragma metadata. The table is assembled through [`SymbolTableBuilder`]
//! and is read-only once built.

use super::token::Token;
use indexmap::IndexSet;
use serde_json::{json, Value as JsonValue};
use std::fmt;

/// Location of a directive occurrence in the recipe source.
///
/// Lines are 1-based, columns are 0-based character offsets within the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpan {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
    /// Original substring of the directive.
    pub source: String,
}

impl SourceSpan {
    pub fn to_json(&self) -> JsonValue {
        json!({
            "line": self.start_line,
            "column": self.start_column,
            "endLine": self.end_line,
            "endColumn": self.end_column,
            "source": self.source,
        })
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>3}:{:<3} - '{}'",
            self.start_line, self.start_column, self.source
        )
    }
}

/// Tokens of one directive occurrence, in parse order.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenGroup {
    tokens: Vec<Token>,
    span: SourceSpan,
}

impl TokenGroup {
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn span(&self) -> &SourceSpan {
        &self.span
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Name of the directive this group invokes (its leading token).
    pub fn directive_name(&self) -> Option<&str> {
        match self.tokens.first() {
            Some(Token::DirectiveName(name)) => Some(name),
            _ => None,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        json!({
            "source": self.span.to_json(),
            "tokens": self.tokens.iter().map(Token::to_json).collect::<Vec<_>>(),
        })
    }
}

/// Compiled recipe: ordered token groups plus pragma metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeSymbolTable {
    groups: Vec<TokenGroup>,
    loadable_directives: IndexSet<String>,
    version: Option<String>,
}

impl RecipeSymbolTable {
    pub fn token_groups(&self) -> &[TokenGroup] {
        &self.groups
    }

    /// Directive names requested through `#pragma load-directives`.
    pub fn loadable_directives(&self) -> impl Iterator<Item = &str> {
        self.loadable_directives.iter().map(String::as_str)
    }

    /// Grammar version declared through `#pragma version`.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn to_json(&self) -> JsonValue {
        json!({
            "version": self.version,
            "load_directives": self.loadable_directives,
            "directives": self.groups.iter().map(TokenGroup::to_json).collect::<Vec<_>>(),
        })
    }
}

/// Incremental builder owned by the compiler while it walks a syntax tree.
#[derive(Debug, Default)]
pub struct SymbolTableBuilder {
    table: RecipeSymbolTable,
    open: Option<TokenGroup>,
}

impl SymbolTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the current group (if any) and open a new one at `span`.
    pub fn open_group(&mut self, span: SourceSpan) {
        self.close_group();
        self.open = Some(TokenGroup {
            tokens: Vec::new(),
            span,
        });
    }

    /// Close the currently open group.
    pub fn close_group(&mut self) {
        if let Some(group) = self.open.take() {
            self.table.groups.push(group);
        }
    }

    /// Append a token to the open group. Returns `false` when no group is
    /// open, which means the caller emitted a token outside a directive.
    pub fn push_token(&mut self, token: Token) -> bool {
        match self.open.as_mut() {
            Some(group) => {
                group.tokens.push(token);
                true
            }
            None => false,
        }
    }

    pub fn add_loadable_directive(&mut self, name: impl Into<String>) {
        self.table.loadable_directives.insert(name.into());
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.table.version = Some(version.into());
    }

    pub fn build(mut self) -> RecipeSymbolTable {
        self.close_group();
        self.table
    }
}
