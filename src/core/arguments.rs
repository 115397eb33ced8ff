//! Argument binding: token group + usage schema -> named arguments.
//!
//! Parameters are matched positionally in declaration order against the
//! tokens that follow the directive name. Optional parameters may only be
//! omitted from the tail; there are no gaps. Binding checks token kinds
//! only, semantic validation belongs to the directive.

use super::symbol::{SourceSpan, TokenGroup};
use super::token::{LazyNumber, NumericRange, Token, TokenKind};
use super::usage::UsageSchema;
use crate::error::BindError;
use crate::units::{ByteSize, TimeDuration};
use indexmap::IndexMap;
use tracing::debug;

/// Arguments bound for one directive occurrence. Read-only after binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Arguments {
    directive: String,
    values: IndexMap<String, Token>,
    span: SourceSpan,
}

impl Arguments {
    pub fn bind(schema: &UsageSchema, group: &TokenGroup) -> Result<Self, BindError> {
        let directive = schema.directive().to_string();
        let args = match group.tokens().split_first() {
            Some((Token::DirectiveName(_), rest)) => rest,
            _ => {
                return Err(BindError::MissingDirectiveName {
                    span: group.span().clone(),
                })
            }
        };

        let mut values = IndexMap::with_capacity(schema.parameters().len());
        for (i, param) in schema.parameters().iter().enumerate() {
            match args.get(i) {
                Some(token) if token.kind() == param.kind => {
                    values.insert(param.name.clone(), token.clone());
                }
                Some(token) => {
                    return Err(BindError::TypeMismatch {
                        directive,
                        name: param.name.clone(),
                        expected: param.kind,
                        found: token.kind(),
                    })
                }
                None if param.optional => {}
                None => {
                    return Err(BindError::MissingRequired {
                        directive,
                        name: param.name.clone(),
                        kind: param.kind,
                        usage: schema.usage(),
                    })
                }
            }
        }

        if let Some(extra) = args.get(schema.parameters().len()) {
            return Err(BindError::UnexpectedArgument {
                directive,
                position: schema.parameters().len() + 1,
                kind: extra.kind(),
                usage: schema.usage(),
            });
        }

        debug!(directive = %directive, bound = values.len(), "bound arguments");
        Ok(Self {
            directive,
            values,
            span: group.span().clone(),
        })
    }

    pub fn directive(&self) -> &str {
        &self.directive
    }

    /// Source span of the directive occurrence these arguments came from.
    pub fn span(&self) -> &SourceSpan {
        &self.span
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether `name` was supplied in this invocation.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// The bound token for `name`.
    pub fn value(&self, name: &str) -> Result<&Token, BindError> {
        self.values
            .get(name)
            .ok_or_else(|| BindError::NotSupplied {
                directive: self.directive.clone(),
                name: name.to_string(),
            })
    }

    fn typed<'a, T>(
        &'a self,
        name: &str,
        expected: TokenKind,
        pick: impl FnOnce(&'a Token) -> Option<T>,
    ) -> Result<T, BindError> {
        let token = self.value(name)?;
        pick(token).ok_or_else(|| BindError::TypeMismatch {
            directive: self.directive.clone(),
            name: name.to_string(),
            expected,
            found: token.kind(),
        })
    }

    pub fn column(&self, name: &str) -> Result<&str, BindError> {
        self.typed(name, TokenKind::ColumnName, |t| match t {
            Token::ColumnName(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn columns(&self, name: &str) -> Result<&[String], BindError> {
        self.typed(name, TokenKind::ColumnNameList, |t| match t {
            Token::ColumnNameList(v) => Some(v.as_slice()),
            _ => None,
        })
    }

    pub fn text(&self, name: &str) -> Result<&str, BindError> {
        self.typed(name, TokenKind::Text, |t| match t {
            Token::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn texts(&self, name: &str) -> Result<&[String], BindError> {
        self.typed(name, TokenKind::TextList, |t| match t {
            Token::TextList(v) => Some(v.as_slice()),
            _ => None,
        })
    }

    pub fn numeric(&self, name: &str) -> Result<&LazyNumber, BindError> {
        self.typed(name, TokenKind::Numeric, |t| match t {
            Token::Numeric(n) => Some(n),
            _ => None,
        })
    }

    pub fn numerics(&self, name: &str) -> Result<&[LazyNumber], BindError> {
        self.typed(name, TokenKind::NumericList, |t| match t {
            Token::NumericList(v) => Some(v.as_slice()),
            _ => None,
        })
    }

    pub fn boolean(&self, name: &str) -> Result<bool, BindError> {
        self.typed(name, TokenKind::Bool, |t| match t {
            Token::Bool(b) => Some(*b),
            _ => None,
        })
    }

    pub fn booleans(&self, name: &str) -> Result<&[bool], BindError> {
        self.typed(name, TokenKind::BoolList, |t| match t {
            Token::BoolList(v) => Some(v.as_slice()),
            _ => None,
        })
    }

    pub fn identifier(&self, name: &str) -> Result<&str, BindError> {
        self.typed(name, TokenKind::Identifier, |t| match t {
            Token::Identifier(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn expression(&self, name: &str) -> Result<&str, BindError> {
        self.typed(name, TokenKind::Expression, |t| match t {
            Token::Expression(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn properties(&self, name: &str) -> Result<&IndexMap<String, Token>, BindError> {
        self.typed(name, TokenKind::Properties, |t| match t {
            Token::Properties(p) => Some(p),
            _ => None,
        })
    }

    pub fn ranges(&self, name: &str) -> Result<&[NumericRange], BindError> {
        self.typed(name, TokenKind::Ranges, |t| match t {
            Token::Ranges(r) => Some(r.as_slice()),
            _ => None,
        })
    }

    pub fn byte_size(&self, name: &str) -> Result<&ByteSize, BindError> {
        self.typed(name, TokenKind::ByteSize, |t| match t {
            Token::ByteSize(b) => Some(b),
            _ => None,
        })
    }

    pub fn time_duration(&self, name: &str) -> Result<&TimeDuration, BindError> {
        self.typed(name, TokenKind::TimeDuration, |t| match t {
            Token::TimeDuration(d) => Some(d),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compiler::compile;

    fn schema() -> UsageSchema {
        UsageSchema::builder("limit")
            .define("col", TokenKind::ColumnName)
            .define("max", TokenKind::ByteSize)
            .define_optional("label", TokenKind::Text)
            .define_optional("strict", TokenKind::Bool)
            .build()
    }

    fn bind(recipe: &str) -> Result<Arguments, BindError> {
        let table = compile(recipe).unwrap();
        Arguments::bind(&schema(), &table.token_groups()[0])
    }

    #[test]
    fn test_arguments_bind_all() {
        let args = bind("limit :size 10MB 'big' true").unwrap();
        assert_eq!(args.len(), 4);
        assert_eq!(args.column("col").unwrap(), "size");
        assert_eq!(args.byte_size("max").unwrap().bytes(), 10 * 1024 * 1024);
        assert_eq!(args.text("label").unwrap(), "big");
        assert!(args.boolean("strict").unwrap());
        assert_eq!(args.span().source, "limit :size 10MB 'big' true");
    }

    #[test]
    fn test_arguments_trailing_optional_omitted() {
        let args = bind("limit :size 10MB").unwrap();
        assert!(args.contains("col"));
        assert!(!args.contains("label"));
        assert!(matches!(
            args.text("label"),
            Err(BindError::NotSupplied { .. })
        ));
    }

    #[test]
    fn test_arguments_no_gaps() {
        // a bool where the text is expected is a mismatch, not a skipped optional
        let err = bind("limit :size 10MB true").unwrap_err();
        match err {
            BindError::TypeMismatch {
                name,
                expected,
                found,
                ..
            } => {
                assert_eq!(name, "label");
                assert_eq!(expected, TokenKind::Text);
                assert_eq!(found, TokenKind::Bool);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_arguments_missing_required() {
        let err = bind("limit :size").unwrap_err();
        match err {
            BindError::MissingRequired { name, usage, .. } => {
                assert_eq!(name, "max");
                assert_eq!(usage, "limit :col <max> ['label'] [<strict>]");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_arguments_unexpected_extra() {
        let err = bind("limit :size 10MB 'x' false 42").unwrap_err();
        assert!(matches!(
            err,
            BindError::UnexpectedArgument {
                position: 5,
                kind: TokenKind::Numeric,
                ..
            }
        ));
    }

    #[test]
    fn test_arguments_accessor_mismatch() {
        let args = bind("limit :size 10MB").unwrap();
        let err = args.text("col").unwrap_err();
        assert!(matches!(
            err,
            BindError::TypeMismatch {
                expected: TokenKind::Text,
                found: TokenKind::ColumnName,
                ..
            }
        ));
        assert!(args.time_duration("max").is_err());
        assert!(args.value("max").is_ok());
    }

    #[test]
    fn test_arguments_requires_directive_name() {
        let mut b = crate::core::symbol::SymbolTableBuilder::new();
        b.open_group(SourceSpan {
            start_line: 1,
            start_column: 0,
            end_line: 1,
            end_column: 2,
            source: ":a".into(),
        });
        b.push_token(Token::ColumnName("a".into()));
        let table = b.build();
        let err = Arguments::bind(&schema(), &table.token_groups()[0]).unwrap_err();
        assert!(matches!(err, BindError::MissingDirectiveName { .. }));
    }
}
