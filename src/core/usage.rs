//! Usage schemas: the ordered parameter list a directive accepts.

use super::token::TokenKind;
use std::fmt;

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageParameter {
    pub name: String,
    pub kind: TokenKind,
    pub optional: bool,
}

impl UsageParameter {
    fn render(&self) -> String {
        let body = match self.kind {
            TokenKind::ColumnName => format!(":{}", self.name),
            TokenKind::ColumnNameList => format!(":{}[,:{}...]", self.name, self.name),
            TokenKind::Text => format!("'{}'", self.name),
            TokenKind::TextList => format!("'{}'[,'{}'...]", self.name, self.name),
            TokenKind::NumericList | TokenKind::BoolList => {
                format!("<{}>[,<{}>...]", self.name, self.name)
            }
            TokenKind::Properties => format!("prop:{{{}}}", self.name),
            TokenKind::Expression => format!("exp:{{{}}}", self.name),
            _ => format!("<{}>", self.name),
        };
        if self.optional {
            format!("[{}]", body)
        } else {
            body
        }
    }
}

/// Immutable, ordered parameter list of one directive type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageSchema {
    directive: String,
    parameters: Vec<UsageParameter>,
}

impl UsageSchema {
    /// Start a schema for `directive`. Parameters are added with
    /// [`define`](Self::define) and [`define_optional`](Self::define_optional).
    pub fn builder(directive: impl Into<String>) -> UsageSchemaBuilder {
        UsageSchemaBuilder {
            schema: UsageSchema {
                directive: directive.into(),
                parameters: Vec::new(),
            },
        }
    }

    pub fn directive(&self) -> &str {
        &self.directive
    }

    pub fn parameters(&self) -> &[UsageParameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&UsageParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Number of parameters that must be supplied.
    pub fn required_count(&self) -> usize {
        self.parameters.iter().filter(|p| !p.optional).count()
    }

    /// Human-readable usage line, e.g.
    /// `aggregate-stats :byte_column :time_column ['byte_output_unit']`.
    pub fn usage(&self) -> String {
        std::iter::once(self.directive.clone())
            .chain(self.parameters.iter().map(UsageParameter::render))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for UsageSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.usage())
    }
}

#[derive(Debug, Clone)]
pub struct UsageSchemaBuilder {
    schema: UsageSchema,
}

impl UsageSchemaBuilder {
    pub fn define(self, name: impl Into<String>, kind: TokenKind) -> Self {
        self.push(name.into(), kind, false)
    }

    pub fn define_optional(self, name: impl Into<String>, kind: TokenKind) -> Self {
        self.push(name.into(), kind, true)
    }

    fn push(mut self, name: String, kind: TokenKind, optional: bool) -> Self {
        self.schema.parameters.push(UsageParameter {
            name,
            kind,
            optional,
        });
        self
    }

    pub fn build(self) -> UsageSchema {
        self.schema
    }
}
