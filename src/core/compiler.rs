//! Recipe compiler: syntax tree to [`RecipeSymbolTable`].
//!
//! Walks the tree in source order. Each `Directive` node opens a token
//! group; every argument node becomes exactly one typed token. Pragmas are
//! recorded on the table instead of producing tokens.

use super::parser;
use super::symbol::{RecipeSymbolTable, SourceSpan, SymbolTableBuilder};
use super::syntax::{Rule, SyntaxNode};
use super::token::{LazyNumber, NumericRange, Token};
use crate::error::CompileError;
use crate::units::{ByteSize, TimeDuration};
use indexmap::IndexMap;
use tracing::debug;

/// Parse and compile recipe text.
pub fn compile(source: &str) -> Result<RecipeSymbolTable, CompileError> {
    let tree = parser::parse(source)?;
    compile_tree(&tree)
}

/// Compile an already-parsed tree. Any grammar engine that emits
/// [`SyntaxNode`] trees can feed this.
pub fn compile_tree(tree: &SyntaxNode) -> Result<RecipeSymbolTable, CompileError> {
    let mut builder = SymbolTableBuilder::new();
    for node in &tree.children {
        match node.rule {
            Rule::Directive => compile_directive(&mut builder, node)?,
            Rule::PragmaLoadDirective => {
                builder.close_group();
                for name in node.children_by_rule(Rule::Identifier) {
                    builder.add_loadable_directive(name.text.trim());
                }
            }
            Rule::PragmaVersion => {
                builder.close_group();
                if let Some(version) = node.children.first() {
                    builder.set_version(version.text.trim());
                }
            }
            other => {
                return Err(CompileError::Malformed {
                    span: span_of(node),
                    message: format!("unexpected {} at recipe level", other),
                })
            }
        }
    }
    let table = builder.build();
    debug!(directives = table.len(), "compiled recipe");
    Ok(table)
}

/// Span covering a node; `end_column` is exclusive.
pub fn span_of(node: &SyntaxNode) -> SourceSpan {
    SourceSpan {
        start_line: node.start.line,
        start_column: node.start.column,
        end_line: node.stop.line,
        end_column: node.stop.column + 1,
        source: node.text.clone(),
    }
}

fn compile_directive(builder: &mut SymbolTableBuilder, node: &SyntaxNode) -> Result<(), CompileError> {
    let span = span_of(node);
    builder.open_group(span.clone());
    for child in &node.children {
        let token = to_token(child, &span)?;
        if !builder.push_token(token) {
            return Err(CompileError::Malformed {
                span,
                message: "token emitted outside a directive".to_string(),
            });
        }
    }
    builder.close_group();
    debug!(source = %span.source, tokens = node.children.len(), "compiled directive");
    Ok(())
}

fn to_token(node: &SyntaxNode, span: &SourceSpan) -> Result<Token, CompileError> {
    let text = node.text.trim();
    let token = match node.rule {
        Rule::Command => Token::DirectiveName(text.to_string()),
        Rule::Ecommand => Token::DirectiveName(text.trim_start_matches('!').to_string()),
        Rule::Identifier => Token::Identifier(text.to_string()),
        Rule::Column => Token::ColumnName(column_name(text)),
        Rule::ColList => Token::ColumnNameList(
            node.children_by_rule(Rule::Column)
                .map(|c| column_name(&c.text))
                .collect(),
        ),
        Rule::Text => Token::Text(unquote(text)),
        Rule::StringList => Token::TextList(
            node.children_by_rule(Rule::Text)
                .map(|c| unquote(&c.text))
                .collect(),
        ),
        Rule::Number => Token::Numeric(number(text, span)?),
        Rule::NumberList => Token::NumericList(
            node.children_by_rule(Rule::Number)
                .map(|c| number(&c.text, span))
                .collect::<Result<_, _>>()?,
        ),
        Rule::Bool => Token::Bool(boolean(text)),
        Rule::BoolList => Token::BoolList(
            node.children_by_rule(Rule::Bool)
                .map(|c| boolean(&c.text))
                .collect(),
        ),
        Rule::ByteSize => Token::ByteSize(
            ByteSize::parse(text).map_err(|e| CompileError::from_unit(span.clone(), e))?,
        ),
        Rule::TimeDuration => Token::TimeDuration(
            TimeDuration::parse(text).map_err(|e| CompileError::from_unit(span.clone(), e))?,
        ),
        Rule::PropertyList => Token::Properties(properties(node, span)?),
        Rule::NumberRanges => Token::Ranges(ranges(node, span)?),
        Rule::Condition => Token::Expression(expression(text)),
        other => {
            return Err(CompileError::Malformed {
                span: span.clone(),
                message: format!("{} is not a directive argument", other),
            })
        }
    };
    Ok(token)
}

fn column_name(text: &str) -> String {
    text.trim().trim_start_matches(':').to_string()
}

/// Strip one pair of matching surrounding quotes.
fn unquote(text: &str) -> String {
    let text = text.trim();
    for quote in ['\'', '"'] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return text[1..text.len() - 1].to_string();
        }
    }
    text.to_string()
}

fn boolean(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case("true")
}

fn number(text: &str, span: &SourceSpan) -> Result<LazyNumber, CompileError> {
    LazyNumber::parse(text).ok_or_else(|| CompileError::InvalidNumber {
        span: span.clone(),
        text: text.trim().to_string(),
    })
}

/// Body of `exp:{...}` or `{...}` without the outer braces.
fn expression(text: &str) -> String {
    let body = text.strip_prefix("exp").map(str::trim_start).unwrap_or(text);
    let body = body.strip_prefix(':').map(str::trim_start).unwrap_or(body);
    body.strip_prefix('{')
        .and_then(|b| b.strip_suffix('}'))
        .unwrap_or(body)
        .trim()
        .to_string()
}

fn properties(node: &SyntaxNode, span: &SourceSpan) -> Result<IndexMap<String, Token>, CompileError> {
    let mut map = IndexMap::new();
    for prop in node.children_by_rule(Rule::Property) {
        let (key, value) = match prop.children.as_slice() {
            [key, value] => (key, value),
            _ => {
                return Err(CompileError::Malformed {
                    span: span.clone(),
                    message: format!("property '{}' needs a key and a value", prop.text),
                })
            }
        };
        let value = match value.rule {
            Rule::Number => Token::Numeric(number(&value.text, span)?),
            Rule::Bool => Token::Bool(boolean(&value.text)),
            Rule::Text | Rule::Identifier => Token::Text(unquote(&value.text)),
            other => {
                return Err(CompileError::Malformed {
                    span: span.clone(),
                    message: format!("{} is not a property value", other),
                })
            }
        };
        map.insert(unquote(&key.text), value);
    }
    Ok(map)
}

fn ranges(node: &SyntaxNode, span: &SourceSpan) -> Result<Vec<NumericRange>, CompileError> {
    node.children_by_rule(Rule::NumberRange)
        .map(|range| match range.children.as_slice() {
            [low, high, label] => Ok(NumericRange {
                low: number(&low.text, span)?,
                high: number(&high.text, span)?,
                label: unquote(&label.text),
            }),
            _ => Err(CompileError::Malformed {
                span: span.clone(),
                message: format!("range '{}' needs low, high and value", range.text),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::token::TokenKind;
    use crate::units::{ByteUnit, TimeUnit};

    fn kinds(source: &str) -> Vec<TokenKind> {
        let table = compile(source).unwrap();
        table.token_groups()[0]
            .tokens()
            .iter()
            .map(Token::kind)
            .collect()
    }

    #[test]
    fn test_compiler_token_order() {
        assert_eq!(
            kinds("aggregate-stats :size :time total_size total_time 'MB' 's'"),
            vec![
                TokenKind::DirectiveName,
                TokenKind::ColumnName,
                TokenKind::ColumnName,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Text,
                TokenKind::Text,
            ]
        );
    }

    #[test]
    fn test_compiler_strips_markers() {
        let table = compile("!udd :col 'quoted' \"dq\"").unwrap();
        let tokens = table.token_groups()[0].tokens();
        assert_eq!(tokens[0], Token::DirectiveName("udd".into()));
        assert_eq!(tokens[1], Token::ColumnName("col".into()));
        assert_eq!(tokens[2], Token::Text("quoted".into()));
        assert_eq!(tokens[3], Token::Text("dq".into()));
    }

    #[test]
    fn test_compiler_unit_tokens() {
        let table = compile("set-limit 10KB 1.5h").unwrap();
        let tokens = table.token_groups()[0].tokens();
        match &tokens[1] {
            Token::ByteSize(b) => {
                assert_eq!(b.bytes(), 10_240);
                assert_eq!(b.unit(), ByteUnit::KB);
            }
            other => panic!("expected byte size, got {:?}", other),
        }
        match &tokens[2] {
            Token::TimeDuration(t) => assert_eq!(t.unit(), TimeUnit::Hours),
            other => panic!("expected duration, got {:?}", other),
        }
    }

    #[test]
    fn test_compiler_unknown_unit() {
        let err = compile("drop :a\nset-limit 10QB").unwrap_err();
        match err {
            CompileError::UnrecognizedUnit { span, .. } => {
                assert_eq!(span.start_line, 2);
                assert_eq!(span.source, "set-limit 10QB");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_compiler_lists_props_ranges() {
        let table =
            compile("x :a,:b 1,2.5 'p','q' true,FALSE prop:{k=1, f=true, s='v'} 0:9='lo',10:20=5")
                .unwrap();
        let tokens = table.token_groups()[0].tokens();
        assert_eq!(tokens[1], Token::ColumnNameList(vec!["a".into(), "b".into()]));
        match &tokens[2] {
            Token::NumericList(ns) => assert_eq!(ns[1].as_f64(), 2.5),
            other => panic!("{:?}", other),
        }
        assert_eq!(tokens[3], Token::TextList(vec!["p".into(), "q".into()]));
        assert_eq!(tokens[4], Token::BoolList(vec![true, false]));
        match &tokens[5] {
            Token::Properties(map) => {
                assert_eq!(map.keys().collect::<Vec<_>>(), vec!["k", "f", "s"]);
                assert_eq!(map["f"], Token::Bool(true));
                assert_eq!(map["s"], Token::Text("v".into()));
                assert_eq!(map["k"].kind(), TokenKind::Numeric);
            }
            other => panic!("{:?}", other),
        }
        match &tokens[6] {
            Token::Ranges(rs) => {
                assert_eq!(rs.len(), 2);
                assert_eq!(rs[0].label, "lo");
                assert_eq!(rs[1].label, "5");
                assert_eq!(rs[1].high.as_i64(), Some(20));
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_compiler_expressions() {
        let table = compile("filter exp:{ a > 1 }\nfilter { b == 'x' }").unwrap();
        assert_eq!(
            table.token_groups()[0].tokens()[1],
            Token::Expression("a > 1".into())
        );
        assert_eq!(
            table.token_groups()[1].tokens()[1],
            Token::Expression("b == 'x'".into())
        );
    }

    #[test]
    fn test_compiler_pragmas() {
        let table = compile("#pragma load-directives a, b\n#pragma version 2.0\ndrop :x").unwrap();
        assert_eq!(table.loadable_directives().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(table.version(), Some("2.0"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_compiler_spans() {
        let table = compile("drop :a;  rename :b :c").unwrap();
        let span = table.token_groups()[1].span();
        assert_eq!(span.start_line, 1);
        assert_eq!(span.start_column, 10);
        assert_eq!(span.end_column, 22);
        assert_eq!(span.source, "rename :b :c");
    }

    #[test]
    fn test_compiler_empty_recipe() {
        assert!(compile("").unwrap().is_empty());
    }

    #[test]
    fn test_compiler_expression_helper() {
        assert_eq!(expression("exp : { x }"), "x");
        assert_eq!(expression("{}"), "");
        assert_eq!(unquote("'a'"), "a");
        assert_eq!(unquote("'a\""), "'a\"");
    }
}
