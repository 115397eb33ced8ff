//! Compiler output and diagnostics through the public API.

use serde_json::json;
use wrangle::compile;
use wrangle::core::token::{Token, TokenKind};
use wrangle::error::CompileError;

const RECIPE: &str = "\
#pragma version 2.0;
#pragma load-directives aggregate-stats, rename;
// totals per file
aggregate-stats :size :time :total_size :total_time 'KB' 'ms'
rename :total_size :kb;  !drop :junk
set-limit 1.5GB 250ms prop:{ retries=3, strict=true }
";

#[test]
fn test_diagnostics_group_order_and_kinds() {
    let table = compile(RECIPE).unwrap();
    assert_eq!(table.len(), 4);
    assert_eq!(table.version(), Some("2.0"));
    assert_eq!(
        table.loadable_directives().collect::<Vec<_>>(),
        vec!["aggregate-stats", "rename"]
    );

    let names: Vec<&str> = table
        .token_groups()
        .iter()
        .filter_map(|g| g.directive_name())
        .collect();
    assert_eq!(names, vec!["aggregate-stats", "rename", "drop", "set-limit"]);

    let kinds: Vec<TokenKind> = table.token_groups()[3]
        .tokens()
        .iter()
        .map(Token::kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::DirectiveName,
            TokenKind::ByteSize,
            TokenKind::TimeDuration,
            TokenKind::Properties,
        ]
    );
}

#[test]
fn test_diagnostics_spans() {
    let table = compile(RECIPE).unwrap();
    let groups = table.token_groups();

    let stats = groups[0].span();
    assert_eq!(stats.start_line, 4);
    assert_eq!(stats.start_column, 0);
    assert_eq!(stats.end_line, 4);
    assert_eq!(
        stats.source,
        "aggregate-stats :size :time :total_size :total_time 'KB' 'ms'"
    );

    let drop = groups[2].span();
    assert_eq!(drop.start_line, 5);
    assert_eq!(drop.start_column, 25);
    assert_eq!(drop.source, "!drop :junk");
    assert_eq!(drop.end_column, drop.start_column + drop.source.len());
}

#[test]
fn test_diagnostics_table_json() {
    let table = compile("#pragma version 2.0\nrename :a :b").unwrap();
    assert_eq!(
        table.to_json(),
        json!({
            "version": "2.0",
            "load_directives": [],
            "directives": [{
                "source": {
                    "line": 2,
                    "column": 0,
                    "endLine": 2,
                    "endColumn": 12,
                    "source": "rename :a :b",
                },
                "tokens": [
                    { "type": "DIRECTIVE_NAME", "value": "rename" },
                    { "type": "COLUMN_NAME", "value": "a" },
                    { "type": "COLUMN_NAME", "value": "b" },
                ],
            }],
        })
    );
}

#[test]
fn test_diagnostics_tokens_round_trip_through_json() {
    let table = compile(RECIPE).unwrap();
    for group in table.token_groups() {
        for token in group.tokens() {
            let back = Token::from_json(&token.to_json()).unwrap();
            assert_eq!(&back, token);
        }
    }
}

#[test]
fn test_diagnostics_unit_token_json() {
    let table = compile("set-limit 10KB 2s").unwrap();
    let tokens = table.token_groups()[0].tokens();
    assert_eq!(
        tokens[1].to_json(),
        json!({ "type": "BYTE_SIZE", "value": "10KB", "bytes": 10240, "unit": "KB" })
    );
    assert_eq!(
        tokens[2].to_json(),
        json!({ "type": "TIME_DURATION", "value": "2s", "nanos": 2_000_000_000u64, "unit": "s" })
    );
}

#[test]
fn test_diagnostics_unrecognized_unit() {
    let err = compile("rename :a :b\nset-limit 10XB").unwrap_err();
    let span = err.span().unwrap();
    assert_eq!(span.start_line, 2);
    assert_eq!(span.source, "set-limit 10XB");
    assert!(matches!(err, CompileError::UnrecognizedUnit { .. }));
    assert!(err.to_string().contains("XB"), "{}", err);
}

#[test]
fn test_diagnostics_syntax_error_position() {
    let err = compile("rename :a :b\nrename :c 'unterminated").unwrap_err();
    match err {
        CompileError::Syntax { line, column, .. } => {
            assert_eq!(line, 2);
            assert_eq!(column, 10);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(err.span().is_none());
}

#[test]
fn test_diagnostics_blank_recipe() {
    let table = compile("\n\n// nothing here\n;;\n").unwrap();
    assert!(table.is_empty());
    assert_eq!(table.version(), None);
}
