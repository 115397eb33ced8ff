//! End-to-end aggregation through the public pipeline API.

use serde_json::json;
use wrangle::core::config::{Environment, RunConfig};
use wrangle::runtime::{execute_recipe, DirectiveRegistry, RecipePipeline, Row, Value};
use wrangle::RecipeError;

const RECIPE: &str = "aggregate-stats :size :time :total_size :total_time";

fn json_row(size: &str, time: &str) -> Row {
    Row::from_json(&json!({ "id": 1, "size": size, "time": time })).unwrap()
}

fn pipeline(recipe: &str) -> RecipePipeline {
    RecipePipeline::compile(recipe, &DirectiveRegistry::with_builtins(), &RunConfig::default())
        .unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-12
}

#[test]
fn test_e2e_single_batch_summary() {
    let out = execute_recipe(
        RECIPE,
        vec![
            json_row("100KB", "50ms"),
            json_row("200KB", "75ms"),
            json_row("300KB", "100ms"),
        ],
    )
    .unwrap();
    assert_eq!(out.len(), 1);
    let summary = &out[0];
    assert_eq!(summary.len(), 2);
    assert!(close(summary.value("total_size").as_f64().unwrap(), 600.0 / 1024.0));
    assert!(close(summary.value("total_time").as_f64().unwrap(), 0.225));
}

#[test]
fn test_e2e_run_over_many_batches() {
    let mut p = pipeline("aggregate-stats :size :time :bytes :secs 'B' 'ns'");
    let batches: Vec<Vec<Row>> = (0..4)
        .map(|_| vec![json_row("1KB", "1ms"), json_row("1KB", "1ms")])
        .collect();
    let out = p.run(batches).unwrap();

    // three pass-through batches of two rows, then the summary
    assert_eq!(out.len(), 7);
    for row in &out[..6] {
        assert_eq!(row.value("bytes"), &Value::Float(0.0));
        assert_eq!(row.value("secs"), &Value::Float(0.0));
        assert_eq!(row.value("id"), &Value::Int(1));
    }
    assert_eq!(out[6].value("bytes"), &Value::Float(8.0 * 1024.0));
    assert_eq!(out[6].value("secs"), &Value::Float(8_000_000.0));
    assert!(p.context().store().is_empty());
}

#[test]
fn test_e2e_empty_input_still_summarizes() {
    let mut p = pipeline(RECIPE);
    let out = p.run(Vec::<Vec<Row>>::new()).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].value("total_size"), &Value::Float(0.0));
    assert_eq!(out[0].value("total_time"), &Value::Float(0.0));
}

#[test]
fn test_e2e_directives_accumulate_independently() {
    let mut p = pipeline(
        "aggregate-stats :size :time :a :b\naggregate-stats :size :time :c :d 'KB'",
    );
    let out = p
        .run(vec![vec![json_row("1MB", "1s")], vec![json_row("1MB", "1s")]])
        .unwrap();
    // The second directive only ever saw the first batch's input row; its
    // final batch holds the first directive's summary, which has no inputs.
    let last = out.last().unwrap();
    assert_eq!(last.value("c"), &Value::Float(1024.0));
    assert_eq!(last.value("d"), &Value::Float(1.0));
}

#[test]
fn test_e2e_environment_does_not_change_totals() {
    let rows = || vec![json_row("1MB", "1s"), json_row("500KB", "500ms"), json_row("2MB", "2s")];
    let registry = DirectiveRegistry::with_builtins();
    let mut results = Vec::new();
    for environment in [Environment::Production, Environment::Testing] {
        let config = RunConfig {
            environment,
            ..RunConfig::default()
        };
        let mut p = RecipePipeline::compile(RECIPE, &registry, &config).unwrap();
        let out = p.execute_batch(rows(), true).unwrap();
        results.push(out[0].value("total_size").as_f64().unwrap());
    }
    assert_eq!(results[0], results[1]);
    assert!(close(results[0], 3.48828125));
}

#[test]
fn test_e2e_summary_serializes() {
    let out = execute_recipe(
        "aggregate-stats :size :time :total_size :total_time 'GB' 'h'",
        vec![json_row("1GB", "30m"), json_row("1GB", "30m")],
    )
    .unwrap();
    assert_eq!(
        out[0].to_json(),
        json!({ "total_size": 2.0, "total_time": 1.0 })
    );
}

#[test]
fn test_e2e_numeric_cell_is_rejected() {
    let row = Row::from_json(&json!({ "size": 1024, "time": "1s" })).unwrap();
    let err = execute_recipe(RECIPE, vec![row]).unwrap_err();
    assert!(matches!(err, RecipeError::Directive(_)));
    assert!(err.to_string().contains("'1024'"), "{}", err);
}

#[test]
fn test_e2e_too_many_arguments() {
    let err = execute_recipe(
        "aggregate-stats :size :time :total_size :total_time 'MB' 's' 'extra'",
        vec![],
    )
    .unwrap_err();
    assert!(err.to_string().contains("aggregate-stats"), "{}", err);
}

#[test]
fn test_e2e_rerun_on_same_pipeline() {
    let mut p = pipeline(RECIPE);
    let batches = || vec![vec![json_row("1MB", "1s")], vec![json_row("1MB", "1s")]];
    let first = p.run(batches()).unwrap();
    let second = p.run(batches()).unwrap();
    assert_eq!(first, second);
    assert_eq!(second.len(), 2);
    assert_eq!(second[0].value("total_size"), &Value::Float(0.0));
    assert_eq!(second[1].value("total_size"), &Value::Float(2.0));
}

#[test]
fn test_e2e_failed_run_does_not_leak_totals() {
    let mut p = pipeline(RECIPE);
    let bad = Row::from_json(&json!({ "size": "lots", "time": "1s" })).unwrap();
    assert!(p
        .run(vec![vec![json_row("1MB", "1s")], vec![bad]])
        .is_err());
    let out = p.run(vec![vec![json_row("1MB", "1s")]]).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].value("total_size"), &Value::Float(1.0));
    assert_eq!(out[0].value("total_time"), &Value::Float(1.0));
}
