//! Benchmarks for wrangle core operations.
//!
//! Run with: cargo bench
//!
//! Results include 95% confidence intervals via Criterion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use wrangle::runtime::{execute_recipe, Row};
use wrangle::units::{ByteSize, ByteUnit, TimeDuration};

fn bench_unit_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("unit_parse");
    for text in ["10B", "1.5KB", "3.25GB", " 42 tb "] {
        group.bench_with_input(BenchmarkId::new("byte_size", text), &text, |b, text| {
            b.iter(|| black_box(ByteSize::parse(black_box(text)).unwrap()));
        });
    }
    for text in ["50ms", "1.5h", "2d"] {
        group.bench_with_input(BenchmarkId::new("time_duration", text), &text, |b, text| {
            b.iter(|| black_box(TimeDuration::parse(black_box(text)).unwrap()));
        });
    }
    group.finish();
}

fn bench_unit_convert(c: &mut Criterion) {
    let size = ByteSize::parse("3.25GB").unwrap();
    c.bench_function("byte_size_convert", |b| {
        b.iter(|| {
            for unit in ByteUnit::ALL {
                black_box(size.convert_to(black_box(unit)));
            }
        });
    });
}

fn recipe(directives: usize) -> String {
    let mut text = String::from("#pragma version 2.0;\n#pragma load-directives aggregate-stats;\n");
    for i in 0..directives {
        text.push_str(&format!(
            "aggregate-stats :size_{i} :time_{i} :bytes_{i} :secs_{i} 'KB' 'ms' // #{i}\n"
        ));
    }
    text
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    for count in [1, 10, 100] {
        let source = recipe(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &source, |b, source| {
            b.iter(|| black_box(wrangle::compile(black_box(source)).unwrap()));
        });
    }
    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_stats");
    for rows in [10, 1000, 10_000] {
        let input: Vec<Row> = (0..rows)
            .map(|i| {
                Row::new()
                    .with("size", format!("{}KB", i % 512))
                    .with("time", format!("{}ms", i % 250))
            })
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(rows), &input, |b, input| {
            b.iter(|| {
                let out = execute_recipe(
                    "aggregate-stats :size :time :total_size :total_time",
                    black_box(input.clone()),
                )
                .unwrap();
                black_box(out);
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_unit_parse,
    bench_unit_convert,
    bench_compile,
    bench_aggregate
);
criterion_main!(benches);
