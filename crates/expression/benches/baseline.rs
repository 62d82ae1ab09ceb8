// Baseline benchmarks for adaptive-expression
// Run with: cargo bench --bench baseline

use std::hint::black_box;
use std::thread;

use adaptive_expression::{Expression, ExpressionEngine, SimpleObjectMemory};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::json;

fn scope() -> SimpleObjectMemory {
    SimpleObjectMemory::new(json!({
        "one": 1.0,
        "two": 2.0,
        "hello": "hello",
        "bag": {"three": 3.0, "list": ["red", "blue"], "index": 3},
        "items": ["zero", "one", "two"],
        "nestedItems": [{"x": 1}, {"x": 2}, {"x": 3}],
        "timestamp": "2018-03-15T13:00:00.000Z"
    }))
}

// ================================
// Parse Benchmarks
// ================================

fn benchmark_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    let test_cases = vec![
        ("literal", "42"),
        ("arithmetic", "(one + two) * bag.three"),
        ("accessors", "bag.list[bag.index - 2]"),
        ("nested_calls", "join(foreach(nestedItems, i, i.x + first(nestedItems).x), ',')"),
    ];

    for (name, source) in test_cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, source| {
            b.iter(|| Expression::parse(black_box(source)))
        });
    }

    group.finish();
}

fn benchmark_references(c: &mut Criterion) {
    let source = "if(bag.index > 2, concat(hello, items[nestedItems[1].x]), user.name)";
    c.bench_function("references/fresh", |b| {
        b.iter(|| {
            let expression = Expression::parse(black_box(source)).unwrap();
            expression.references().len()
        })
    });
}

// ================================
// Evaluation Benchmarks
// ================================

fn benchmark_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    let test_cases = vec![
        ("literal", "42"),
        ("arithmetic", "(one + two) * bag.three"),
        ("comparison", "one > 0.5 && two < 2.5"),
        ("memory_path", "bag.list[bag.index - 2]"),
        ("string", "toUpper(concat(hello, ' ', items[2]))"),
        ("foreach", "join(foreach(items, item, concat(item, '!')), ',')"),
        ("datetime", "addDays(timestamp, 1, 'MM-dd-yy')"),
        ("regex", "isMatch(hello, '^h[a-z]+o$')"),
    ];

    for (name, source) in test_cases {
        let expression = Expression::parse(source).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(name), &expression, |b, expression| {
            let mut memory = scope();
            b.iter(|| expression.try_evaluate(black_box(&mut memory)))
        });
    }

    group.finish();
}

fn benchmark_engine_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/cache");

    let cached = ExpressionEngine::with_cache_size(1000);
    let uncached = ExpressionEngine::from_config(&adaptive_expression::EngineConfig {
        cache_size: None,
        ..Default::default()
    });
    let source = "(one + two) * bag.three";

    group.bench_function("hit", |b| {
        let mut memory = scope();
        let _ = cached.evaluate(source, &mut memory);
        b.iter(|| cached.evaluate(black_box(source), &mut memory))
    });

    group.bench_function("disabled", |b| {
        let mut memory = scope();
        b.iter(|| uncached.evaluate(black_box(source), &mut memory))
    });

    group.bench_function("miss", |b| {
        let mut memory = scope();
        let mut counter = 0;
        b.iter(|| {
            counter += 1;
            let source = format!("{} + {}", counter, counter + 1);
            cached.evaluate(black_box(&source), &mut memory)
        })
    });

    group.finish();
}

// ================================
// Concurrent Benchmarks
// ================================

fn benchmark_concurrent(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent/shared_expression");
    group.throughput(Throughput::Elements(1));

    let expression = Expression::parse("rand(1, 100) + bag.three").unwrap();

    for num_threads in [1, 2, 4, 8] {
        group.bench_function(format!("{}_threads", num_threads), |b| {
            b.iter(|| {
                let handles: Vec<_> = (0..num_threads)
                    .map(|_| {
                        let expression = expression.clone();
                        thread::spawn(move || {
                            let mut memory = scope();
                            for _ in 0..10 {
                                let _ = expression.try_evaluate(&mut memory);
                            }
                        })
                    })
                    .collect();

                for handle in handles {
                    handle.join().unwrap();
                }
            })
        });
    }

    group.finish();
}

fn benchmark_engine_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent/engine_throughput");
    group.throughput(Throughput::Elements(1));

    let engine = ExpressionEngine::with_cache_size(1000);

    group.bench_function("ops_per_sec", |b| {
        let mut memory = scope();
        b.iter(|| engine.evaluate(black_box("one + two"), &mut memory))
    });

    group.finish();
}

// ================================
// Criterion Groups
// ================================

criterion_group!(parse_benches, benchmark_parse, benchmark_references);

criterion_group!(evaluate_benches, benchmark_evaluate, benchmark_engine_cache);

criterion_group!(
    concurrent_benches,
    benchmark_concurrent,
    benchmark_engine_throughput
);

criterion_main!(parse_benches, evaluate_benches, concurrent_benches);
