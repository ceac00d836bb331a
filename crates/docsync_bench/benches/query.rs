//! Query compilation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use docsync_bench::utils::text_values;
use docsync_query::{
    Criterion as IndexCriterion, IndexCatalog, IndexQueryPlan, IntegerIndexType, StringIndexType,
};

/// Benchmark plans with a growing number of joined tables.
fn bench_joins(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_joins");

    for tables in [1, 4, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(tables), &tables, |b, &tables| {
            b.iter(|| {
                let mut plan = IndexQueryPlan::new();
                for i in 0..tables {
                    let table = format!("index_{i}");
                    if i % 2 == 0 {
                        plan.add_criterion(&table, &IndexCriterion::eq("needle"), &StringIndexType)
                            .unwrap();
                    } else {
                        plan.add_criterion(&table, &IndexCriterion::between(1, 100), &IntegerIndexType)
                            .unwrap();
                    }
                }
                black_box(plan.compile().unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark membership criteria with many values to escape.
fn bench_membership(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_membership");

    for count in [10, 100, 1000] {
        let criterion = IndexCriterion::one_of(text_values(count));
        group.bench_with_input(BenchmarkId::from_parameter(count), &criterion, |b, criterion| {
            b.iter(|| {
                let mut plan = IndexQueryPlan::new();
                plan.add_criterion("tags", black_box(criterion), &StringIndexType)
                    .unwrap();
                black_box(plan.compile().unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark compiling through a catalog.
fn bench_catalog(c: &mut Criterion) {
    let mut catalog = IndexCatalog::new();
    catalog.register_index("color", "string").unwrap();
    catalog.register_index("size", "integer").unwrap();
    let criteria = [
        ("color", IndexCriterion::one_of(["red", "green", "blue"])),
        ("size", IndexCriterion::greater_than(10)),
    ];

    c.bench_function("catalog_compile", |b| {
        b.iter(|| black_box(catalog.compile(black_box(&criteria)).unwrap()));
    });
}

criterion_group!(benches, bench_joins, bench_membership, bench_catalog);
criterion_main!(benches);
