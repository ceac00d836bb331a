//! Revision batch ordering benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use docsync_bench::utils::shuffled_fragments;
use docsync_core::{order, RevisionHistoryFragment};

/// Benchmark ordering batches of increasing size.
fn bench_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("order");

    for count in [8, 64, 512, 4096] {
        let fragments = shuffled_fragments(count, 4);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("fragments", count), &fragments, |b, f| {
            b.iter(|| {
                let ordered = order(black_box(f.clone())).unwrap();
                black_box(ordered);
            });
        });
    }

    group.finish();
}

/// Benchmark parsing wire-form fragments.
fn bench_parse(c: &mut Criterion) {
    let json = r#"{
        "_id": "doc",
        "_rev": "7-g",
        "_revisions": {"start": 7, "ids": ["g", "f", "e", "d", "c", "b", "a"]},
        "_attachments": {"a.txt": {"content_type": "text/plain", "length": 10}},
        "title": "hello"
    }"#;

    c.bench_function("parse_fragment", |b| {
        b.iter(|| {
            let fragment = RevisionHistoryFragment::from_json(black_box(json)).unwrap();
            black_box(fragment);
        });
    });
}

criterion_group!(benches, bench_order, bench_parse);
criterion_main!(benches);
