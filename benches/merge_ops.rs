//! Benchmarks for merging, deduplication and flag resolution.
//!
//! These benchmarks fold generated documents with the include merge rules
//! and with an inheritance rule set, and resolve flags over the result.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use machinecfg::config::{Document, Manager, PackageEntry};
use machinecfg::flags::resolve_all;
use machinecfg::merge::inherit::{compose, InheritanceRules, MergePattern};
use machinecfg::merge::{dedup_first_wins, merge_all};

/// A document with `count` apt packages starting at `offset`, and as many
/// dconf settings.
fn make_document(offset: usize, count: usize) -> Document {
    let mut document = Document::default();
    *document.packages.for_manager_mut(Manager::Apt) = (offset..offset + count)
        .map(|i| PackageEntry::new(format!("package{}", i)))
        .collect();
    for i in offset..offset + count {
        document
            .dconf
            .settings
            .insert(format!("/org/example/key{}", i), i.to_string());
    }
    document
}

/// `layers` documents, each overlapping half of the previous one.
fn make_layers(layers: usize, count: usize) -> Vec<Document> {
    (0..layers)
        .map(|layer| make_document(layer * count / 2, count))
        .collect()
}

fn bench_merge_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_all");

    for layers in [2, 8, 32] {
        let documents = make_layers(layers, 100);
        group.bench_with_input(
            BenchmarkId::new("layers", layers),
            &documents,
            |b, documents| b.iter(|| merge_all(black_box(documents.clone()))),
        );
    }

    group.finish();
}

fn bench_dedup(c: &mut Criterion) {
    let mut group = c.benchmark_group("dedup_first_wins");

    for size in [100, 1000, 10000] {
        let entries: Vec<PackageEntry> = (0..size)
            .map(|i| PackageEntry::new(format!("package{}", i % (size / 2))))
            .collect();
        group.bench_with_input(BenchmarkId::new("entries", size), &entries, |b, entries| {
            b.iter(|| dedup_first_wins(black_box(entries.clone())))
        });
    }

    group.finish();
}

fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");

    let rules = InheritanceRules::new(MergePattern::Override)
        .with_rule("packages", MergePattern::Append, 10)
        .with_rule("dconf", MergePattern::Merge, 10);

    for layers in [2, 8] {
        let documents = make_layers(layers, 100);
        group.bench_with_input(
            BenchmarkId::new("layers", layers),
            &documents,
            |b, documents| b.iter(|| compose(&rules, black_box(documents))),
        );
    }

    group.finish();
}

fn bench_resolve_flags(c: &mut Criterion) {
    let mut document = make_document(0, 1000);
    document
        .package_defaults
        .insert("apt".to_string(), vec!["-y".to_string()]);

    c.bench_function("resolve_all_1000", |b| {
        b.iter(|| resolve_all(black_box(&document)))
    });
}

criterion_group!(
    benches,
    bench_merge_all,
    bench_dedup,
    bench_compose,
    bench_resolve_flags
);
criterion_main!(benches);
