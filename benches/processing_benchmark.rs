use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use onetrc::generators::Sampler;
use onetrc::models::{AggregateTable, MeasurementRecord, StationCatalog};
use onetrc::processors::{aggregate, merge_all, tree_merge};
use onetrc::writers::{render, OutputFormat};
use rand::rngs::StdRng;
use rand::SeedableRng;

// Deterministic rows drawn from the built-in catalog
fn create_rows(catalog: &StationCatalog, rows: u64, seed: u64) -> Vec<MeasurementRecord> {
    Sampler::new(catalog, rows, 10.0, StdRng::seed_from_u64(seed))
        .unwrap()
        .collect()
}

fn create_partials(catalog: &StationCatalog, partitions: u64, rows: u64) -> Vec<AggregateTable> {
    (0..partitions)
        .map(|i| aggregate(create_rows(catalog, rows, i)).unwrap())
        .collect()
}

fn benchmark_sampler(c: &mut Criterion) {
    let catalog = StationCatalog::builtin();

    c.bench_function("sampler_100k", |b| {
        b.iter(|| {
            let mut sampler =
                Sampler::new(&catalog, 100_000, 10.0, StdRng::seed_from_u64(42)).unwrap();
            let mut total = 0.0;
            while let Some((_, value)) = sampler.next_sample() {
                total += value;
            }
            black_box(total)
        })
    });
}

fn benchmark_aggregate(c: &mut Criterion) {
    let catalog = StationCatalog::builtin();
    let rows = create_rows(&catalog, 100_000, 7);

    c.bench_function("aggregate_100k", |b| {
        b.iter(|| {
            let table = aggregate(rows.iter().cloned()).unwrap();
            black_box(table.len())
        })
    });
}

fn benchmark_merge_by_partitions(c: &mut Criterion) {
    let catalog = StationCatalog::builtin();
    let mut group = c.benchmark_group("merge_by_partitions");

    for &partitions in &[4u64, 16, 64] {
        let partials = create_partials(&catalog, partitions, 5_000);

        group.bench_with_input(
            BenchmarkId::new("fold", partitions),
            &partials,
            |b, partials| b.iter(|| black_box(merge_all(partials.iter().cloned()).len())),
        );
        group.bench_with_input(
            BenchmarkId::new("tree", partitions),
            &partials,
            |b, partials| b.iter(|| black_box(tree_merge(partials.clone()).len())),
        );
    }

    group.finish();
}

fn benchmark_render(c: &mut Criterion) {
    let catalog = StationCatalog::builtin();
    let table = aggregate(create_rows(&catalog, 50_000, 3)).unwrap();

    c.bench_function("render_normal", |b| {
        b.iter(|| {
            let mut buffer = Vec::new();
            render(&table, OutputFormat::Normal, &mut buffer).unwrap();
            black_box(buffer.len())
        })
    });
}

criterion_group!(
    benches,
    benchmark_sampler,
    benchmark_aggregate,
    benchmark_merge_by_partitions,
    benchmark_render
);
criterion_main!(benches);
