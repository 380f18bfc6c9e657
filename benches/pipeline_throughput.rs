//! Benchmark suite for dataset preparation and evaluation.
//!
//! Run with: `cargo bench`
//!
//! This benchmark measures:
//! - Paired batch generation per training step
//! - Composite normalization over two train partitions
//! - Weighted evaluation and optimally-normalized average precision
//! - Full config-driven preparation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use domain_adaptation_data::metrics::{avg_prc, evaluate};
use domain_adaptation_data::prelude::*;
use ndarray::{Array1, Array2, Array3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random bundle with `n` samples, a single timestep and `f` features.
fn create_bundle(n: usize, f: usize, seed: u64) -> DatasetBundle {
    let mut rng = StdRng::seed_from_u64(seed);
    let features = Array3::from_shape_fn((n, 1, f), |_| rng.gen_range(-5.0..5.0));
    let rates = Array1::from_shape_fn(n, |_| rng.gen_range(0.0..0.2));
    let names = (0..f).map(|j| format!("f{j}")).collect();
    DatasetBundle::new(features, to_multiclass(rates.view()), Array1::ones(n), names, "collision")
        .expect("valid bundle")
}

fn bench_paired_batches(c: &mut Criterion) {
    let mut group = c.benchmark_group("paired_batches");

    for batch_size in [64usize, 500] {
        group.throughput(Throughput::Elements(batch_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            &batch_size,
            |b, &batch_size| {
                let mut paired =
                    PairedDataset::new(create_bundle(20_000, 32, 1), create_bundle(3_000, 32, 2), batch_size)
                        .expect("valid pairing");
                let mut rng = StdRng::seed_from_u64(0);
                b.iter(|| black_box(paired.next_batch(&mut rng)));
            },
        );
    }

    group.finish();
}

fn bench_normalization(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalization");
    let src = create_bundle(20_000, 32, 3);
    let tgt = create_bundle(3_000, 32, 4);
    let (source, target) = align_and_split(&src, &tgt, 0.8, 0.5).expect("valid split");

    for mode in [NormalizeMode::Individual, NormalizeMode::Composite] {
        group.bench_function(mode.as_str(), |b| {
            b.iter_batched(
                || (source.clone(), target.clone()),
                |(mut s, mut t)| {
                    normalize(&mut s, &mut t, mode).expect("normalize");
                    black_box((s, t))
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("metrics");
    let mut rng = StdRng::seed_from_u64(5);

    for n in [1_000usize, 10_000] {
        let p = Array1::from_shape_fn(n, |_| rng.gen_range(0.0..1.0));
        let y = Array1::from_shape_fn(n, |_| rng.gen_range(0.0..0.3));
        let w = Array1::ones(n);
        let probs = to_multiclass(p.view());
        let truth: Array2<f64> = to_multiclass(y.view());

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("evaluate", n), &n, |b, _| {
            b.iter(|| black_box(evaluate(truth.view(), probs.view(), w.view())));
        });
        group.bench_with_input(BenchmarkId::new("avg_prc_n10", n), &n, |b, _| {
            b.iter(|| black_box(avg_prc(y.view(), p.view(), w.view(), 10)));
        });
    }

    group.finish();
}

fn bench_prepare(c: &mut Criterion) {
    let pipeline = Pipeline::from_config(PipelineConfig::default()).expect("default config");
    let src = create_bundle(10_000, 16, 6);
    let tgt = create_bundle(2_000, 16, 7);

    c.bench_function("prepare_10k_2k", |b| {
        b.iter(|| black_box(pipeline.prepare(&src, &tgt).expect("prepare")));
    });
}

criterion_group!(
    benches,
    bench_paired_batches,
    bench_normalization,
    bench_metrics,
    bench_prepare
);
criterion_main!(benches);
