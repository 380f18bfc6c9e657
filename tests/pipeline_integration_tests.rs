//! End-to-end tests for paired-domain preparation.
//!
//! Exercises the public API only: bundles built the way a reader would,
//! then aligned, split, label-sampled, normalized and batched.
//!
//! # Test Categories
//!
//! 1. **Alignment + Split**: feature reordering and partition sizes
//! 2. **Composite Normalization**: pooled statistics across both domains
//! 3. **Individual Normalization**: per-domain statistics
//! 4. **Full Pipeline**: config-driven preparation into paired batches
//! 5. **Raw Reader Output**: target windowing before the pipeline

use domain_adaptation_data::prelude::*;
use domain_adaptation_data::alignment::select_nonconstant_features;
use domain_adaptation_data::preprocessing::normalization::{feature_mean, feature_std};
use ndarray::{concatenate, Array, Array1, Array2, Array3, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// =============================================================================
// Helper Functions
// =============================================================================

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Bundle with per-feature offsets and scales so domains differ in distribution.
fn random_bundle(n: usize, t: usize, features: &[&str], offset: f64, scale: f64, seed: u64) -> DatasetBundle {
    let mut rng = StdRng::seed_from_u64(seed);
    let f = features.len();
    let x = Array3::from_shape_fn((n, t, f), |(_, _, j)| {
        offset * (j + 1) as f64 + scale * rng.gen_range(-1.0..1.0)
    });
    let rates = Array1::from_shape_fn(n, |_| rng.gen_range(0.0..0.3));
    DatasetBundle::new(x, to_multiclass(rates.view()), Array1::ones(n), names(features), "collision")
        .unwrap()
}

// =============================================================================
// Alignment + Split
// =============================================================================

#[test]
fn test_end_to_end_alignment_split_and_composite_normalization() {
    let src = random_bundle(100, 1, &["a", "b", "c"], 5.0, 2.0, 1);
    let tgt = random_bundle(20, 1, &["b", "a"], -3.0, 0.5, 2);

    let (mut source, mut target) = align_and_split(&src, &tgt, 0.8, 0.8).unwrap();

    assert_eq!(source.feature_names(), &names(&["b", "a"])[..]);
    assert_eq!(source.train.len(), 80);
    assert_eq!(target.train.len(), 16);
    // Source column 0 is the original "b" column.
    assert_eq!(source.train.features()[[0, 0, 0]], src.features()[[0, 0, 1]]);

    normalize(&mut source, &mut target, NormalizeMode::Composite).unwrap();

    let pooled = concatenate(
        Axis(0),
        &[source.train.features(), target.train.features()],
    )
    .unwrap();
    let mean = feature_mean(pooled.view());
    for &m in mean.iter() {
        assert!(m.abs() < 1e-9, "pooled mean {m} should be ~0");
    }

    let stats = source.stats.as_ref().unwrap();
    assert_eq!(Some(stats), target.stats.as_ref());
    assert_eq!(stats.mode, NormalizeMode::Composite);
}

#[test]
fn test_alignment_missing_feature_is_configuration_error() {
    let src = random_bundle(10, 1, &["a", "b"], 1.0, 1.0, 3);
    let tgt = random_bundle(10, 1, &["a", "z"], 1.0, 1.0, 4);
    let err = align_and_split(&src, &tgt, 0.8, 0.5).unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("'z'"));
}

// =============================================================================
// Normalization
// =============================================================================

#[test]
fn test_individual_normalization_standardizes_each_train() {
    let src = random_bundle(200, 3, &["a", "b"], 10.0, 4.0, 5);
    let tgt = random_bundle(60, 3, &["a", "b"], -2.0, 0.1, 6);
    let (mut source, mut target) = align_and_split(&src, &tgt, 0.8, 0.5).unwrap();

    normalize(&mut source, &mut target, NormalizeMode::Individual).unwrap();

    for split in [&source, &target] {
        let mean = feature_mean(split.train.features());
        let std = feature_std(split.train.features());
        for j in 0..2 {
            assert!(mean[j].abs() < 1e-9);
            assert!((std[j] - 1.0).abs() < 1e-4, "std {}", std[j]);
        }
    }
    assert_ne!(source.stats, target.stats);
}

#[test]
fn test_held_out_partitions_use_train_statistics() {
    let src = random_bundle(50, 1, &["a"], 4.0, 1.0, 7);
    let tgt = random_bundle(50, 1, &["a"], 4.0, 1.0, 8);
    let (mut source, mut target) = align_and_split(&src, &tgt, 0.6, 0.6).unwrap();
    let raw_val = source.val.features().to_owned();

    normalize(&mut source, &mut target, NormalizeMode::Composite).unwrap();

    let stats = source.stats.clone().unwrap();
    let mut restored = source.val.features().to_owned();
    stats.invert(&mut restored);
    for (a, b) in restored.iter().zip(raw_val.iter()) {
        assert!((a - b).abs() < 1e-9);
    }
}

// =============================================================================
// Full Pipeline
// =============================================================================

#[test]
fn test_pipeline_prepare_into_paired_batches() {
    let _ = env_logger::builder().is_test(true).try_init();

    let config = PipelineConfig::default()
        .with_seed(42)
        .with_batch(BatchConfig {
            batch_size: 16,
            fill: FillPolicy::Random,
        });
    let pipeline = Pipeline::from_config(config).unwrap();

    let src = random_bundle(100, 2, &["a", "b", "c"], 5.0, 2.0, 9);
    let tgt = random_bundle(40, 2, &["c", "a"], 1.0, 1.0, 10);
    let mut prepared = pipeline.prepare(&src, &tgt).unwrap();

    assert_eq!(prepared.feature_names(), &names(&["c", "a"])[..]);
    assert!(prepared
        .target
        .train
        .target()
        .iter()
        .all(|&v| v == 0.0 || v == 1.0));

    let mut train = prepared.paired(Partition::Train).unwrap();
    assert_eq!(train.n_batches(), 5);

    let batches: Vec<PairedBatch> = train.epoch(&mut prepared.rng).collect();
    assert_eq!(batches.len(), 5);
    for batch in &batches {
        assert_eq!(batch.source.len(), 16);
        assert_eq!(batch.target.len(), 16);
        assert_eq!(batch.source.features.shape(), &[16, 2, 2]);
        assert_eq!(batch.target.target.shape(), &[16, 2]);
    }

    let val = prepared.paired(Partition::Val).unwrap();
    assert_eq!(val.source().len(), 9);
    assert_eq!(val.target().len(), 10);
}

#[test]
fn test_pipeline_same_seed_same_batches() {
    let config = PipelineConfig::default().with_seed(5).with_batch(BatchConfig {
        batch_size: 7,
        fill: FillPolicy::Random,
    });
    let pipeline = Pipeline::from_config(config).unwrap();
    let src = random_bundle(30, 1, &["a", "b"], 1.0, 1.0, 11);
    let tgt = random_bundle(12, 1, &["a", "b"], 2.0, 1.0, 12);

    let run = || {
        let mut prepared = pipeline.prepare(&src, &tgt).unwrap();
        let mut paired = prepared.paired(Partition::Train).unwrap();
        paired
            .epoch(&mut prepared.rng)
            .map(|b| (b.source.indices, b.target.indices))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_pipeline_positive_cap_bounds_target_positives() {
    let config = PipelineConfig::default().with_positive_cap(3);
    let pipeline = Pipeline::from_config(config).unwrap();

    let n = 80;
    let src = random_bundle(n, 1, &["a"], 1.0, 1.0, 13);
    let mut tgt = random_bundle(n, 1, &["a"], 1.0, 1.0, 14);
    let alternating = Array1::from_shape_fn(n, |i| if i % 2 == 0 { 0.0 } else { 1.0 });
    *tgt.target_mut() = to_multiclass(alternating.view());

    let prepared = pipeline.prepare(&src, &tgt).unwrap();
    let positives = prepared
        .target
        .train
        .positive_rates()
        .iter()
        .filter(|&&p| p > 0.0)
        .count();
    // Fourth positive sits at index 7, so the prefix [0, 7) is kept.
    assert_eq!(positives, 3);
    assert_eq!(prepared.target.train.len(), 7);
}

#[test]
fn test_pipeline_rejects_corrupt_weights() {
    let pipeline = Pipeline::from_config(PipelineConfig::default()).unwrap();
    let src = random_bundle(20, 1, &["a"], 1.0, 1.0, 15);
    let tgt_base = random_bundle(20, 1, &["a"], 1.0, 1.0, 16);
    let (x, y, _) = tgt_base.into_arrays();
    let mut w = Array1::ones(20);
    w[4] = f64::NAN;
    let tgt = DatasetBundle::new(x, y, w, names(&["a"]), "collision").unwrap();

    let err = pipeline.prepare(&src, &tgt).unwrap_err();
    assert!(err.is_data_shape());
}

#[test]
fn test_pipeline_accepts_corrupt_column_absent_from_target() {
    let src_base = random_bundle(40, 1, &["a", "c"], 1.0, 1.0, 17);
    let (mut x, y, w) = src_base.into_arrays();
    x.index_axis_mut(Axis(2), 1).fill(f64::NAN);
    let src = DatasetBundle::new(x, y, w, names(&["a", "c"]), "collision").unwrap();
    let tgt = random_bundle(20, 1, &["a"], 2.0, 1.0, 18);

    let prepared = Pipeline::from_config(PipelineConfig::default())
        .unwrap()
        .prepare(&src, &tgt)
        .unwrap();

    assert_eq!(prepared.feature_names(), &names(&["a"])[..]);
    for part in [&prepared.source.train, &prepared.source.val, &prepared.source.test] {
        assert!(part.features().iter().all(|v| v.is_finite()));
    }
}

#[test]
fn test_pipeline_rejects_corrupt_column_shared_with_target() {
    let src_base = random_bundle(40, 1, &["a", "c"], 1.0, 1.0, 19);
    let (mut x, y, w) = src_base.into_arrays();
    x[[5, 0, 0]] = f64::INFINITY;
    let src = DatasetBundle::new(x, y, w, names(&["a", "c"]), "collision").unwrap();
    let tgt = random_bundle(20, 1, &["a"], 2.0, 1.0, 20);

    let err = Pipeline::from_config(PipelineConfig::default())
        .unwrap()
        .prepare(&src, &tgt)
        .unwrap_err();
    assert!(err.is_data_shape());
}

// =============================================================================
// Raw Reader Output
// =============================================================================

#[test]
fn test_raw_dataset_into_pipeline() {
    let n = 30;
    let horizon = 6;
    let targets = Array2::from_shape_fn((n, horizon), |(i, t)| {
        if t == 4 && i % 3 == 0 {
            0.6
        } else {
            0.0
        }
    });
    let raw = RawDataset {
        features: Array::from_shape_fn((n, 4, 2), |(i, t, j)| (i + t * 10 + j) as f64),
        targets,
        weights: None,
        feature_names: names(&["speed", "gap"]),
        target_name: "collision".to_string(),
    };
    let target_config = TargetConfig {
        start_timestep: 2,
        ..TargetConfig::default()
    };
    let bundle = raw.into_bundle(&target_config).unwrap();

    assert_eq!(bundle.n_timesteps(), 1);
    assert_eq!(bundle.features()[[0, 0, 1]], 31.0);
    assert!((bundle.positive_rates()[3] - 0.6).abs() < 1e-12);
    assert_eq!(bundle.positive_rates()[4], 0.0);

    let prepared = Pipeline::from_config(PipelineConfig::default())
        .unwrap()
        .prepare(&bundle, &bundle)
        .unwrap();
    assert_eq!(prepared.source.train.len(), 24);
}

#[test]
fn test_nonconstant_feature_selection_before_alignment() {
    let n = 12;
    let x = Array3::from_shape_fn((n, 1, 3), |(i, _, j)| match j {
        1 => 7.0,
        _ => i as f64,
    });
    let bundle = DatasetBundle::new(
        x,
        to_multiclass(Array1::zeros(n).view()),
        Array1::ones(n),
        names(&["a", "flat", "c"]),
        "collision",
    )
    .unwrap();

    let (kept, idx) = select_nonconstant_features(&bundle, 10, 1e-8);
    assert_eq!(idx, vec![0, 2]);
    assert_eq!(kept.feature_names(), &names(&["a", "c"])[..]);
}
