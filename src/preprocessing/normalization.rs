//! Per-feature z-score normalization for single or paired domains.
//!
//! Statistics are always computed from train partitions only and then
//! applied unchanged to validation and test, so no information leaks from
//! held-out data into the scale of the inputs.
//!
//! # Modes
//!
//! ## Individual
//!
//! Each domain is scaled by its own train statistics:
//! ```text
//! normalized = (x - mean_train) / (std_train + eps)
//! ```
//!
//! ## Composite
//!
//! Both domains share one set of statistics, pooled by train sample count:
//! ```text
//! r_a  = n_a / (n_a + n_b)          r_b = n_b / (n_a + n_b)
//! mean = r_a * mean_a + r_b * mean_b
//! std  = r_a * std_a  + r_b * std_b + eps      (on centered values)
//! ```
//!
//! A model trained jointly on both domains then sees one common feature
//! scale, and the statistics attached to either [`SplitBundle`] stay valid
//! when scoring the other domain.
//!
//! Means and standard deviations are taken over every `[sample, timestep]`
//! position of the feature tensor (population std).

use crate::dataset::{DatasetBundle, Partition, SplitBundle};
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array3, ArrayView3, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Added to every standard deviation before division.
pub const STD_EPSILON: f64 = 1e-8;

/// How statistics are shared between the two domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeMode {
    /// Each domain uses statistics from its own train partition.
    Individual,
    /// Both domains use count-weighted pooled statistics.
    #[default]
    Composite,
}

impl NormalizeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NormalizeMode::Individual => "individual",
            NormalizeMode::Composite => "composite",
        }
    }
}

impl fmt::Display for NormalizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NormalizeMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "individual" => Ok(NormalizeMode::Individual),
            "composite" => Ok(NormalizeMode::Composite),
            other => Err(PipelineError::configuration(format!(
                "unknown normalize mode '{other}', expected 'individual' or 'composite'"
            ))),
        }
    }
}

/// Per-feature statistics used to scale a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationStats {
    /// Per-feature mean.
    pub mean: Array1<f64>,
    /// Per-feature standard deviation, epsilon already added.
    pub std: Array1<f64>,
    /// Mode that produced these statistics.
    pub mode: NormalizeMode,
}

impl NormalizationStats {
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Apply `(x - mean) / std` to a bundle in place.
    ///
    /// # Errors
    ///
    /// [`PipelineError::DataShape`] if the bundle has a different number of
    /// features than these statistics.
    pub fn apply(&self, bundle: &mut DatasetBundle) -> Result<()> {
        if bundle.n_features() != self.n_features() {
            return Err(PipelineError::data_shape(format!(
                "statistics cover {} features, bundle has {}",
                self.n_features(),
                bundle.n_features()
            )));
        }
        scale_in_place(bundle.features_mut(), &self.mean, &self.std);
        Ok(())
    }

    /// Map normalized features back to the original scale.
    pub fn invert(&self, features: &mut Array3<f64>) {
        *features *= &self.std;
        *features += &self.mean;
    }
}

/// Per-feature mean over all sample and timestep positions.
///
/// Returns zeros for an empty tensor.
pub fn feature_mean(x: ArrayView3<'_, f64>) -> Array1<f64> {
    let rows = x.len_of(Axis(0)) * x.len_of(Axis(1));
    let mut sum = Array1::zeros(x.len_of(Axis(2)));
    for lane in x.lanes(Axis(2)) {
        sum += &lane;
    }
    if rows > 0 {
        sum /= rows as f64;
    }
    sum
}

/// Per-feature population standard deviation about the tensor's own mean.
///
/// Returns zeros for an empty tensor.
pub fn feature_std(x: ArrayView3<'_, f64>) -> Array1<f64> {
    let rows = x.len_of(Axis(0)) * x.len_of(Axis(1));
    let mean = feature_mean(x);
    let mut sum_sq = Array1::<f64>::zeros(x.len_of(Axis(2)));
    for lane in x.lanes(Axis(2)) {
        let diff = &lane - &mean;
        sum_sq += &(&diff * &diff);
    }
    if rows > 0 {
        sum_sq /= rows as f64;
    }
    sum_sq.mapv_into(f64::sqrt)
}

fn scale_in_place(features: &mut Array3<f64>, mean: &Array1<f64>, std: &Array1<f64>) {
    *features -= mean;
    *features /= std;
}

fn apply_to_held_out(split: &mut SplitBundle, stats: &NormalizationStats) -> Result<()> {
    for partition in [Partition::Val, Partition::Test] {
        stats.apply(split.get_mut(partition))?;
    }
    Ok(())
}

/// Normalize one domain with statistics from its own train partition.
///
/// # Errors
///
/// [`PipelineError::DataShape`] if the train partition is empty.
pub fn normalize_individual(split: &mut SplitBundle) -> Result<NormalizationStats> {
    if split.train.is_empty() {
        return Err(PipelineError::data_shape(
            "cannot compute normalization statistics from an empty train partition",
        ));
    }

    let mean = feature_mean(split.train.features());
    *split.train.features_mut() -= &mean;
    let std = feature_std(split.train.features()) + STD_EPSILON;
    *split.train.features_mut() /= &std;

    let stats = NormalizationStats {
        mean,
        std,
        mode: NormalizeMode::Individual,
    };
    apply_to_held_out(split, &stats)?;
    split.stats = Some(stats.clone());

    log::info!(
        "Individual normalization: {} features from {} train samples",
        stats.n_features(),
        split.train.len()
    );
    Ok(stats)
}

/// Normalize both domains with count-weighted pooled statistics.
///
/// The same statistics are attached to both splits.
///
/// # Errors
///
/// [`PipelineError::DataShape`] if the domains have different feature
/// counts or both train partitions are empty.
pub fn normalize_composite(
    src: &mut SplitBundle,
    tgt: &mut SplitBundle,
) -> Result<NormalizationStats> {
    if src.train.n_features() != tgt.train.n_features() {
        return Err(PipelineError::data_shape(format!(
            "source has {} features, target has {}; align before normalizing",
            src.train.n_features(),
            tgt.train.n_features()
        )));
    }

    let n_src = src.train.len();
    let n_tgt = tgt.train.len();
    let n = n_src + n_tgt;
    if n == 0 {
        return Err(PipelineError::data_shape(
            "cannot compute normalization statistics: both train partitions are empty",
        ));
    }
    let src_ratio = n_src as f64 / n as f64;
    let tgt_ratio = n_tgt as f64 / n as f64;

    let mean = feature_mean(src.train.features()) * src_ratio
        + feature_mean(tgt.train.features()) * tgt_ratio;

    *src.train.features_mut() -= &mean;
    *tgt.train.features_mut() -= &mean;
    let std = feature_std(src.train.features()) * src_ratio
        + feature_std(tgt.train.features()) * tgt_ratio
        + STD_EPSILON;
    *src.train.features_mut() /= &std;
    *tgt.train.features_mut() /= &std;

    let stats = NormalizationStats {
        mean,
        std,
        mode: NormalizeMode::Composite,
    };
    apply_to_held_out(src, &stats)?;
    apply_to_held_out(tgt, &stats)?;
    src.stats = Some(stats.clone());
    tgt.stats = Some(stats.clone());

    log::info!(
        "Composite normalization: {} features, source train={} ({:.3}), target train={} ({:.3})",
        stats.n_features(),
        n_src,
        src_ratio,
        n_tgt,
        tgt_ratio
    );
    Ok(stats)
}

/// Normalize a source/target pair according to `mode`.
///
/// Statistics are attached to the splits' `stats` fields.
pub fn normalize(src: &mut SplitBundle, tgt: &mut SplitBundle, mode: NormalizeMode) -> Result<()> {
    match mode {
        NormalizeMode::Individual => {
            normalize_individual(src)?;
            normalize_individual(tgt)?;
        }
        NormalizeMode::Composite => {
            normalize_composite(src, tgt)?;
        }
    }
    Ok(())
}
