//! Dataset bundles and split containers.
//!
//! A [`DatasetBundle`] is the unit every pipeline stage consumes: a 3-D
//! feature tensor, a per-class target matrix, per-sample weights and the
//! names describing the feature and target axes.
//!
//! ```text
//! features : [sample, timestep, feature]   (timestep axis may be 1)
//! target   : [sample, class]               one-hot or [1-p, p]
//! weight   : [sample]
//! ```
//!
//! All three arrays share the sample axis; this is checked once at
//! construction so later stages can index freely.
//!
//! [`RawDataset`] turns the arrays produced by an external reader (per
//! timestep event probabilities, optional weights) into a bundle.

use crate::config::{FeatureTimestep, TargetConfig};
use crate::error::{PipelineError, Result};
use crate::preprocessing::normalization::NormalizationStats;
use ndarray::{s, Array1, Array2, Array3, ArrayView1, ArrayView2, ArrayView3, Axis};
use std::fmt;
use std::ops::Range;

/// Column index of the positive class in a two-class target.
pub const POSITIVE_CLASS: usize = 1;

/// Column index of the negative class in a two-class target.
pub const NEGATIVE_CLASS: usize = 0;

/// Features, targets and weights for one population of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetBundle {
    features: Array3<f64>,
    target: Array2<f64>,
    weight: Array1<f64>,
    feature_names: Vec<String>,
    target_name: String,
}

impl DatasetBundle {
    /// Create a bundle, validating that all arrays agree on shape.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DataShape`] if the sample counts of
    /// features, target and weight differ, or if the number of feature
    /// names does not match the feature axis.
    pub fn new(
        features: Array3<f64>,
        target: Array2<f64>,
        weight: Array1<f64>,
        feature_names: Vec<String>,
        target_name: impl Into<String>,
    ) -> Result<Self> {
        let n = features.len_of(Axis(0));
        if target.nrows() != n || weight.len() != n {
            return Err(PipelineError::data_shape(format!(
                "sample counts disagree: features={}, target={}, weight={}",
                n,
                target.nrows(),
                weight.len()
            )));
        }
        if feature_names.len() != features.len_of(Axis(2)) {
            return Err(PipelineError::data_shape(format!(
                "{} feature names for {} feature columns",
                feature_names.len(),
                features.len_of(Axis(2))
            )));
        }

        Ok(Self {
            features,
            target,
            weight,
            feature_names,
            target_name: target_name.into(),
        })
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.weight.len()
    }

    /// True if the bundle holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of timesteps per sample.
    pub fn n_timesteps(&self) -> usize {
        self.features.len_of(Axis(1))
    }

    /// Number of feature columns.
    pub fn n_features(&self) -> usize {
        self.features.len_of(Axis(2))
    }

    /// Number of target classes.
    pub fn n_classes(&self) -> usize {
        self.target.ncols()
    }

    pub fn features(&self) -> ArrayView3<'_, f64> {
        self.features.view()
    }

    /// Mutable access to the feature tensor. The shape cannot change.
    pub fn features_mut(&mut self) -> &mut Array3<f64> {
        &mut self.features
    }

    pub fn target(&self) -> ArrayView2<'_, f64> {
        self.target.view()
    }

    /// Mutable access to the target matrix. The shape cannot change.
    pub fn target_mut(&mut self) -> &mut Array2<f64> {
        &mut self.target
    }

    pub fn weight(&self) -> ArrayView1<'_, f64> {
        self.weight.view()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// Positive-class column of the target matrix.
    ///
    /// # Panics
    ///
    /// Panics if the target has fewer than two classes.
    pub fn positive_rates(&self) -> ArrayView1<'_, f64> {
        self.target.column(POSITIVE_CLASS)
    }

    /// Contiguous sample range `[range.start, range.end)` as a new bundle.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn slice(&self, range: Range<usize>) -> Self {
        Self {
            features: self.features.slice(s![range.clone(), .., ..]).to_owned(),
            target: self.target.slice(s![range.clone(), ..]).to_owned(),
            weight: self.weight.slice(s![range]).to_owned(),
            feature_names: self.feature_names.clone(),
            target_name: self.target_name.clone(),
        }
    }

    /// Keep only the first `len` samples (no-op if already shorter).
    pub fn truncate(&mut self, len: usize) {
        if len < self.len() {
            *self = self.slice(0..len);
        }
    }

    /// Gather samples by index, in the given order. Indices may repeat.
    pub fn select_samples(&self, indices: &[usize]) -> Self {
        Self {
            features: self.features.select(Axis(0), indices),
            target: self.target.select(Axis(0), indices),
            weight: self.weight.select(Axis(0), indices),
            feature_names: self.feature_names.clone(),
            target_name: self.target_name.clone(),
        }
    }

    /// Gather feature columns by index, renaming the feature axis to match.
    pub fn select_features(&self, indices: &[usize]) -> Self {
        Self {
            features: self.features.select(Axis(2), indices),
            target: self.target.clone(),
            weight: self.weight.clone(),
            feature_names: indices
                .iter()
                .map(|&i| self.feature_names[i].clone())
                .collect(),
            target_name: self.target_name.clone(),
        }
    }

    /// Decompose into `(features, target, weight)`.
    pub fn into_arrays(self) -> (Array3<f64>, Array2<f64>, Array1<f64>) {
        (self.features, self.target, self.weight)
    }
}

impl fmt::Display for DatasetBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} samples × {} timesteps × {} features → '{}' ({} classes)",
            self.len(),
            self.n_timesteps(),
            self.n_features(),
            self.target_name,
            self.n_classes()
        )
    }
}

/// Which partition of a [`SplitBundle`] to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Train,
    Val,
    Test,
}

impl Partition {
    pub const ALL: [Partition; 3] = [Partition::Train, Partition::Val, Partition::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Train => "train",
            Partition::Val => "val",
            Partition::Test => "test",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dataset partitioned into train, validation and test ranges.
///
/// `stats` is filled in by normalization and holds the exact values used to
/// scale every partition, so inference-time data can be transformed the
/// same way.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitBundle {
    pub train: DatasetBundle,
    pub val: DatasetBundle,
    pub test: DatasetBundle,
    pub stats: Option<NormalizationStats>,
}

impl SplitBundle {
    pub fn get(&self, partition: Partition) -> &DatasetBundle {
        match partition {
            Partition::Train => &self.train,
            Partition::Val => &self.val,
            Partition::Test => &self.test,
        }
    }

    pub fn get_mut(&mut self, partition: Partition) -> &mut DatasetBundle {
        match partition {
            Partition::Train => &mut self.train,
            Partition::Val => &mut self.val,
            Partition::Test => &mut self.test,
        }
    }

    /// Total samples across all partitions.
    pub fn total_len(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }

    pub fn feature_names(&self) -> &[String] {
        self.train.feature_names()
    }
}

/// Convert positive-class rates into `[1-p, p]` rows.
pub fn to_multiclass(p: ArrayView1<'_, f64>) -> Array2<f64> {
    let mut out = Array2::zeros((p.len(), 2));
    for (i, &v) in p.iter().enumerate() {
        out[[i, NEGATIVE_CLASS]] = 1.0 - v;
        out[[i, POSITIVE_CLASS]] = v;
    }
    out
}

/// Arrays as handed over by an external dataset reader.
///
/// Targets are per-timestep event probabilities for a single target index;
/// each timestep's probability is mutually exclusive, so summing a window
/// gives the probability of the event inside that window.
#[derive(Debug, Clone)]
pub struct RawDataset {
    /// `[sample, timestep, feature]`
    pub features: Array3<f64>,
    /// `[sample, target_timestep]`
    pub targets: Array2<f64>,
    /// `[sample]`; ones are used when absent.
    pub weights: Option<Array1<f64>>,
    pub feature_names: Vec<String>,
    pub target_name: String,
}

impl RawDataset {
    /// Reduce raw loader output to a two-class [`DatasetBundle`].
    ///
    /// Steps, in order:
    /// 1. drop samples with any target mass before `remove_early_collision_idx`
    /// 2. sum targets over `[start_timestep, end_timestep)`
    /// 3. keep the configured feature timestep(s)
    /// 4. expand the summed rate into `[1-p, p]`
    pub fn into_bundle(self, config: &TargetConfig) -> Result<DatasetBundle> {
        let n = self.features.len_of(Axis(0));
        if self.targets.nrows() != n {
            return Err(PipelineError::data_shape(format!(
                "raw targets have {} rows for {} feature samples",
                self.targets.nrows(),
                n
            )));
        }
        let weights = match self.weights {
            Some(w) if w.len() != n => {
                return Err(PipelineError::data_shape(format!(
                    "raw weights have {} entries for {} samples",
                    w.len(),
                    n
                )))
            }
            Some(w) => w,
            None => Array1::ones(n),
        };

        let horizon = self.targets.ncols();
        let end = config.end_timestep.unwrap_or(horizon);
        if end > horizon || config.start_timestep > end {
            return Err(PipelineError::configuration(format!(
                "target window [{}, {}) does not fit {} target timesteps",
                config.start_timestep, end, horizon
            )));
        }

        let keep: Vec<usize> = if config.remove_early_collision_idx > 0 {
            let cut = config.remove_early_collision_idx.min(horizon);
            (0..n)
                .filter(|&i| self.targets.slice(s![i, ..cut]).sum() == 0.0)
                .collect()
        } else {
            (0..n).collect()
        };
        if keep.len() < n {
            log::debug!(
                "Dropped {} of {} samples with early events",
                n - keep.len(),
                n
            );
        }

        let features = self.features.select(Axis(0), &keep);
        let targets = self.targets.select(Axis(0), &keep);
        let weights = weights.select(Axis(0), &keep);

        let rates = targets
            .slice(s![.., config.start_timestep..end])
            .sum_axis(Axis(1));

        let timesteps = features.len_of(Axis(1));
        let features = match config.feature_timestep {
            FeatureTimestep::All => features,
            FeatureTimestep::Last if timesteps > 0 => features
                .slice(s![.., timesteps - 1..timesteps, ..])
                .to_owned(),
            FeatureTimestep::Index(t) if t < timesteps => {
                features.slice(s![.., t..t + 1, ..]).to_owned()
            }
            other => {
                return Err(PipelineError::configuration(format!(
                    "feature timestep {other:?} out of range for {timesteps} timesteps"
                )))
            }
        };

        DatasetBundle::new(
            features,
            to_multiclass(rates.view()),
            weights,
            self.feature_names,
            self.target_name,
        )
    }
}
