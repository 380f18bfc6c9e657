//! Unified pipeline for paired-domain dataset preparation.
//!
//! Connects every stage between "two bundles out of a reader" and "paired
//! batches into a training loop":
//!
//! # Architecture
//!
//! ```text
//!  source bundle ─┐                        ┌─► source SplitBundle ──────────┐
//!                 ├─► align ─► validate ─► split                          normalize ─► PreparedData
//!  target bundle ─┘                        └─► target SplitBundle          │              │
//!                                               └─► binarize train ─► cap ─┘              ▼
//!                                                                            paired(Train|Val|Test)
//!                                                                                         │
//!                                                                                  PairedDataset
//! ```
//!
//! Target-only steps (binarization, subsetting) touch the target train
//! partition only; validation and test keep their soft labels so evaluation
//! measures calibration against the true rates.
//!
//! # Reproducibility
//!
//! A single `StdRng` seeded from [`PipelineConfig::seed`] drives label
//! sampling and is handed back in [`PreparedData::rng`] so batch filling
//! continues the same stream. Two runs with the same config and inputs
//! produce identical batches.
//!
//! # Example
//!
//! ```ignore
//! use domain_adaptation_data::prelude::*;
//!
//! let pipeline = Pipeline::from_config(PipelineConfig::default())?;
//! let mut prepared = pipeline.prepare(&source, &target)?;
//!
//! let mut train = prepared.paired(Partition::Train)?;
//! for batch in train.epoch(&mut prepared.rng) {
//!     // feed batch.source / batch.target to the model
//! }
//! ```

use crate::alignment::align_features;
use crate::batch::{FillPolicy, PairedDataset};
use crate::config::PipelineConfig;
use crate::dataset::{DatasetBundle, Partition, SplitBundle};
use crate::error::{PipelineError, Result};
use crate::preprocessing::{binarize_targets, normalize, subselect_positive, subselect_train};
use crate::split::split;
use crate::validation::BundleValidator;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Align `src` features to `tgt`, then split both domains.
///
/// # Errors
///
/// [`PipelineError::Configuration`] if a target feature is missing from the
/// source or either train fraction is outside `(0, 1]`.
pub fn align_and_split(
    src: &DatasetBundle,
    tgt: &DatasetBundle,
    src_train_fraction: f64,
    tgt_train_fraction: f64,
) -> Result<(SplitBundle, SplitBundle)> {
    let aligned = align_features(src, tgt)?;
    let source = split(&aligned, src_train_fraction)?;
    let target = split(tgt, tgt_train_fraction)?;
    Ok((source, target))
}

/// Output of [`Pipeline::prepare`].
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Source domain, feature axis aligned to the target
    pub source: SplitBundle,

    /// Target domain
    pub target: SplitBundle,

    /// RNG stream continued from label sampling, for batch filling
    pub rng: StdRng,

    batch_size: usize,
    fill: FillPolicy,
}

impl PreparedData {
    /// Pair one partition of both domains with the configured batching.
    ///
    /// # Errors
    ///
    /// [`PipelineError::DataShape`] if either domain's partition is empty.
    pub fn paired(&self, partition: Partition) -> Result<PairedDataset> {
        let dataset = PairedDataset::new(
            self.source.get(partition).clone(),
            self.target.get(partition).clone(),
            self.batch_size,
        )?;
        Ok(dataset.with_fill(self.fill))
    }

    /// Feature names shared by both domains.
    pub fn feature_names(&self) -> &[String] {
        self.target.feature_names()
    }
}

/// Main Pipeline - connects all preparation stages
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    validator: BundleValidator,
}

impl Pipeline {
    /// Create pipeline from configuration
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        config.validate().map_err(PipelineError::Configuration)?;
        Ok(Self {
            config,
            validator: BundleValidator::default(),
        })
    }

    /// Replace the default bundle validator.
    pub fn with_validator(mut self, validator: BundleValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every preparation stage on a source/target pair.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::DataShape`] if either input fails validation, or a
    ///   normalization statistic cannot be computed
    /// - [`PipelineError::Configuration`] on feature or target mismatch
    pub fn prepare(&self, src: &DatasetBundle, tgt: &DatasetBundle) -> Result<PreparedData> {
        let config = &self.config;
        let mut rng = StdRng::seed_from_u64(config.seed);

        // Source columns the target lacks are dropped before they are checked.
        let aligned = align_features(src, tgt)?;
        self.validator.validate_bundle(&aligned).into_result("source")?;
        self.validator.validate_bundle(tgt).into_result("target")?;

        let mut source = split(&aligned, config.src_train_split)?;
        let mut target = split(tgt, config.tgt_train_split)?;

        self.validator.validate_split(&source).into_result("source split")?;
        self.validator.validate_split(&target).into_result("target split")?;

        if config.sample_tgt_train {
            binarize_targets(&mut target.train, &mut rng)?;
        }

        if let Some(n_pos) = config.n_pos_tgt_train_samples {
            subselect_positive(&mut target.train, n_pos)?;
        } else if let Some(n) = config.n_tgt_train_samples {
            subselect_train(&mut target.train, n);
        }

        if config.perform_normalize {
            normalize(&mut source, &mut target, config.normalize_mode)?;
        }

        log::info!(
            "Prepared {} features: source train/val/test={}/{}/{}, target train/val/test={}/{}/{}",
            target.train.n_features(),
            source.train.len(),
            source.val.len(),
            source.test.len(),
            target.train.len(),
            target.val.len(),
            target.test.len()
        );

        Ok(PreparedData {
            source,
            target,
            rng,
            batch_size: config.batch.batch_size,
            fill: config.batch.fill,
        })
    }
}
