//! Domain Adaptation Data
//!
//! Paired-domain dataset preparation and evaluation for training
//! probabilistic classifiers across two populations of time-series samples.
//!
//! # Overview
//!
//! A *source* and a *target* domain describe the same prediction task
//! (for example, collision risk) but come from different collection setups:
//! different feature sets, sizes and label distributions. This library
//! takes both from a reader and hands a training loop synchronized batches:
//!
//! - **Alignment**: reorder and subset source features to the target's
//! - **Splitting**: contiguous train/validation/test partitions
//! - **Normalization**: individual or count-weighted composite statistics
//! - **Label sampling**: binarize and subset target train labels
//! - **Batching**: wraparound cursors drawing both domains in lockstep
//! - **Metrics**: weighted Brier, relative error, cross-entropy and an
//!   optimally-normalized average precision
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   Domain Adaptation Data                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  dataset/       - Bundles, splits, raw reader output            │
//! │  alignment/     - Feature-axis reconciliation                   │
//! │  split/         - Train/val/test boundaries                     │
//! │  preprocessing/ - Normalization and label sampling              │
//! │  batch/         - Cursors and paired batch iteration            │
//! │  metrics/       - Evaluation and epoch statistics               │
//! │  validation/    - Input sanity checks                           │
//! │  pipeline/      - Config-driven orchestration                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use domain_adaptation_data::prelude::*;
//!
//! let pipeline = Pipeline::from_config(PipelineConfig::load_toml("experiment.toml")?)?;
//! let mut prepared = pipeline.prepare(&source, &target)?;
//!
//! let mut train = prepared.paired(Partition::Train)?;
//! for batch in train.epoch(&mut prepared.rng) {
//!     let probs = model.step(&batch);
//!     let result = evaluate(batch.target.target.view(), probs.view(), batch.target.weight.view());
//! }
//! ```

pub mod alignment;
pub mod batch;
pub mod config;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod prelude;
pub mod preprocessing;
pub mod split;
pub mod validation;

// Re-exports - Errors
pub use error::{PipelineError, Result};

// Re-exports - Data
pub use dataset::{to_multiclass, DatasetBundle, Partition, RawDataset, SplitBundle};

// Re-exports - Config
pub use config::{BatchConfig, ExperimentMetadata, FeatureTimestep, PipelineConfig, TargetConfig};

// Re-exports - Stages
pub use alignment::{align_features, select_nonconstant_features, select_proposal_samples};
pub use split::{split, SplitBoundaries};
pub use preprocessing::{
    binarize_targets, normalize, subselect_positive, subselect_train, NormalizationStats,
    NormalizeMode,
};

// Re-exports - Batching
pub use batch::{batch_indices, BatchCursor, FillPolicy, PairedBatch, PairedDataset};

// Re-exports - Metrics
pub use metrics::{evaluate, EvaluationResult, TrainingStats};

// Re-exports - Validation
pub use validation::{BundleValidator, ValidationConfig, ValidationLevel, ValidationResult};

// Re-exports - Pipeline
pub use pipeline::{align_and_split, Pipeline, PreparedData};
