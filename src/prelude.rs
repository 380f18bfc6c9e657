//! Prelude module for convenient imports.
//!
//! # Usage
//!
//! ```ignore
//! use domain_adaptation_data::prelude::*;
//!
//! let pipeline = Pipeline::from_config(PipelineConfig::default())?;
//! let prepared = pipeline.prepare(&source, &target)?;
//! ```
//!
//! # What's Included
//!
//! ## Core Pipeline
//! - [`Pipeline`] - Config-driven preparation
//! - [`PipelineConfig`] - Pipeline configuration
//! - [`PreparedData`] - Split, normalized source and target
//!
//! ## Data
//! - [`DatasetBundle`], [`SplitBundle`], [`Partition`]
//!
//! ## Batching
//! - [`PairedDataset`] - Lockstep source/target batches
//! - [`BatchCursor`] - Per-domain wraparound cursor
//!
//! ## Metrics
//! - [`evaluate`] - Scalar summary of a scored slice
//! - [`TrainingStats`] - Per-epoch metric curves

// ============================================================================
// Core Pipeline
// ============================================================================

pub use crate::config::{
    BatchConfig, ExperimentMetadata, FeatureTimestep, PipelineConfig, TargetConfig,
};
pub use crate::error::{PipelineError, Result};
pub use crate::pipeline::{align_and_split, Pipeline, PreparedData};

// ============================================================================
// Data
// ============================================================================

pub use crate::dataset::{to_multiclass, DatasetBundle, Partition, RawDataset, SplitBundle};

// ============================================================================
// Preprocessing
// ============================================================================

pub use crate::alignment::align_features;
pub use crate::preprocessing::{normalize, NormalizationStats, NormalizeMode};
pub use crate::split::split;

// ============================================================================
// Batching
// ============================================================================

pub use crate::batch::{Batch, BatchCursor, FillPolicy, PairedBatch, PairedDataset};

// ============================================================================
// Metrics
// ============================================================================

pub use crate::metrics::{avg_prc, evaluate, Aggregate, EvaluationResult, TrainingStats};

// ============================================================================
// Validation
// ============================================================================

pub use crate::validation::{BundleValidator, ValidationResult};
