//! Pipeline configuration management.
//!
//! One serializable struct holds every knob of the dataset preparation
//! pipeline so an experiment can be reproduced from a single file.
//!
//! # Features
//!
//! - **Unified Configuration**: split fractions, label handling, subsetting,
//!   normalization, batching and the RNG seed in one place
//! - **Serialization**: Save/load configurations to TOML or JSON
//! - **Validation**: Reject impossible values before any data is touched
//!
//! # Example
//!
//! ```ignore
//! use domain_adaptation_data::config::PipelineConfig;
//!
//! let config = PipelineConfig::default().with_seed(7);
//! config.save_toml("experiment.toml")?;
//!
//! let loaded = PipelineConfig::load_toml("experiment.toml")?;
//! let pipeline = Pipeline::from_config(loaded)?;
//! ```
//!
//! Missing fields fall back to their defaults, so a TOML file only needs the
//! values that differ:
//!
//! ```text
//! tgt_train_split = 0.3
//! n_pos_tgt_train_samples = 50
//!
//! [batch]
//! batch_size = 256
//! fill = "none"
//! ```

use crate::batch::FillPolicy;
use crate::error::{PipelineError, Result};
use crate::preprocessing::normalization::NormalizeMode;
use crate::split::validate_train_fraction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_src_train_split() -> f64 {
    0.8
}

fn default_tgt_train_split() -> f64 {
    0.5
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> usize {
    500
}

fn default_start_timestep() -> usize {
    101
}

/// Unified pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Fraction of source samples assigned to train
    #[serde(default = "default_src_train_split")]
    pub src_train_split: f64,

    /// Fraction of target samples assigned to train
    #[serde(default = "default_tgt_train_split")]
    pub tgt_train_split: f64,

    /// Cap on positive samples kept in the target train partition.
    /// Takes precedence over `n_tgt_train_samples`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_pos_tgt_train_samples: Option<usize>,

    /// Cap on total samples kept in the target train partition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_tgt_train_samples: Option<usize>,

    /// Draw one-hot target train labels from their soft probabilities
    #[serde(default = "default_true")]
    pub sample_tgt_train: bool,

    #[serde(default)]
    pub normalize_mode: NormalizeMode,

    #[serde(default = "default_true")]
    pub perform_normalize: bool,

    /// Seed of the RNG used for label sampling and batch filling
    #[serde(default)]
    pub seed: u64,

    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub targets: TargetConfig,

    /// Experiment metadata (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ExperimentMetadata>,
}

/// Batch generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// How a batch running past the end of its domain is completed
    #[serde(default)]
    pub fill: FillPolicy,
}

/// Which timestep(s) of the feature tensor to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureTimestep {
    /// Keep the full time axis
    All,
    /// Keep only the final timestep
    #[default]
    Last,
    /// Keep a single timestep by index
    Index(usize),
}

/// Reduction of per-timestep target probabilities to one event rate.
///
/// See [`crate::dataset::RawDataset::into_bundle`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// First target timestep included in the event window
    #[serde(default = "default_start_timestep")]
    pub start_timestep: usize,

    /// Exclusive end of the event window; `None` runs to the horizon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_timestep: Option<usize>,

    /// Drop samples with any target mass before this timestep (0 disables)
    #[serde(default)]
    pub remove_early_collision_idx: usize,

    #[serde(default)]
    pub feature_timestep: FeatureTimestep,
}

/// Experiment metadata for tracking and reproducibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentMetadata {
    /// Experiment name
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Custom tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl ExperimentMetadata {
    /// Metadata stamped with the current time.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            created_at: Some(Utc::now()),
            tags: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            src_train_split: default_src_train_split(),
            tgt_train_split: default_tgt_train_split(),
            n_pos_tgt_train_samples: None,
            n_tgt_train_samples: None,
            sample_tgt_train: true,
            normalize_mode: NormalizeMode::Composite,
            perform_normalize: true,
            seed: 0,
            batch: BatchConfig::default(),
            targets: TargetConfig::default(),
            metadata: None,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            fill: FillPolicy::Random,
        }
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            start_timestep: default_start_timestep(),
            end_timestep: None,
            remove_early_collision_idx: 0,
            feature_timestep: FeatureTimestep::Last,
        }
    }
}

impl PipelineConfig {
    /// Create a new pipeline configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_train_splits(mut self, src: f64, tgt: f64) -> Self {
        self.src_train_split = src;
        self.tgt_train_split = tgt;
        self
    }

    /// Keep target train samples up to the `n`-th positive.
    pub fn with_positive_cap(mut self, n: usize) -> Self {
        self.n_pos_tgt_train_samples = Some(n);
        self
    }

    /// Keep the first `n` target train samples.
    pub fn with_train_cap(mut self, n: usize) -> Self {
        self.n_tgt_train_samples = Some(n);
        self
    }

    pub fn with_normalize_mode(mut self, mode: NormalizeMode) -> Self {
        self.normalize_mode = mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_batch(mut self, batch: BatchConfig) -> Self {
        self.batch = batch;
        self
    }

    pub fn with_targets(mut self, targets: TargetConfig) -> Self {
        self.targets = targets;
        self
    }

    /// Set experiment metadata.
    pub fn with_metadata(mut self, metadata: ExperimentMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Validate the configuration.
    ///
    /// Returns Ok(()) if valid, Err(msg) otherwise.
    pub fn validate(&self) -> std::result::Result<(), String> {
        validate_train_fraction(self.src_train_split)
            .map_err(|e| format!("src_train_split: {e}"))?;
        validate_train_fraction(self.tgt_train_split)
            .map_err(|e| format!("tgt_train_split: {e}"))?;

        if self.n_pos_tgt_train_samples.is_some() && self.n_tgt_train_samples.is_some() {
            log::warn!("Both positive and total train caps set; only the positive cap applies");
        }

        self.batch.validate()?;
        self.targets.validate()?;
        Ok(())
    }

    /// Save configuration to TOML file.
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string)?;
        Ok(())
    }

    /// Load configuration from TOML file.
    ///
    /// # Errors
    ///
    /// I/O and parse failures keep their own variants; a file that parses
    /// but fails [`validate`](Self::validate) is a
    /// [`PipelineError::Configuration`].
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: PipelineConfig = toml::from_str(&contents)?;
        config.validate().map_err(PipelineError::Configuration)?;
        Ok(config)
    }

    /// Save configuration to JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json_string = serde_json::to_string_pretty(self)?;
        fs::write(path, json_string)?;
        Ok(())
    }

    /// Load configuration from JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&contents)?;
        config.validate().map_err(PipelineError::Configuration)?;
        Ok(config)
    }
}

impl BatchConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.batch_size == 0 {
            return Err("batch_size must be > 0".to_string());
        }
        Ok(())
    }
}

impl TargetConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(end) = self.end_timestep {
            if end < self.start_timestep {
                return Err(format!(
                    "end_timestep ({end}) must be >= start_timestep ({})",
                    self.start_timestep
                ));
            }
        }
        Ok(())
    }
}
