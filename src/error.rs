//! Error types for the dataset preparation pipeline.
//!
//! Two families of failure exist in this crate:
//!
//! - **Configuration**: the caller asked for something that cannot be done
//!   (feature-name mismatch, invalid split fraction, unknown fill or
//!   normalization mode, invalid config values).
//! - **Data shape**: arrays handed in by the loader disagree on the sample
//!   axis or feature axis, which indicates upstream corruption.
//!
//! Neither is retriable. Mathematically undefined metrics are *not* errors;
//! see [`crate::metrics`] for the sentinel values used instead.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised while preparing paired datasets.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Caller supplied an invalid parameter or mismatched datasets.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Array lengths or feature counts are inconsistent.
    #[error("data shape error: {0}")]
    DataShape(String),

    /// Reading or writing a configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML configuration could not be parsed.
    #[error("failed to parse TOML: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML configuration could not be serialized.
    #[error("failed to serialize TOML: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// JSON configuration could not be parsed or serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Build a configuration error from any displayable message.
    pub fn configuration(msg: impl Into<String>) -> Self {
        PipelineError::Configuration(msg.into())
    }

    /// Build a data shape error from any displayable message.
    pub fn data_shape(msg: impl Into<String>) -> Self {
        PipelineError::DataShape(msg.into())
    }

    /// Whether this error was caused by caller configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, PipelineError::Configuration(_))
    }

    /// Whether this error was caused by inconsistent array shapes.
    pub fn is_data_shape(&self) -> bool {
        matches!(self, PipelineError::DataShape(_))
    }
}
