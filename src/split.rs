//! Deterministic train/validation/test partitioning.
//!
//! Samples are never shuffled here; any shuffling happens upstream in the
//! reader. Partitions are contiguous ranges over the original order:
//!
//! ```text
//! train_end = floor(n * f)
//! val_end   = train_end + floor(n * (1 - f) / 2)
//!
//! [0 ........ train_end) [train_end .. val_end) [val_end .. n)
//!         train                  val                 test
//! ```
//!
//! Validation and test share the remaining `1 - f` mass; with truncating
//! division the test partition absorbs any leftover sample.

use crate::dataset::{DatasetBundle, SplitBundle};
use crate::error::{PipelineError, Result};

/// Index boundaries of a three-way split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitBoundaries {
    /// Exclusive end of the train partition.
    pub train_end: usize,
    /// Exclusive end of the validation partition.
    pub val_end: usize,
    /// Total number of samples.
    pub len: usize,
}

impl SplitBoundaries {
    /// Compute boundaries for `n` samples.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Configuration`] if `train_fraction` is not in `(0, 1]`.
    pub fn new(n: usize, train_fraction: f64) -> Result<Self> {
        validate_train_fraction(train_fraction).map_err(PipelineError::Configuration)?;

        let train_end = ((train_fraction * n as f64) as usize).min(n);
        let val_fraction = (1.0 - train_fraction) / 2.0;
        let val_end = (train_end + (val_fraction * n as f64) as usize).min(n);

        Ok(Self {
            train_end,
            val_end,
            len: n,
        })
    }

    pub fn train_len(&self) -> usize {
        self.train_end
    }

    pub fn val_len(&self) -> usize {
        self.val_end - self.train_end
    }

    pub fn test_len(&self) -> usize {
        self.len - self.val_end
    }
}

/// Check that a train fraction lies in `(0, 1]`.
pub fn validate_train_fraction(train_fraction: f64) -> std::result::Result<(), String> {
    if !train_fraction.is_finite() || train_fraction <= 0.0 || train_fraction > 1.0 {
        return Err(format!(
            "train fraction must be in (0, 1], got {train_fraction}"
        ));
    }
    Ok(())
}

/// Split a bundle into contiguous train, validation and test partitions.
///
/// An empty bundle yields three empty partitions.
pub fn split(bundle: &DatasetBundle, train_fraction: f64) -> Result<SplitBundle> {
    let bounds = SplitBoundaries::new(bundle.len(), train_fraction)?;

    log::debug!(
        "Split {} samples: train={}, val={}, test={}",
        bounds.len,
        bounds.train_len(),
        bounds.val_len(),
        bounds.test_len()
    );

    Ok(SplitBundle {
        train: bundle.slice(0..bounds.train_end),
        val: bundle.slice(bounds.train_end..bounds.val_end),
        test: bundle.slice(bounds.val_end..bounds.len),
        stats: None,
    })
}
