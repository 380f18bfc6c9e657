//! Target-domain label reshaping.
//!
//! The target domain often carries soft labels (`[1-p, p]` event
//! probabilities) while the source domain carries observed outcomes. These
//! transforms make the target train partition look like the latter and
//! optionally simulate label scarcity:
//!
//! - **Binarization**: one uniform draw per sample; `u < p` becomes the
//!   positive one-hot row, otherwise the negative one.
//! - **Positive-bounded subsetting**: keep the shortest prefix that stops
//!   right before the positive count would exceed `n_pos`. Ordering is
//!   preserved; nothing is resampled.
//! - **Size-bounded subsetting**: keep the first `max_train` samples.

use crate::dataset::{DatasetBundle, NEGATIVE_CLASS, POSITIVE_CLASS};
use crate::error::{PipelineError, Result};
use rand::Rng;
use std::fmt;

/// Summary of a two-class label column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelStats {
    /// Number of samples
    pub total: usize,
    /// Samples with a strictly positive positive-class value
    pub positives: usize,
    /// Mean positive-class value
    pub mean_rate: f64,
}

impl LabelStats {
    pub fn from_bundle(bundle: &DatasetBundle) -> Self {
        let rates = bundle.positive_rates();
        let total = rates.len();
        let positives = rates.iter().filter(|&&p| p > 0.0).count();
        let mean_rate = if total > 0 { rates.sum() / total as f64 } else { 0.0 };
        Self {
            total,
            positives,
            mean_rate,
        }
    }
}

impl fmt::Display for LabelStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} samples, {} positive, mean rate {:.4}",
            self.total, self.positives, self.mean_rate
        )
    }
}

fn require_two_classes(bundle: &DatasetBundle) -> Result<()> {
    if bundle.n_classes() != 2 {
        return Err(PipelineError::data_shape(format!(
            "expected [1-p, p] targets, got {} classes",
            bundle.n_classes()
        )));
    }
    Ok(())
}

/// Replace soft `[1-p, p]` labels by one-hot labels drawn with probability `p`.
pub fn binarize_targets<R: Rng + ?Sized>(bundle: &mut DatasetBundle, rng: &mut R) -> Result<()> {
    require_two_classes(bundle)?;

    for mut row in bundle.target_mut().rows_mut() {
        let p = row[POSITIVE_CLASS];
        let positive = rng.gen::<f64>() < p;
        row[NEGATIVE_CLASS] = if positive { 0.0 } else { 1.0 };
        row[POSITIVE_CLASS] = if positive { 1.0 } else { 0.0 };
    }

    log::debug!("Binarized target labels: {}", LabelStats::from_bundle(bundle));
    Ok(())
}

/// First index at which the running count of positive values exceeds `n_pos`.
///
/// `None` if the count never exceeds `n_pos`.
pub fn positive_cutoff<'a, I>(rates: I, n_pos: usize) -> Option<usize>
where
    I: IntoIterator<Item = &'a f64>,
{
    let mut count = 0;
    for (i, &p) in rates.into_iter().enumerate() {
        if p > 0.0 {
            count += 1;
        }
        if count > n_pos {
            return Some(i);
        }
    }
    None
}

/// Truncate to the prefix holding at most `n_pos` positive samples.
///
/// Returns the number of samples removed.
pub fn subselect_positive(bundle: &mut DatasetBundle, n_pos: usize) -> Result<usize> {
    require_two_classes(bundle)?;

    let before = bundle.len();
    let cutoff = positive_cutoff(bundle.positive_rates().iter(), n_pos);
    if let Some(cutoff) = cutoff {
        bundle.truncate(cutoff);
    }
    let removed = before - bundle.len();

    log::info!(
        "Positive subselection (max {}): kept {} of {} train samples",
        n_pos,
        bundle.len(),
        before
    );
    Ok(removed)
}

/// Truncate to the first `max_train` samples. Returns the number removed.
pub fn subselect_train(bundle: &mut DatasetBundle, max_train: usize) -> usize {
    let before = bundle.len();
    bundle.truncate(max_train);
    log::info!(
        "Train subselection (max {}): kept {} of {} samples",
        max_train,
        bundle.len(),
        before
    );
    before - bundle.len()
}
