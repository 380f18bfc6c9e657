//! Wraparound batch index generation for paired domains.
//!
//! Domain adaptation training consumes one source batch and one target batch
//! every step, even though the two domains rarely hold the same number of
//! samples. Instead of synchronizing explicit epoch boundaries, each domain
//! owns a [`BatchCursor`] that simply wraps around its own dataset:
//!
//! ```text
//! size = 10, batch_size = 4
//!
//! start=0  [0 1 2 3]
//! start=4  [4 5 6 7]
//! start=8  [8 9 | r r]      r = uniform draw in [0, 10)   (FillPolicy::Random)
//!          [8 9]                                          (FillPolicy::None)
//! start=2  [2 3 4 5]        cursor wrapped, no reset to 0
//! ```
//!
//! The smaller domain wraps (and is padded with random re-draws) more often
//! than the larger one; both advance in lockstep at the same cadence.
//!
//! # Threading
//!
//! Cursors are plain owned state advanced through `&mut self`. If source
//! and target are drawn from different threads, each cursor stays confined
//! to its own thread; no locking is provided.
//!
//! # Example
//!
//! ```
//! use domain_adaptation_data::batch::{BatchCursor, FillPolicy};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let mut cursor = BatchCursor::new(10).unwrap();
//!
//! assert_eq!(cursor.next_batch(4, FillPolicy::None, &mut rng), vec![0, 1, 2, 3]);
//! assert_eq!(cursor.next_batch(4, FillPolicy::None, &mut rng), vec![4, 5, 6, 7]);
//! assert_eq!(cursor.next_batch(4, FillPolicy::None, &mut rng), vec![8, 9]);
//! assert_eq!(cursor.position(), 2);
//! ```

use crate::dataset::DatasetBundle;
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, Array3, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Fill Policy
// ============================================================================

/// What to do with the part of a batch that runs past the end of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    /// Pad with indices drawn uniformly from the whole dataset.
    #[default]
    Random,
    /// Return a short batch.
    None,
}

impl FillPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FillPolicy::Random => "random",
            FillPolicy::None => "none",
        }
    }
}

impl fmt::Display for FillPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FillPolicy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "random" => Ok(FillPolicy::Random),
            "none" => Ok(FillPolicy::None),
            other => Err(PipelineError::configuration(format!(
                "invalid fill '{other}', expected 'random' or 'none'"
            ))),
        }
    }
}

// ============================================================================
// Index Generation
// ============================================================================

/// Number of batches needed to cover `n_samples` once.
///
/// # Panics
///
/// Panics if `batch_size` is zero.
pub fn compute_n_batches(n_samples: usize, batch_size: usize) -> usize {
    n_samples.div_ceil(batch_size)
}

/// Indices of the batch starting at `start` in a dataset of `size` samples.
///
/// - `start >= size`: `batch_size` uniform draws from `[0, size)`
/// - batch fits: `[start, start + batch_size)`
/// - batch straddles the end: `[start, size)` then filler per `fill`
///
/// # Errors
///
/// [`PipelineError::DataShape`] if `size` is zero.
pub fn batch_indices<R: Rng + ?Sized>(
    start: usize,
    batch_size: usize,
    size: usize,
    fill: FillPolicy,
    rng: &mut R,
) -> Result<Vec<usize>> {
    if size == 0 {
        return Err(PipelineError::data_shape(
            "cannot draw batch indices from an empty dataset",
        ));
    }
    Ok(indices_nonempty(start, batch_size, size, fill, rng))
}

fn indices_nonempty<R: Rng + ?Sized>(
    start: usize,
    batch_size: usize,
    size: usize,
    fill: FillPolicy,
    rng: &mut R,
) -> Vec<usize> {
    debug_assert!(size > 0);

    if start >= size {
        return (0..batch_size).map(|_| rng.gen_range(0..size)).collect();
    }

    let end = start + batch_size;
    if end <= size {
        return (start..end).collect();
    }

    let mut indices: Vec<usize> = (start..size).collect();
    if fill == FillPolicy::Random {
        let remainder = end - size;
        indices.extend((0..remainder).map(|_| rng.gen_range(0..size)));
    }
    indices
}

// ============================================================================
// Cursor
// ============================================================================

/// Per-dataset batch position.
///
/// Advanced once per batch and wrapped modulo the dataset size; it is never
/// reset implicitly. Create a new cursor to start over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCursor {
    position: usize,
    dataset_size: usize,
}

impl BatchCursor {
    /// Cursor at position 0.
    ///
    /// # Errors
    ///
    /// [`PipelineError::DataShape`] if `dataset_size` is zero.
    pub fn new(dataset_size: usize) -> Result<Self> {
        Self::at(0, dataset_size)
    }

    /// Cursor at an explicit starting position.
    ///
    /// A position at or past `dataset_size` is kept as is: the next batch is
    /// then a fully random one, after which the cursor wraps.
    pub fn at(position: usize, dataset_size: usize) -> Result<Self> {
        if dataset_size == 0 {
            return Err(PipelineError::data_shape(
                "batch cursor requires a non-empty dataset",
            ));
        }
        Ok(Self {
            position,
            dataset_size,
        })
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn dataset_size(&self) -> usize {
        self.dataset_size
    }

    /// Indices for the next batch; advances the cursor by `batch_size`.
    pub fn next_batch<R: Rng + ?Sized>(
        &mut self,
        batch_size: usize,
        fill: FillPolicy,
        rng: &mut R,
    ) -> Vec<usize> {
        let indices = indices_nonempty(self.position, batch_size, self.dataset_size, fill, rng);
        self.position = (self.position % self.dataset_size + batch_size) % self.dataset_size;
        indices
    }
}

// ============================================================================
// Paired Dataset
// ============================================================================

/// Samples gathered from one domain for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub indices: Vec<usize>,
    pub features: Array3<f64>,
    pub target: Array2<f64>,
    pub weight: Array1<f64>,
}

impl Batch {
    fn gather(bundle: &DatasetBundle, indices: Vec<usize>) -> Self {
        Self {
            features: bundle.features().select(Axis(0), &indices),
            target: bundle.target().select(Axis(0), &indices),
            weight: bundle.weight().select(Axis(0), &indices),
            indices,
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Synchronized source and target batches for one training step.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedBatch {
    pub source: Batch,
    pub target: Batch,
}

/// Source and target partitions iterated in lockstep.
///
/// One epoch is [`n_batches`](Self::n_batches) steps, sized so the larger
/// domain is covered once; the smaller domain wraps within the epoch.
#[derive(Debug, Clone)]
pub struct PairedDataset {
    source: DatasetBundle,
    target: DatasetBundle,
    batch_size: usize,
    fill: FillPolicy,
    source_cursor: BatchCursor,
    target_cursor: BatchCursor,
}

impl PairedDataset {
    /// Pair two partitions with random fill.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Configuration`] for a zero batch size,
    /// [`PipelineError::DataShape`] if either partition is empty or their
    /// feature counts differ.
    pub fn new(source: DatasetBundle, target: DatasetBundle, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(PipelineError::configuration("batch_size must be > 0"));
        }
        if source.n_features() != target.n_features() {
            return Err(PipelineError::data_shape(format!(
                "paired domains disagree on feature count: {} vs {}",
                source.n_features(),
                target.n_features()
            )));
        }
        let source_cursor = BatchCursor::new(source.len())?;
        let target_cursor = BatchCursor::new(target.len())?;

        Ok(Self {
            source,
            target,
            batch_size,
            fill: FillPolicy::default(),
            source_cursor,
            target_cursor,
        })
    }

    /// Set the fill policy used for both domains.
    pub fn with_fill(mut self, fill: FillPolicy) -> Self {
        self.fill = fill;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn fill(&self) -> FillPolicy {
        self.fill
    }

    pub fn source(&self) -> &DatasetBundle {
        &self.source
    }

    pub fn target(&self) -> &DatasetBundle {
        &self.target
    }

    /// Steps per epoch, based on the larger domain.
    pub fn n_batches(&self) -> usize {
        compute_n_batches(self.source.len().max(self.target.len()), self.batch_size)
    }

    /// Draw the next synchronized pair of batches.
    pub fn next_batch<R: Rng + ?Sized>(&mut self, rng: &mut R) -> PairedBatch {
        let src_idx = self
            .source_cursor
            .next_batch(self.batch_size, self.fill, rng);
        let tgt_idx = self
            .target_cursor
            .next_batch(self.batch_size, self.fill, rng);

        PairedBatch {
            source: Batch::gather(&self.source, src_idx),
            target: Batch::gather(&self.target, tgt_idx),
        }
    }

    /// Iterate one epoch of paired batches.
    pub fn epoch<'a, R: Rng + ?Sized>(&'a mut self, rng: &'a mut R) -> EpochBatches<'a, R> {
        let remaining = self.n_batches();
        EpochBatches {
            dataset: self,
            rng,
            remaining,
        }
    }
}

/// Iterator over the paired batches of one epoch.
pub struct EpochBatches<'a, R: Rng + ?Sized> {
    dataset: &'a mut PairedDataset,
    rng: &'a mut R,
    remaining: usize,
}

impl<R: Rng + ?Sized> Iterator for EpochBatches<'_, R> {
    type Item = PairedBatch;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.dataset.next_batch(&mut *self.rng))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<R: Rng + ?Sized> ExactSizeIterator for EpochBatches<'_, R> {}
