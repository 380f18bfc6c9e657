//! Aggregation of per-batch metrics into per-epoch curves.
//!
//! A training loop records one [`MetricMap`] per scored batch, separately
//! for train and validation. Summarizing averages each metric within an
//! epoch while skipping the [`MISSING_VALUE`] sentinel, so a batch without
//! positive samples does not drag `pos_*` curves towards `-1`.

use super::MISSING_VALUE;
use ahash::AHashMap;
use std::collections::BTreeMap;

/// Metric name to value for one scored batch.
pub type MetricMap = AHashMap<String, f64>;

/// How to reduce a validation curve to a single model-selection score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggregate {
    #[default]
    Max,
    Min,
    Last,
    Mean,
}

impl Aggregate {
    fn apply(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(match self {
            Aggregate::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Aggregate::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Aggregate::Last => values[values.len() - 1],
            Aggregate::Mean => values.iter().sum::<f64>() / values.len() as f64,
        })
    }
}

#[derive(Debug, Clone, Default)]
struct EpochRecord {
    train: Vec<MetricMap>,
    val: Vec<MetricMap>,
}

/// Metrics recorded during training, keyed by epoch.
#[derive(Debug, Clone, Default)]
pub struct TrainingStats {
    epochs: BTreeMap<usize, EpochRecord>,
}

impl TrainingStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record metrics of one train batch.
    pub fn record_train(&mut self, epoch: usize, metrics: MetricMap) {
        self.epochs.entry(epoch).or_default().train.push(metrics);
    }

    /// Record metrics of one validation batch.
    pub fn record_val(&mut self, epoch: usize, metrics: MetricMap) {
        self.epochs.entry(epoch).or_default().val.push(metrics);
    }

    pub fn n_epochs(&self) -> usize {
        self.epochs.len()
    }

    /// Per-metric curves with one point per epoch, in epoch order.
    pub fn summarize(&self) -> StatsSummary {
        let mut summary = StatsSummary::default();
        for record in self.epochs.values() {
            process_epoch_stats(&record.train, &mut summary.train);
            process_epoch_stats(&record.val, &mut summary.val);
        }
        summary
    }
}

/// Epoch curves for train and validation metrics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSummary {
    pub train: AHashMap<String, Vec<f64>>,
    pub val: AHashMap<String, Vec<f64>>,
}

impl StatsSummary {
    /// Reduce the validation curve of `key` to one score.
    ///
    /// Returns [`MISSING_VALUE`] when no validation data was recorded for it.
    pub fn score(&self, key: &str, aggregate: Aggregate) -> f64 {
        self.val
            .get(key)
            .and_then(|curve| aggregate.apply(curve))
            .unwrap_or(MISSING_VALUE)
    }
}

/// Append the mean of each metric over `batches` to its curve in `into`.
///
/// Values equal to [`MISSING_VALUE`] are skipped; a metric with no valid
/// value in this epoch gets no point.
pub fn process_epoch_stats(batches: &[MetricMap], into: &mut AHashMap<String, Vec<f64>>) {
    let mut grouped: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for batch in batches {
        for (key, &value) in batch {
            grouped.entry(key.as_str()).or_default().push(value);
        }
    }

    for (key, values) in grouped {
        let valid: Vec<f64> = values.into_iter().filter(|&v| v != MISSING_VALUE).collect();
        if valid.is_empty() {
            continue;
        }
        let mean = valid.iter().sum::<f64>() / valid.len() as f64;
        into.entry(key.to_string()).or_default().push(mean);
    }
}
