//! Weighted evaluation metrics for probabilistic two-class predictions.
//!
//! Every metric takes ground truth, predictions and per-sample weights of
//! equal length. A length mismatch is a programming error and panics; it is
//! never coerced.
//!
//! # Point metrics
//!
//! ```text
//! brier(a, b, w)          = mean(w * (a - b)^2)
//! relative_error(a, b, w) = mean(w * |a - b| / (a + 1e-10))
//! cross_entropy(a, b, w)  = -mean(w * (a1 ln b1 + a0 ln b0))   b clipped, a == 0 masked
//! ```
//!
//! Means are taken over samples (not normalized by total weight), so the
//! weights act as importance ratios. An empty slice yields NaN.
//!
//! # Ranking metrics
//!
//! See [`ranking`] for weighted average precision, the optimal-ranking
//! normalized [`avg_prc`](ranking::avg_prc) and ROC AUC.
//!
//! # Undefined values
//!
//! Metrics restricted to positive samples are reported as [`MISSING_VALUE`]
//! (`-1.0`) when the slice holds no positive sample, and `avg_prc` reports
//! `0.0` when its ratio is undefined. Both are sentinels, not errors.

pub mod epoch_stats;
pub mod ranking;

pub use epoch_stats::{Aggregate, MetricMap, StatsSummary, TrainingStats};
pub use ranking::{average_precision, avg_prc, classification_score, roc_auc};

use crate::dataset::{NEGATIVE_CLASS, POSITIVE_CLASS};
use ahash::AHashMap;
use ndarray::{ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel for a metric that is undefined on the scored slice.
pub const MISSING_VALUE: f64 = -1.0;

/// Offset added to the denominator of the relative error.
pub const RELATIVE_ERROR_EPS: f64 = 1e-10;

/// Probability clipping bound for cross-entropy.
pub const CROSS_ENTROPY_EPS: f64 = 1e-16;

fn assert_same_len(a: usize, b: usize, w: usize) {
    assert!(
        a == b && b == w,
        "metric inputs must have equal length: truth={a}, prediction={b}, weight={w}"
    );
}

/// Weighted Brier score.
pub fn brier(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>, w: ArrayView1<'_, f64>) -> f64 {
    assert_same_len(a.len(), b.len(), w.len());
    let total: f64 = a
        .iter()
        .zip(b.iter())
        .zip(w.iter())
        .map(|((&a, &b), &w)| (a - b).powi(2) * w)
        .sum();
    total / a.len() as f64
}

/// Weighted error relative to the true value.
pub fn relative_error(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>, w: ArrayView1<'_, f64>) -> f64 {
    assert_same_len(a.len(), b.len(), w.len());
    let total: f64 = a
        .iter()
        .zip(b.iter())
        .zip(w.iter())
        .map(|((&a, &b), &w)| (a - b).abs() / (a + RELATIVE_ERROR_EPS) * w)
        .sum();
    total / a.len() as f64
}

/// Weighted two-class cross-entropy on `[n, 2]` truth and probabilities.
///
/// Probabilities are clipped to `[1e-16, 1 - 1e-16]`. A true-class component
/// that is exactly zero contributes nothing, rather than `0 * ln(eps)`.
///
/// # Panics
///
/// Panics on mismatched lengths or if either array is not two-class.
pub fn cross_entropy(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>, w: ArrayView1<'_, f64>) -> f64 {
    assert_same_len(a.nrows(), b.nrows(), w.len());
    assert!(
        a.ncols() == 2 && b.ncols() == 2,
        "cross_entropy expects [n, 2] arrays"
    );

    let term = |truth: f64, prob: f64| {
        if truth == 0.0 {
            0.0
        } else {
            truth * prob.clamp(CROSS_ENTROPY_EPS, 1.0 - CROSS_ENTROPY_EPS).ln()
        }
    };

    let total: f64 = a
        .outer_iter()
        .zip(b.outer_iter())
        .zip(w.iter())
        .map(|((a, b), &w)| {
            let one = term(a[POSITIVE_CLASS], b[POSITIVE_CLASS]);
            let zero = term(a[NEGATIVE_CLASS], b[NEGATIVE_CLASS]);
            (one + zero) * w
        })
        .sum();
    -(total / a.nrows() as f64)
}

/// Scalar summary of a scored slice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub brier: f64,
    pub rel_err: f64,
    /// [`MISSING_VALUE`] when no positive sample exists.
    pub pos_brier: f64,
    /// [`MISSING_VALUE`] when no positive sample exists.
    pub pos_rel_err: f64,
    /// [`MISSING_VALUE`] when no positive sample exists.
    pub pos_ce: f64,
    /// `0.0` when undefined.
    pub avg_prc: f64,
}

impl EvaluationResult {
    /// Whether positive-restricted metrics were defined for this slice.
    pub fn has_positives(&self) -> bool {
        self.pos_brier != MISSING_VALUE
    }

    /// Metric names paired with values, in a fixed order.
    pub fn entries(&self) -> [(&'static str, f64); 6] {
        [
            ("brier", self.brier),
            ("rel_err", self.rel_err),
            ("pos_brier", self.pos_brier),
            ("pos_rel_err", self.pos_rel_err),
            ("pos_ce", self.pos_ce),
            ("avg_prc", self.avg_prc),
        ]
    }

    pub fn to_map(&self) -> MetricMap {
        self.entries()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<AHashMap<_, _>>()
    }
}

impl fmt::Display for EvaluationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .entries()
            .iter()
            .map(|(k, v)| format!("{k}={v:.5}"))
            .collect();
        f.write_str(&parts.join(" "))
    }
}

/// Score `[n, 2]` probabilities against `[n, 2]` truth.
///
/// Point metrics use the positive-class column. `pos_*` metrics are
/// restricted to samples whose true positive rate is above zero.
///
/// # Panics
///
/// Panics on a length mismatch or a NaN positive-class probability.
pub fn evaluate(y: ArrayView2<'_, f64>, probs: ArrayView2<'_, f64>, w: ArrayView1<'_, f64>) -> EvaluationResult {
    assert_same_len(y.nrows(), probs.nrows(), w.len());

    let y_pos = y.column(POSITIVE_CLASS);
    let p_pos = probs.column(POSITIVE_CLASS);

    let brier_all = brier(y_pos, p_pos, w);
    let rel_err = relative_error(y_pos, p_pos, w);
    let avg_prc = ranking::avg_prc(y_pos, p_pos, w, 1);

    let idx: Vec<usize> = y_pos
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v > 0.0)
        .map(|(i, _)| i)
        .collect();

    let (pos_brier, pos_rel_err, pos_ce) = if idx.is_empty() {
        (MISSING_VALUE, MISSING_VALUE, MISSING_VALUE)
    } else {
        let y_sel = y.select(Axis(0), &idx);
        let p_sel = probs.select(Axis(0), &idx);
        let w_sel = w.select(Axis(0), &idx);
        (
            brier(y_sel.column(POSITIVE_CLASS), p_sel.column(POSITIVE_CLASS), w_sel.view()),
            relative_error(
                y_sel.column(POSITIVE_CLASS),
                p_sel.column(POSITIVE_CLASS),
                w_sel.view(),
            ),
            cross_entropy(y_sel.view(), p_sel.view(), w_sel.view()),
        )
    };

    EvaluationResult {
        brier: brier_all,
        rel_err,
        pos_brier,
        pos_rel_err,
        pos_ce,
        avg_prc,
    }
}
