//! Weighted ranking metrics.
//!
//! Average precision follows the usual step-wise definition over distinct
//! score thresholds, taken in descending order:
//!
//! ```text
//! AP = Σ_k (R_k - R_{k-1}) * P_k        R_0 = 0
//! ```
//!
//! where `P_k`, `R_k` are weighted precision and recall when everything
//! scored at or above threshold `k` is predicted positive. Tied scores enter
//! at the same threshold.
//!
//! Raw AP is bounded above by less than 1 whenever labels are soft, so
//! [`avg_prc`] divides by the AP a perfect ranking would reach on the same
//! labels.

use ndarray::{ArrayView1, ArrayView2};

/// Sample indices sorted by descending score; ties keep input order.
fn descending_order(scores: ArrayView1<'_, f64>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order
}

/// Cumulative weighted `(true positive, false positive)` counts at each
/// distinct score threshold, in descending score order.
fn threshold_counts(
    y: ArrayView1<'_, f64>,
    scores: ArrayView1<'_, f64>,
    w: ArrayView1<'_, f64>,
) -> Vec<(f64, f64)> {
    let order = descending_order(scores);
    let mut counts = Vec::new();
    let (mut tp, mut fp) = (0.0, 0.0);

    let mut k = 0;
    while k < order.len() {
        let threshold = scores[order[k]];
        while k < order.len() && scores[order[k]] == threshold {
            let i = order[k];
            tp += y[i] * w[i];
            fp += (1.0 - y[i]) * w[i];
            k += 1;
        }
        counts.push((tp, fp));
    }
    counts
}

fn assert_same_len(y: usize, s: usize, w: usize) {
    assert!(
        y == s && s == w,
        "ranking inputs must have equal length: labels={y}, scores={s}, weights={w}"
    );
}

// NaN scores have no rank.
fn assert_no_nan(scores: ArrayView1<'_, f64>) {
    if let Some(i) = scores.iter().position(|s| s.is_nan()) {
        panic!("ranking scores must not contain NaN (first at index {i})");
    }
}

/// Weighted average precision for binary labels.
///
/// Returns NaN when the total positive weight is zero.
///
/// # Panics
///
/// Panics if the inputs differ in length or any score is NaN.
pub fn average_precision(
    y: ArrayView1<'_, f64>,
    scores: ArrayView1<'_, f64>,
    w: ArrayView1<'_, f64>,
) -> f64 {
    assert_same_len(y.len(), scores.len(), w.len());
    assert_no_nan(scores);

    let total_pos: f64 = y.iter().zip(w.iter()).map(|(y, w)| y * w).sum();
    if total_pos <= 0.0 || total_pos.is_nan() {
        return f64::NAN;
    }

    let mut ap = 0.0;
    let mut prev_recall = 0.0;
    for (tp, fp) in threshold_counts(y, scores, w) {
        let recall = tp / total_pos;
        let predicted = tp + fp;
        let precision = if predicted > 0.0 { tp / predicted } else { 0.0 };
        ap += (recall - prev_recall) * precision;
        prev_recall = recall;
    }
    ap
}

/// Expand each rate `y_i` into `n` binary labels, the first `floor(y_i * n)`
/// of them positive.
fn rates_to_binary(y: ArrayView1<'_, f64>, n: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(y.len() * n);
    for &rate in y.iter() {
        let positives = ((rate * n as f64) as usize).min(n);
        out.extend((0..n).map(|j| if j < positives { 1.0 } else { 0.0 }));
    }
    out
}

/// Repeat each value `n` times.
fn tile(x: ArrayView1<'_, f64>, n: usize) -> Vec<f64> {
    x.iter()
        .flat_map(|&v| std::iter::repeat(v).take(n))
        .collect()
}

/// Average precision normalized by the best achievable under perfect ranking.
///
/// Each sample's true rate `y_i` and score `s_i` are tiled into `n` binary
/// pseudo-observations so probability-valued labels can be ranked. The
/// perfect ranking scores every pseudo-observation by its true rate.
///
/// Returns `0.0` whenever the ratio is undefined (no positive weight, all
/// weights zero); NaN never escapes.
///
/// # Panics
///
/// Panics if `n` is zero, the inputs differ in length or any score is NaN.
pub fn avg_prc(
    y: ArrayView1<'_, f64>,
    scores: ArrayView1<'_, f64>,
    w: ArrayView1<'_, f64>,
    n: usize,
) -> f64 {
    assert!(n > 0, "avg_prc needs at least one pseudo-observation per sample");
    assert_same_len(y.len(), scores.len(), w.len());
    assert_no_nan(scores);

    let labels = rates_to_binary(y, n);
    let optimal_scores = tile(y, n);
    let scores = tile(scores, n);
    let weights = tile(w, n);

    let labels = ArrayView1::from(&labels);
    let weights = ArrayView1::from(&weights);
    let achieved = average_precision(labels, ArrayView1::from(&scores), weights);
    let optimal = average_precision(labels, ArrayView1::from(&optimal_scores), weights);

    let ratio = achieved / optimal;
    if ratio.is_nan() {
        0.0
    } else {
        ratio
    }
}

/// Weighted area under the ROC curve (trapezoidal, ties averaged).
///
/// Returns NaN when either class has zero total weight.
pub fn roc_auc(y: ArrayView1<'_, f64>, scores: ArrayView1<'_, f64>, w: ArrayView1<'_, f64>) -> f64 {
    assert_same_len(y.len(), scores.len(), w.len());
    assert_no_nan(scores);

    let total_pos: f64 = y.iter().zip(w.iter()).map(|(y, w)| y * w).sum();
    let total_neg: f64 = y.iter().zip(w.iter()).map(|(y, w)| (1.0 - y) * w).sum();
    if total_pos <= 0.0 || total_neg <= 0.0 {
        return f64::NAN;
    }

    let mut area = 0.0;
    let (mut prev_tp, mut prev_fp) = (0.0, 0.0);
    for (tp, fp) in threshold_counts(y, scores, w) {
        area += (fp - prev_fp) * (tp + prev_tp) / 2.0;
        prev_tp = tp;
        prev_fp = fp;
    }
    area / (total_pos * total_neg)
}

/// Unweighted `(average precision, ROC AUC, Brier)` for `[n, 2]` arrays.
///
/// One-hot labels are scored column by column and macro-averaged over both
/// classes; Brier is the mean over every cell. If any label row is soft,
/// labels are hardened by argmax and only the positive-class column is
/// scored.
pub fn classification_score(probs: ArrayView2<'_, f64>, y: ArrayView2<'_, f64>) -> (f64, f64, f64) {
    assert_eq!(probs.dim(), y.dim(), "probs and labels differ in shape");

    let ones = vec![1.0; y.nrows()];
    let ones = ArrayView1::from(&ones);
    let is_hard = y.column(0).iter().all(|&v| v == 0.0 || v == 1.0);

    if is_hard {
        let n_classes = y.ncols() as f64;
        let (mut prc_auc, mut auc) = (0.0, 0.0);
        for (labels, scores) in y.columns().into_iter().zip(probs.columns()) {
            prc_auc += average_precision(labels, scores, ones);
            auc += roc_auc(labels, scores, ones);
        }
        let diff = &probs - &y;
        let brier = diff.mapv(|d| d * d).mean().unwrap_or(f64::NAN);
        return (prc_auc / n_classes, auc / n_classes, brier);
    }

    let labels: Vec<f64> = y
        .outer_iter()
        .map(|row| if row[1] > row[0] { 1.0 } else { 0.0 })
        .collect();
    let labels = ArrayView1::from(&labels);
    let scores = probs.column(1);

    let prc_auc = average_precision(labels, scores, ones);
    let auc = roc_auc(labels, scores, ones);
    let brier = super::brier(labels, scores, ones);
    (prc_auc, auc, brier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    #[test]
    fn test_average_precision_perfect_ranking() {
        let y = array![0.0, 1.0, 0.0, 1.0];
        let s = array![0.1, 0.9, 0.2, 0.8];
        let ap = average_precision(y.view(), s.view(), Array1::ones(4).view());
        assert!((ap - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_average_precision_known_value() {
        // Ranking: pos, neg, pos -> P@1 = 1, P@3 = 2/3 -> AP = 0.5*1 + 0.5*2/3
        let y = array![1.0, 0.0, 1.0];
        let s = array![0.9, 0.5, 0.1];
        let ap = average_precision(y.view(), s.view(), Array1::ones(3).view());
        assert!((ap - (0.5 + 1.0 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_average_precision_ties_share_threshold() {
        // All tied: single threshold, precision = base rate.
        let y = array![1.0, 0.0, 0.0, 0.0];
        let s = array![0.5, 0.5, 0.5, 0.5];
        let ap = average_precision(y.view(), s.view(), Array1::ones(4).view());
        assert!((ap - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_average_precision_weighted() {
        // Doubling the weight of the negative ranked first lowers P@2.
        let y = array![0.0, 1.0];
        let s = array![0.9, 0.1];
        let ap = average_precision(y.view(), s.view(), array![2.0, 1.0].view());
        assert!((ap - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_average_precision_no_positives_is_nan() {
        let ap = average_precision(
            array![0.0, 0.0].view(),
            array![0.3, 0.4].view(),
            array![1.0, 1.0].view(),
        );
        assert!(ap.is_nan());
    }

    #[test]
    fn test_avg_prc_zero_weights_returns_zero() {
        let v = avg_prc(
            array![1.0, 0.0, 1.0].view(),
            array![0.7, 0.2, 0.4].view(),
            Array1::zeros(3).view(),
            1,
        );
        assert_eq!(v, 0.0);
    }

    #[test]
    fn test_avg_prc_normalizes_soft_labels() {
        let y = array![0.5, 0.0, 0.25];
        // Scores ordered like the true rates reach the ceiling.
        let v = avg_prc(y.view(), array![0.6, 0.1, 0.3].view(), Array1::ones(3).view(), 4);
        assert!((v - 1.0).abs() < 1e-12);

        // Reversed ranking falls below it.
        let v = avg_prc(y.view(), array![0.1, 0.6, 0.3].view(), Array1::ones(3).view(), 4);
        assert!(v < 1.0 && v > 0.0);
    }

    #[test]
    fn test_rates_to_binary_truncates() {
        let b = rates_to_binary(array![0.5, 0.99, 1.0].view(), 2);
        assert_eq!(b, vec![1.0, 0.0, 1.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_roc_auc() {
        let ones = Array1::ones(4);
        let partial = roc_auc(
            array![0.0, 0.0, 1.0, 1.0].view(),
            array![0.1, 0.4, 0.35, 0.8].view(),
            ones.view(),
        );
        assert!((partial - 0.75).abs() < 1e-12);

        let tied = roc_auc(
            array![0.0, 1.0].view(),
            array![0.5, 0.5].view(),
            array![1.0, 1.0].view(),
        );
        assert!((tied - 0.5).abs() < 1e-12);
        assert!(roc_auc(array![1.0].view(), array![0.5].view(), array![1.0].view()).is_nan());
    }

    #[test]
    fn test_classification_score() {
        let probs = array![[0.9, 0.1], [0.2, 0.8], [0.6, 0.4]];
        let y = array![[1.0, 0.0], [0.0, 1.0], [0.3, 0.7]];
        let (prc, auc, brier) = classification_score(probs.view(), y.view());
        // Positives (rows 1, 2) outrank the negative (row 0).
        assert!((prc - 1.0).abs() < 1e-12);
        assert!((auc - 1.0).abs() < 1e-12);
        let expected = (0.01 + 0.04 + 0.36) / 3.0;
        assert!((brier - expected).abs() < 1e-12);
    }

    #[test]
    fn test_classification_score_hard_labels_macro_average() {
        let probs = array![[0.3, 0.7], [0.8, 0.2], [0.6, 0.4]];
        let y = array![[1.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let (prc, auc, brier) = classification_score(probs.view(), y.view());
        // Positive column AP = 1/2, negative column AP = 5/6.
        assert!((prc - 2.0 / 3.0).abs() < 1e-12);
        assert!((auc - 0.5).abs() < 1e-12);
        assert!((brier - 1.78 / 6.0).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "NaN")]
    fn test_average_precision_nan_score_panics() {
        average_precision(
            array![1.0, 0.0, 1.0].view(),
            array![0.9, f64::NAN, 0.2].view(),
            Array1::ones(3).view(),
        );
    }

    #[test]
    #[should_panic(expected = "NaN")]
    fn test_avg_prc_nan_score_panics() {
        avg_prc(
            array![1.0, 0.0, 1.0].view(),
            array![0.9, f64::NAN, 0.2].view(),
            Array1::ones(3).view(),
            1,
        );
    }

    #[test]
    fn test_infinite_scores_rank_at_extremes() {
        let y = array![0.0, 1.0, 1.0];
        let s = array![f64::NEG_INFINITY, f64::INFINITY, 0.3];
        let ones = Array1::ones(3);
        assert!((average_precision(y.view(), s.view(), ones.view()) - 1.0).abs() < 1e-12);
        assert!((roc_auc(y.view(), s.view(), ones.view()) - 1.0).abs() < 1e-12);
    }
}
