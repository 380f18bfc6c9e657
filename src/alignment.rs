//! Feature-axis reconciliation between two domains.
//!
//! The source and target domains are usually produced by different
//! collection setups, so their feature columns differ in both order and
//! membership. Before any statistics are computed the source bundle is
//! reordered and subsetted so that its feature axis matches the target's
//! exactly:
//!
//! ```text
//! source: [a, b, c]       target: [b, a]
//!            │  │                    │  │
//!            └──┼──────────────┐     │  │
//!               └───────────┐  │     │  │
//! aligned source:          [b, a]  ==  [b, a]
//! ```
//!
//! Any target feature missing from the source is a configuration error:
//! silently dropping it would corrupt downstream normalization statistics.
//!
//! The module also carries the two dataset subselection passes used when
//! curating a domain: dropping constant features and keeping only samples
//! drawn from a proposal distribution.

use crate::dataset::DatasetBundle;
use crate::error::{PipelineError, Result};
use ndarray::{s, Axis};

/// Index into `source_names` for each name in `target_names`, in target order.
///
/// The first exact match wins when the source repeats a name.
pub fn feature_indices(source_names: &[String], target_names: &[String]) -> Result<Vec<usize>> {
    target_names
        .iter()
        .map(|name| {
            source_names
                .iter()
                .position(|src| src == name)
                .ok_or_else(|| {
                    PipelineError::configuration(format!(
                        "target feature '{name}' has no counterpart in source features"
                    ))
                })
        })
        .collect()
}

/// Reorder and subset `src` features to match `tgt` feature order.
///
/// # Errors
///
/// [`PipelineError::Configuration`] if the target names differ or a target
/// feature is absent from the source.
pub fn align_features(src: &DatasetBundle, tgt: &DatasetBundle) -> Result<DatasetBundle> {
    if src.target_name() != tgt.target_name() {
        return Err(PipelineError::configuration(format!(
            "domains predict different targets: source '{}' vs target '{}'",
            src.target_name(),
            tgt.target_name()
        )));
    }

    let indices = feature_indices(src.feature_names(), tgt.feature_names())?;
    let aligned = src.select_features(&indices);

    debug_assert_eq!(aligned.feature_names(), tgt.feature_names());
    log::debug!(
        "Aligned source features: kept {} of {}, dropped {}",
        indices.len(),
        src.n_features(),
        src.n_features() - indices.len()
    );

    Ok(aligned)
}

/// Keep features whose peak-to-peak range over the first `check_size`
/// samples exceeds `eps`.
///
/// Returns the filtered bundle and the indices of the kept features.
pub fn select_nonconstant_features(
    bundle: &DatasetBundle,
    check_size: usize,
    eps: f64,
) -> (DatasetBundle, Vec<usize>) {
    let n = check_size.min(bundle.len());
    let window = bundle.features().slice_move(s![..n, .., ..]);

    let keep: Vec<usize> = (0..bundle.n_features())
        .filter(|&f| {
            let column = window.index_axis(Axis(2), f);
            let (lo, hi) = column
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                });
            hi - lo > eps
        })
        .collect();

    if keep.len() < bundle.n_features() {
        let dropped: Vec<&str> = (0..bundle.n_features())
            .filter(|f| !keep.contains(f))
            .map(|f| bundle.feature_names()[f].as_str())
            .collect();
        log::info!("Dropping {} constant features: {:?}", dropped.len(), dropped);
    }

    (bundle.select_features(&keep), keep)
}

/// Keep samples whose importance weight is not exactly 1.
///
/// Samples drawn from a proposal distribution carry a likelihood-ratio
/// weight; samples with weight 1 came from the nominal distribution.
pub fn select_proposal_samples(bundle: &DatasetBundle) -> DatasetBundle {
    let indices: Vec<usize> = bundle
        .weight()
        .iter()
        .enumerate()
        .filter(|&(_, &w)| w != 1.0)
        .map(|(i, _)| i)
        .collect();
    log::debug!(
        "Selected {} proposal samples of {}",
        indices.len(),
        bundle.len()
    );
    bundle.select_samples(&indices)
}
