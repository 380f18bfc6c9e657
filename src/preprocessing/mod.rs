//! Dataset preprocessing applied after splitting.
//!
//! - **Normalization**: Scale features with train-only statistics
//!   - Individual (per domain)
//!   - Composite (count-weighted pooling across both domains)
//!
//! - **Sampling**: Reshape target-domain train labels
//!   - Stochastic binarization of soft `[1-p, p]` labels
//!   - Positive-bounded and size-bounded prefix subsetting
//!
//! # Example
//!
//! ```ignore
//! use domain_adaptation_data::preprocessing::{binarize_targets, normalize, NormalizeMode};
//!
//! binarize_targets(&mut target.train, &mut rng)?;
//! normalize(&mut source, &mut target, NormalizeMode::Composite)?;
//! ```

pub mod normalization;
pub mod sampling;

// Re-export commonly used types for convenience
pub use normalization::{
    normalize, normalize_composite, normalize_individual, NormalizationStats, NormalizeMode,
};
pub use sampling::{binarize_targets, subselect_positive, subselect_train, LabelStats};
