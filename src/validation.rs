//! Dataset Validation Module
//!
//! Sanity checks run on loader output before it enters the pipeline, so
//! corrupt values are caught here instead of surfacing as NaN losses during
//! training.
//!
//! # Validation Categories
//!
//! 1. **Feature Ranges**: NaN/Inf detection (error)
//! 2. **Weights**: negative or non-finite importance weights (error)
//! 3. **Targets**: rows that do not sum to one (warning)
//! 4. **Constant Features**: zero-range columns in train (warning); these
//!    normalize to zero and carry no signal
//!
//! # Usage
//!
//! ```ignore
//! use domain_adaptation_data::validation::BundleValidator;
//!
//! let validator = BundleValidator::default();
//! let result = validator.validate_bundle(&bundle);
//!
//! if !result.is_valid() {
//!     for warning in result.warnings() {
//!         println!("Warning: {}", warning);
//!     }
//! }
//! ```

use crate::dataset::{DatasetBundle, SplitBundle};
use crate::error::{PipelineError, Result};
use ndarray::Axis;
use std::fmt;

/// Validation result for a single check.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    /// Data is valid
    Valid,
    /// Data has minor issues (warnings)
    Warning(String),
    /// Data has serious issues (errors)
    Error(String),
}

impl ValidationLevel {
    /// Check if this result indicates valid data.
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationLevel::Valid)
    }

    /// Check if this result is a warning.
    pub fn is_warning(&self) -> bool {
        matches!(self, ValidationLevel::Warning(_))
    }

    /// Check if this result is an error.
    pub fn is_error(&self) -> bool {
        matches!(self, ValidationLevel::Error(_))
    }
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationLevel::Valid => write!(f, "Valid"),
            ValidationLevel::Warning(msg) => write!(f, "Warning: {msg}"),
            ValidationLevel::Error(msg) => write!(f, "Error: {msg}"),
        }
    }
}

/// Aggregated validation result.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    results: Vec<(String, ValidationLevel)>,
}

impl ValidationResult {
    /// Create a new empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validation result.
    pub fn add(&mut self, check_name: &str, level: ValidationLevel) {
        self.results.push((check_name.to_string(), level));
    }

    /// Append every check of `other`, prefixing its names with `scope`.
    pub fn merge(&mut self, scope: &str, other: ValidationResult) {
        for (name, level) in other.results {
            self.results.push((format!("{scope}.{name}"), level));
        }
    }

    /// Check if all validations passed (no errors or warnings).
    pub fn is_valid(&self) -> bool {
        self.results.iter().all(|(_, level)| level.is_valid())
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.results.iter().any(|(_, level)| level.is_error())
    }

    /// Check if there are any warnings.
    pub fn has_warnings(&self) -> bool {
        self.results.iter().any(|(_, level)| level.is_warning())
    }

    /// Get all warnings as `check: message`.
    pub fn warnings(&self) -> Vec<String> {
        self.results
            .iter()
            .filter_map(|(name, level)| match level {
                ValidationLevel::Warning(msg) => Some(format!("{name}: {msg}")),
                _ => None,
            })
            .collect()
    }

    /// Get all errors as `check: message`.
    pub fn errors(&self) -> Vec<String> {
        self.results
            .iter()
            .filter_map(|(name, level)| match level {
                ValidationLevel::Error(msg) => Some(format!("{name}: {msg}")),
                _ => None,
            })
            .collect()
    }

    /// Get all results.
    pub fn all_results(&self) -> &[(String, ValidationLevel)] {
        &self.results
    }

    /// Get the number of checks performed.
    pub fn check_count(&self) -> usize {
        self.results.len()
    }

    /// Get the number of passed checks.
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|(_, l)| l.is_valid()).count()
    }

    /// Log warnings and turn errors into a [`PipelineError::DataShape`].
    pub fn into_result(self, context: &str) -> Result<()> {
        for warning in self.warnings() {
            log::warn!("{context}: {warning}");
        }
        if self.has_errors() {
            let errors = self.errors();
            log::error!("{context}: {} validation error(s)", errors.len());
            return Err(PipelineError::data_shape(format!(
                "{context} failed validation: {}",
                errors.join("; ")
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let passed = self.passed_count();
        let total = self.check_count();
        writeln!(f, "Validation: {passed}/{total} checks passed")?;

        for (name, level) in &self.results {
            if !level.is_valid() {
                writeln!(f, "  - {name}: {level}")?;
            }
        }

        Ok(())
    }
}

/// Configuration for bundle validation.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Check for NaN/Inf feature values
    pub check_nan_inf: bool,

    /// Check that weights are finite and non-negative
    pub check_weights: bool,

    /// Allowed deviation of a target row sum from 1 (`None` disables)
    pub target_sum_tolerance: Option<f64>,

    /// Range at or below which a train feature counts as constant
    /// (`None` disables)
    pub constant_feature_eps: Option<f64>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            check_nan_inf: true,
            check_weights: true,
            target_sum_tolerance: Some(1e-6),
            constant_feature_eps: Some(1e-8),
        }
    }
}

/// Validator for dataset bundles.
#[derive(Debug, Clone, Default)]
pub struct BundleValidator {
    config: ValidationConfig,
}

impl BundleValidator {
    /// Create a new validator with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validator with custom configuration.
    pub fn with_config(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate the value checks that apply to any bundle.
    pub fn validate_bundle(&self, bundle: &DatasetBundle) -> ValidationResult {
        let mut result = ValidationResult::new();

        if self.config.check_nan_inf {
            self.validate_feature_values(bundle, &mut result);
        }

        if self.config.check_weights {
            self.validate_weights(bundle, &mut result);
        }

        if let Some(tol) = self.config.target_sum_tolerance {
            self.validate_target_rows(bundle, tol, &mut result);
        }

        result
    }

    /// Validate every partition, plus constant-feature detection on train.
    pub fn validate_split(&self, split: &SplitBundle) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.merge("train", self.validate_bundle(&split.train));
        result.merge("val", self.validate_bundle(&split.val));
        result.merge("test", self.validate_bundle(&split.test));

        if let Some(eps) = self.config.constant_feature_eps {
            let mut train = ValidationResult::new();
            self.validate_constant_features(&split.train, eps, &mut train);
            result.merge("train", train);
        }

        result
    }

    fn validate_feature_values(&self, bundle: &DatasetBundle, result: &mut ValidationResult) {
        let features = bundle.features();
        let nan = features.iter().filter(|v| v.is_nan()).count();
        let inf = features.iter().filter(|v| v.is_infinite()).count();

        if nan > 0 || inf > 0 {
            result.add(
                "nan_inf_check",
                ValidationLevel::Error(format!("{nan} NaN and {inf} infinite feature values")),
            );
        } else {
            result.add("nan_inf_check", ValidationLevel::Valid);
        }
    }

    fn validate_weights(&self, bundle: &DatasetBundle, result: &mut ValidationResult) {
        let bad = bundle
            .weight()
            .iter()
            .filter(|w| !w.is_finite() || **w < 0.0)
            .count();

        if bad > 0 {
            result.add(
                "weights",
                ValidationLevel::Error(format!("{bad} negative or non-finite weights")),
            );
        } else {
            result.add("weights", ValidationLevel::Valid);
        }
    }

    fn validate_target_rows(&self, bundle: &DatasetBundle, tol: f64, result: &mut ValidationResult) {
        let sums = bundle.target().sum_axis(Axis(1));
        let off = sums.iter().filter(|s| (**s - 1.0).abs() > tol).count();

        if off > 0 {
            result.add(
                "target_rows",
                ValidationLevel::Warning(format!("{off} target rows do not sum to 1")),
            );
        } else {
            result.add("target_rows", ValidationLevel::Valid);
        }
    }

    fn validate_constant_features(&self, bundle: &DatasetBundle, eps: f64, result: &mut ValidationResult) {
        if bundle.is_empty() {
            return;
        }

        let features = bundle.features();
        let constant: Vec<&str> = (0..bundle.n_features())
            .filter(|&j| {
                let column = features.index_axis(Axis(2), j);
                let (lo, hi) = column
                    .iter()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                        (lo.min(v), hi.max(v))
                    });
                hi - lo <= eps
            })
            .map(|j| bundle.feature_names()[j].as_str())
            .collect();

        if constant.is_empty() {
            result.add("constant_features", ValidationLevel::Valid);
        } else {
            result.add(
                "constant_features",
                ValidationLevel::Warning(format!("constant features: {}", constant.join(", "))),
            );
        }
    }
}
