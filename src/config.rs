//! Engine configuration.
//!
//! [EngineConfig] can be built in code (starting from [Default]) or deserialized
//! from JSON; missing fields fall back to their defaults.
//!
//! # Example
//! ```
//! use prunewick::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "underflow_threshold": 1e-50 }"#).unwrap();
//! assert_eq!(config.underflow_threshold, 1e-50);
//! assert!(!config.zero_based_tips);
//! ```

use crate::error::PruneError;
use serde::{Deserialize, Serialize};

/// Threshold below which a pattern's CLA block gets rescaled.
pub const DEFAULT_UNDERFLOW_THRESHOLD: f64 = 1e-100;

/// Smallest edge length handed to the substitution model.
pub const DEFAULT_MIN_EDGE_LENGTH: f64 = 1e-8;

/// Edge length assigned when a Newick string carries none.
pub const DEFAULT_EDGE_LENGTH: f64 = 0.1;

/// Settings of a [TreeLikelihood](crate::likelihood::TreeLikelihood) and the
/// Newick reader feeding it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rescaling threshold `C`; a protected pattern whose largest CLA entry drops
    /// below it is multiplied by `1/C`.
    pub underflow_threshold: f64,
    /// Floor applied to edge lengths before computing transition matrices.
    pub min_edge_length: f64,
    /// Whether integer tip names in Newick strings already start at 0.
    pub zero_based_tips: bool,
    /// Edge length used for edges without explicit length.
    pub default_edge_length: f64,
    /// Keep per-pattern site log-likelihoods of the last evaluation.
    pub store_site_likelihoods: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            underflow_threshold: DEFAULT_UNDERFLOW_THRESHOLD,
            min_edge_length: DEFAULT_MIN_EDGE_LENGTH,
            zero_based_tips: false,
            default_edge_length: DEFAULT_EDGE_LENGTH,
            store_site_likelihoods: true,
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from JSON, then validates it.
    pub fn from_json_str(json: &str) -> Result<Self, PruneError> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| PruneError::dimension(format!("invalid engine configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the underflow threshold.
    pub fn with_underflow_threshold(mut self, threshold: f64) -> Self {
        self.underflow_threshold = threshold;
        self
    }

    /// Sets whether integer tip names are zero-based.
    pub fn with_zero_based_tips(mut self, zero_based: bool) -> Self {
        self.zero_based_tips = zero_based;
        self
    }

    /// Checks that all numeric settings are usable.
    ///
    /// The threshold must lie strictly between 0 and 1, and the edge-length
    /// settings must be positive and finite.
    pub fn validate(&self) -> Result<(), PruneError> {
        let threshold = self.underflow_threshold;
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(PruneError::dimension(format!(
                "underflow threshold must lie in (0, 1), got {threshold}"
            )));
        }
        if !(self.min_edge_length > 0.0 && self.min_edge_length.is_finite()) {
            return Err(PruneError::dimension(format!(
                "minimum edge length must be positive, got {}",
                self.min_edge_length
            )));
        }
        if !(self.default_edge_length >= 0.0 && self.default_edge_length.is_finite()) {
            return Err(PruneError::dimension(format!(
                "default edge length must be non-negative, got {}",
                self.default_edge_length
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn json_overrides_only_given_fields() {
        let config = EngineConfig::from_json_str(r#"{ "zero_based_tips": true }"#).unwrap();
        assert!(config.zero_based_tips);
        assert_eq!(config.underflow_threshold, DEFAULT_UNDERFLOW_THRESHOLD);
        assert_eq!(config.default_edge_length, DEFAULT_EDGE_LENGTH);
    }

    #[test]
    fn rejects_threshold_outside_unit_interval() {
        let err = EngineConfig::from_json_str(r#"{ "underflow_threshold": 2.0 }"#).unwrap_err();
        assert!(err.is_dimension());
        assert!(EngineConfig::default().with_underflow_threshold(0.0).validate().is_err());
    }

    #[test]
    fn serializes_round_trip() {
        let config = EngineConfig::default().with_zero_based_tips(true);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(EngineConfig::from_json_str(&json).unwrap(), config);
    }
}
