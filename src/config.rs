//! Explicit configuration passed into combine/select entry points.

use serde::{Deserialize, Serialize};

use crate::error::{DfmError, DfmResult};

/// Options read by the combiner and the selector.
///
/// There is no process-wide state: every entry point receives a `DfmConfig`.
///
/// ```toml
/// generated_prefix = "feat"
/// verbose = true
/// parallel_threshold = 50000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DfmConfig {
    /// Prefix marking internally generated placeholder feature names
    pub generated_prefix: String,
    /// Default verbosity when a call does not set its own
    pub verbose: bool,
    /// Non-zero count above which sparse primitives map rows in parallel
    pub parallel_threshold: usize,
}

impl Default for DfmConfig {
    fn default() -> Self {
        Self {
            generated_prefix: "feat".to_string(),
            verbose: false,
            parallel_threshold: 100_000,
        }
    }
}

impl DfmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> DfmResult<Self> {
        toml::from_str(content).map_err(|e| DfmError::Config {
            message: e.to_string(),
        })
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.generated_prefix = prefix.into();
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_partial_keeps_defaults() {
        let cfg = DfmConfig::from_toml_str("verbose = true").unwrap();
        assert!(cfg.verbose);
        assert_eq!(cfg.generated_prefix, "feat");
        assert_eq!(cfg.parallel_threshold, 100_000);
    }

    #[test]
    fn toml_rejects_wrong_type() {
        let res = DfmConfig::from_toml_str("parallel_threshold = \"many\"");
        assert!(matches!(res, Err(DfmError::Config { .. })));
    }

    #[test]
    fn json_roundtrip() {
        let cfg = DfmConfig::new().with_prefix("gen").with_parallel_threshold(8);
        let s = serde_json::to_string(&cfg).unwrap();
        let de: DfmConfig = serde_json::from_str(&s).unwrap();
        assert_eq!(de, cfg);
    }
}
