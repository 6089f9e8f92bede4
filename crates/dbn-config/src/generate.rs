//! Synthetic network and time-series generation settings.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::validate::{ValidationError, ValidationResult};

/// Largest value token drawn for a synthetic numeric domain.
pub const MAX_DOMAIN_TOKEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Variables per slice.
    pub num_attributes: usize,

    /// Distinct values per variable, drawn from `1..=MAX_DOMAIN_TOKEN`.
    pub domain_size: usize,

    /// Subjects (independent time series) to sample.
    pub num_subjects: usize,

    /// Transitions sampled per subject.
    pub num_transitions: usize,

    pub markov_lag: usize,

    /// Past parents per node in the random structure.
    pub max_parents: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            num_attributes: 5,
            domain_size: 2,
            num_subjects: 100,
            num_transitions: 10,
            markov_lag: 1,
            max_parents: 1,
            seed: None,
        }
    }
}

impl GenerateConfig {
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e))),
            _ => toml::from_str(&content)
                .map_err(|e| ValidationError::ParseError(format!("Invalid TOML: {}", e))),
        }
    }

    pub fn validate(&self) -> ValidationResult<()> {
        crate::validate::validate_generate(self)
    }
}
