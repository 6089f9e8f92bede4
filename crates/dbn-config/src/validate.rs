//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::generate::{GenerateConfig, MAX_DOMAIN_TOKEN};
use crate::learn::LearnConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Validate a structure-learning configuration.
pub fn validate_learn(config: &LearnConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    if config.markov_lag == 0 {
        return Err(invalid("markov_lag", "Must be at least 1"));
    }

    let em = &config.em;
    if em.max_completions_per_subject == 0 {
        return Err(invalid("em.max_completions_per_subject", "Must be at least 1"));
    }
    if !(em.tolerance > 0.0 && em.tolerance < 1.0) {
        return Err(invalid(
            "em.tolerance",
            format!("Must be in (0, 1), got {}", em.tolerance),
        ));
    }
    if em.max_iterations == 0 {
        return Err(invalid("em.max_iterations", "Must be at least 1"));
    }

    Ok(())
}

/// Validate a synthetic generation configuration.
pub fn validate_generate(config: &GenerateConfig) -> ValidationResult<()> {
    if config.num_attributes == 0 {
        return Err(invalid("num_attributes", "Must be at least 1"));
    }
    if config.domain_size < 2 || config.domain_size > MAX_DOMAIN_TOKEN {
        return Err(invalid(
            "domain_size",
            format!(
                "Must be in [2, {}], got {}",
                MAX_DOMAIN_TOKEN, config.domain_size
            ),
        ));
    }
    if config.num_subjects == 0 {
        return Err(invalid("num_subjects", "Must be at least 1"));
    }
    if config.num_transitions == 0 {
        return Err(invalid("num_transitions", "Must be at least 1"));
    }
    if config.markov_lag == 0 {
        return Err(invalid("markov_lag", "Must be at least 1"));
    }
    if config.max_parents > config.num_attributes * config.markov_lag {
        return Err(ValidationError::SemanticError(format!(
            "max_parents ({}) exceeds the number of past slots ({})",
            config.max_parents,
            config.num_attributes * config.markov_lag
        )));
    }
    Ok(())
}
