//! DBN learning configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for structure learning and synthetic generation
//! - Config resolution (explicit path → env → XDG → defaults)
//! - Semantic validation
//! - Named presets for common search setups

pub mod generate;
pub mod learn;
pub mod preset;
pub mod resolve;
pub mod validate;

pub use generate::{GenerateConfig, MAX_DOMAIN_TOKEN};
pub use learn::{EmConfig, LearnConfig, ScoringKind, StructureMode};
pub use preset::{get_preset, list_presets, PresetName};
pub use resolve::{load_learn_config, resolve_config, ConfigPath, ConfigSource};
pub use validate::{ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
