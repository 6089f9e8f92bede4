//! Structure-learning configuration types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::validate::{ValidationError, ValidationResult};

/// Local score used to rank parent sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringKind {
    /// Log-likelihood.
    Ll,
    /// Minimum description length (log-likelihood minus a complexity penalty).
    #[default]
    Mdl,
    /// Uniform noise; used to seed structural EM and synthetic networks.
    Random,
}

impl ScoringKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringKind::Ll => "ll",
            ScoringKind::Mdl => "mdl",
            ScoringKind::Random => "random",
        }
    }
}

impl fmt::Display for ScoringKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ScoringKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ll" | "loglikelihood" | "log-likelihood" => Ok(ScoringKind::Ll),
            "mdl" => Ok(ScoringKind::Mdl),
            "random" => Ok(ScoringKind::Random),
            _ => Err(ValidationError::InvalidValue {
                field: "scoring".to_string(),
                message: format!("unknown scoring function '{}'", s),
            }),
        }
    }
}

/// How same-slice edges are chosen from the score matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureMode {
    /// Maximum branching: at most one same-slice parent per node.
    #[default]
    Tree,
    /// Breadth-first chain of the branching as ancestor pool, in-degree ≤ k.
    Bcdbn,
    /// Branching ancestors as ancestor pool, in-degree ≤ k.
    Cdbn,
}

impl StructureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StructureMode::Tree => "tree",
            StructureMode::Bcdbn => "bcdbn",
            StructureMode::Cdbn => "cdbn",
        }
    }
}

impl fmt::Display for StructureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StructureMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tree" | "tdbn" => Ok(StructureMode::Tree),
            "bcdbn" => Ok(StructureMode::Bcdbn),
            "cdbn" => Ok(StructureMode::Cdbn),
            _ => Err(ValidationError::InvalidValue {
                field: "structure".to_string(),
                message: format!("unknown structure mode '{}'", s),
            }),
        }
    }
}

/// Missing-data completion and EM settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmConfig {
    /// Upper bound on the completions enumerated for one subject.
    pub max_completions_per_subject: usize,

    /// Relative probability below which a completion is dropped.
    pub tolerance: f64,

    /// Cap on structural EM rounds.
    pub max_iterations: usize,

    /// Hard imputation picks the MAP completion instead of sampling one.
    pub impute_most_probable: bool,
}

impl Default for EmConfig {
    fn default() -> Self {
        Self {
            max_completions_per_subject: 1 << 16,
            tolerance: 1e-5,
            max_iterations: 100,
            impute_most_probable: true,
        }
    }
}

/// Complete structure-learning configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnConfig {
    pub schema_version: String,

    /// Number of preceding slices that may influence the present one.
    pub markov_lag: usize,

    /// Upper bound on the size of past-only parent sets.
    pub max_parents: usize,

    /// One shared transition network instead of one per transition.
    pub stationary: bool,

    pub scoring: ScoringKind,

    pub structure: StructureMode,

    /// In-degree bound k for the bounded structure modes.
    pub intra_in_degree: usize,

    /// Force this node to be the branching root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<usize>,

    /// Require a spanning tree; otherwise only positive-gain edges are kept.
    pub spanning: bool,

    /// Attach an edge-free initial network for sampling first windows.
    pub prior: bool,

    /// Worker threads for score evaluation; 0 uses the rayon default.
    pub threads: usize,

    pub em: EmConfig,

    /// Seed for every random draw; unset means OS entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for LearnConfig {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            markov_lag: 1,
            max_parents: 1,
            stationary: true,
            scoring: ScoringKind::default(),
            structure: StructureMode::default(),
            intra_in_degree: 2,
            root: None,
            spanning: true,
            prior: false,
            threads: 0,
            em: EmConfig::default(),
            seed: None,
        }
    }
}

impl LearnConfig {
    /// Load from a `.toml` or `.json` file.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    /// Parse from a TOML string.
    pub fn from_toml_str(s: &str) -> ValidationResult<Self> {
        toml::from_str(s).map_err(|e| ValidationError::ParseError(format!("Invalid TOML: {}", e)))
    }

    /// Parse from a JSON string.
    pub fn from_json_str(s: &str) -> ValidationResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    pub fn to_toml_string(&self) -> ValidationResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ValidationError::ParseError(format!("Cannot encode TOML: {}", e)))
    }

    /// Semantic validation; see [`crate::validate::validate_learn`].
    pub fn validate(&self) -> ValidationResult<()> {
        crate::validate::validate_learn(self)
    }
}
