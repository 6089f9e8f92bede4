//! Configuration presets for common structure-search setups.
//!
//! Provides pre-built configurations for:
//! - Default: MDL score, one past parent, spanning tree over each slice
//! - Forest: MDL score, branching forest that only keeps positive-gain edges
//! - Bcdbn: bounded in-degree search over a breadth-first ancestor chain
//! - Cdbn: bounded in-degree search over branching ancestors

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::learn::{LearnConfig, ScoringKind, StructureMode};

/// Available configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    /// MDL, one past parent, spanning tree
    Default,
    /// MDL, one past parent, branching forest
    Forest,
    /// Bounded in-degree over the breadth-first chain
    Bcdbn,
    /// Bounded in-degree over branching ancestors
    Cdbn,
}

impl PresetName {
    /// All available preset names.
    pub const ALL: &'static [PresetName] = &[
        PresetName::Default,
        PresetName::Forest,
        PresetName::Bcdbn,
        PresetName::Cdbn,
    ];

    /// Get preset name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Default => "default",
            PresetName::Forest => "forest",
            PresetName::Bcdbn => "bcdbn",
            PresetName::Cdbn => "cdbn",
        }
    }

    /// Parse preset name from string.
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().as_str() {
            "default" | "tree" | "tdbn" => Some(PresetName::Default),
            "forest" => Some(PresetName::Forest),
            "bcdbn" => Some(PresetName::Bcdbn),
            "cdbn" => Some(PresetName::Cdbn),
            _ => None,
        }
    }

    /// Get a description of the preset.
    pub fn description(&self) -> &'static str {
        match self {
            PresetName::Default => "MDL score, one past parent, spanning tree in each slice",
            PresetName::Forest => {
                "MDL score, one past parent, branching forest of positive-gain edges"
            }
            PresetName::Bcdbn => {
                "Up to two same-slice parents drawn from the breadth-first order of the branching"
            }
            PresetName::Cdbn => "Up to two same-slice parents drawn from branching ancestors",
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| PresetError::UnknownPreset(s.to_string()))
    }
}

/// Errors related to preset operations.
#[derive(Debug, Clone)]
pub enum PresetError {
    /// Unknown preset name.
    UnknownPreset(String),
}

impl fmt::Display for PresetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetError::UnknownPreset(name) => {
                write!(
                    f,
                    "Unknown preset '{}'. Available: {}",
                    name,
                    PresetName::ALL
                        .iter()
                        .map(|p| p.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
        }
    }
}

impl std::error::Error for PresetError {}

/// Get the learning configuration for a preset.
pub fn get_preset(name: PresetName) -> LearnConfig {
    let base = LearnConfig {
        scoring: ScoringKind::Mdl,
        max_parents: 1,
        ..LearnConfig::default()
    };
    match name {
        PresetName::Default => base,
        PresetName::Forest => LearnConfig {
            spanning: false,
            ..base
        },
        PresetName::Bcdbn => LearnConfig {
            structure: StructureMode::Bcdbn,
            intra_in_degree: 2,
            ..base
        },
        PresetName::Cdbn => LearnConfig {
            structure: StructureMode::Cdbn,
            intra_in_degree: 2,
            ..base
        },
    }
}

/// Summary of a preset for listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetInfo {
    pub name: String,
    pub description: String,
    pub scoring: ScoringKind,
    pub structure: StructureMode,
    pub spanning: bool,
    pub intra_in_degree: usize,
}

impl PresetInfo {
    /// Create info from a preset.
    pub fn from_preset(name: PresetName) -> Self {
        let config = get_preset(name);
        Self {
            name: name.as_str().to_string(),
            description: name.description().to_string(),
            scoring: config.scoring,
            structure: config.structure,
            spanning: config.spanning,
            intra_in_degree: config.intra_in_degree,
        }
    }
}

/// List all available presets with their info.
pub fn list_presets() -> Vec<PresetInfo> {
    PresetName::ALL
        .iter()
        .map(|&name| PresetInfo::from_preset(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_name_parsing() {
        assert_eq!(PresetName::parse("default"), Some(PresetName::Default));
        assert_eq!(PresetName::parse("TREE"), Some(PresetName::Default));
        assert_eq!(PresetName::parse("forest"), Some(PresetName::Forest));
        assert_eq!(PresetName::parse("bcdbn"), Some(PresetName::Bcdbn));
        assert_eq!(PresetName::parse("cdbn"), Some(PresetName::Cdbn));
        assert_eq!(PresetName::parse("unknown"), None);
    }

    #[test]
    fn test_presets_validate() {
        for &name in PresetName::ALL {
            let config = get_preset(name);
            assert!(config.validate().is_ok(), "{} should be valid", name);
        }
    }

    #[test]
    fn test_bounded_presets_use_bounded_modes() {
        assert_eq!(get_preset(PresetName::Bcdbn).structure, StructureMode::Bcdbn);
        assert_eq!(get_preset(PresetName::Cdbn).structure, StructureMode::Cdbn);
        assert!(!get_preset(PresetName::Forest).spanning);
        assert!(get_preset(PresetName::Default).spanning);
    }

    #[test]
    fn test_list_presets() {
        let presets = list_presets();
        assert_eq!(presets.len(), 4);
        assert!(presets.iter().any(|p| p.name == "default"));
        assert!(presets.iter().any(|p| p.name == "cdbn" && p.intra_in_degree == 2));
    }

    #[test]
    fn test_preset_error_display() {
        let err: PresetError = "nope".parse::<PresetName>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("nope"));
        assert!(msg.contains("bcdbn"));
    }
}
