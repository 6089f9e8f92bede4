//! Dynamic Bayesian Network Core Library
//!
//! This library provides structure learning and sampling for discrete
//! dynamic Bayesian networks:
//! - Attribute domains and windowed, weighted observation datasets
//! - Decomposable scoring (log-likelihood, MDL, random)
//! - Parallel parent-set search and maximum branching over same-slice edges
//! - Tree-augmented, bcDBN and cDBN structures
//! - CPT estimation, parameter and structural EM, missing-data completion
//! - Ancestral sampling, forecasting and synthetic model generation
//!
//! No binary entry point is shipped; the crate is driven through [`learn`]
//! and [`generate`] or the lower-level types.

pub mod attribute;
pub mod branching;
pub mod completion;
pub mod configuration;
pub mod error;
pub mod learn;
pub mod logging;
pub mod network;
pub mod observations;
pub mod scores;
pub mod scoring;

pub use attribute::{AttributeDomain, AttributeKind};
pub use branching::{Edge, OptimumBranching};
pub use completion::{fill_missing_values, impute_missing_values};
pub use configuration::{Configuration, LocalConfiguration};
pub use error::{DbnError, Result};
pub use learn::{generate, learn, random_domains, LearnOutcome};
pub use network::{BayesNet, DbnExport, DynamicBayesNet, EmSummary, StructureComparison};
pub use observations::{Dataset, SufficientStatistics};
pub use scores::ScoreSearch;
pub use scoring::{scoring_function, Ll, Mdl, RandomScore, ScoringFunction};
