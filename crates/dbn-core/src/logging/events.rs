//! Pipeline stages and stable event names used as tracing fields.

use serde::{Deserialize, Serialize};

/// Processing stages in the learning pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Configuration and dataset checks.
    Init,
    /// Parent-set scoring.
    Score,
    /// Maximum branching over same-slice edges.
    Branch,
    /// CPT estimation and parameter EM.
    Estimate,
    /// Missing-data completion.
    Complete,
    /// Ancestral sampling and forecasting.
    Sample,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Score => "score",
            Stage::Branch => "branch",
            Stage::Estimate => "estimate",
            Stage::Complete => "complete",
            Stage::Sample => "sample",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    pub const LEARN_STARTED: &str = "learn.started";
    pub const LEARN_FINISHED: &str = "learn.finished";

    pub const SCORE_STARTED: &str = "score.started";
    pub const SCORE_FINISHED: &str = "score.finished";

    pub const BRANCH_BUILT: &str = "branch.built";

    pub const ESTIMATE_CPT: &str = "estimate.cpt";
    pub const ESTIMATE_EM_STEP: &str = "estimate.em_step";
    pub const STRUCTURAL_EM_STEP: &str = "estimate.structural_em_step";

    pub const COMPLETE_FILLED: &str = "complete.filled";
    pub const COMPLETE_IMPUTED: &str = "complete.imputed";

    pub const SAMPLE_GENERATED: &str = "sample.generated";
}
