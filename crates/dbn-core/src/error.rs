//! Error types for DBN learning and sampling.
//!
//! Every precondition violation surfaces as a distinct variant; data sparsity
//! is never an error (unseen parent combinations fall back to uniform CPTs).

use thiserror::Error;

/// Result type alias for DBN operations.
pub type Result<T> = std::result::Result<T, DbnError>;

#[derive(Error, Debug)]
pub enum DbnError {
    #[error("scores must be evaluated before being converted to a network")]
    NotEvaluated,

    #[error("node {node} out of range for {num_nodes} nodes")]
    NodeOutOfRange { node: usize, num_nodes: usize },

    #[error("attribute mismatch: {0}")]
    AttributeMismatch(String),

    #[error("stationary process requires exactly one transition network, found {0}")]
    StationaryMultipleNets(usize),

    #[error("network defines {available} transitions, cannot generate {requested}")]
    TooManyTransitions { requested: usize, available: usize },

    #[error("sampling without seed observations requires an initial network")]
    MissingInitialNet,

    #[error("same-slice edges form a cycle through node {node}")]
    CyclicStructure { node: usize },

    #[error("{networks} transition networks cannot be learned from {transitions} transitions")]
    TransitionCountMismatch { networks: usize, transitions: usize },

    #[error("invalid weight {weight} at transition {transition}, row {row}")]
    InvalidWeight {
        transition: usize,
        row: usize,
        weight: f64,
    },

    #[error("non-finite branching weight {weight} at head {head}, tail {tail}")]
    NonFiniteWeight { head: usize, tail: usize, weight: f64 },

    #[error("row {row} of transition {transition} has {actual} slots, expected {expected}")]
    RaggedRows {
        transition: usize,
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("weight matrix row {row} has {actual} entries, expected {expected}")]
    NonSquareMatrix {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("transition {transition} has {rows} rows but {weights} weights")]
    WeightCountMismatch {
        transition: usize,
        rows: usize,
        weights: usize,
    },

    #[error("transition {transition} has {actual} subjects, expected {expected}")]
    UnevenSubjects {
        transition: usize,
        expected: usize,
        actual: usize,
    },

    #[error("subject {subject} needs {combinations} completions, limit is {limit}")]
    CompletionLimitExceeded {
        subject: usize,
        combinations: String,
        limit: usize,
    },

    #[error("every completion of subject {subject} has zero probability")]
    DegenerateCompletion { subject: usize },

    #[error("node {node} has no parameters; learn or generate them first")]
    MissingParameters { node: usize },

    #[error("value {value} out of range for slot {slot} (domain size {domain_size})")]
    InvalidValue {
        slot: usize,
        value: u32,
        domain_size: usize,
    },

    #[error("cannot parse '{token}' as a value of numeric attribute '{attribute}'")]
    InvalidToken { attribute: String, token: String },

    #[error("configuration error: {0}")]
    Config(#[from] dbn_config::ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl DbnError {
    /// Stable error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            DbnError::NotEvaluated => 10,
            DbnError::NodeOutOfRange { .. } => 11,
            DbnError::AttributeMismatch(_) => 12,
            DbnError::StationaryMultipleNets(_) => 13,
            DbnError::TooManyTransitions { .. } => 14,
            DbnError::MissingInitialNet => 15,
            DbnError::CyclicStructure { .. } => 16,
            DbnError::TransitionCountMismatch { .. } => 17,
            DbnError::InvalidWeight { .. } => 20,
            DbnError::NonFiniteWeight { .. } => 21,
            DbnError::RaggedRows { .. } => 22,
            DbnError::UnevenSubjects { .. } => 23,
            DbnError::InvalidValue { .. } => 24,
            DbnError::InvalidToken { .. } => 25,
            DbnError::WeightCountMismatch { .. } => 26,
            DbnError::NonSquareMatrix { .. } => 27,
            DbnError::CompletionLimitExceeded { .. } => 30,
            DbnError::DegenerateCompletion { .. } => 31,
            DbnError::MissingParameters { .. } => 32,
            DbnError::Config(e) => e.code(),
            DbnError::Serialization(_) => 40,
            DbnError::ThreadPool(_) => 41,
        }
    }

    /// Whether the caller can recover by fixing its input and retrying.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            DbnError::InvalidWeight { .. }
                | DbnError::NonFiniteWeight { .. }
                | DbnError::RaggedRows { .. }
                | DbnError::WeightCountMismatch { .. }
                | DbnError::NonSquareMatrix { .. }
                | DbnError::UnevenSubjects { .. }
                | DbnError::InvalidValue { .. }
                | DbnError::InvalidToken { .. }
                | DbnError::Config(_)
        )
    }
}
