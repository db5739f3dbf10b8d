//! Error types for belief-function operations

use thiserror::Error;

/// Errors raised by the belief-function engine.
///
/// Per-group and per-subject failures during a batch run are recorded as a
/// [`crate::Status`] on the affected result instead; only malformed input and
/// frame mismatches surface as `Err` from the batch entry points.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BeliefError {
    /// Weights negative, non-finite, off the frame, or not summing to 1
    #[error("invalid mass function: {0}")]
    InvalidMassFunction(String),

    /// Normalized combination attempted with no surviving belief
    #[error("degenerate combination: conflict {conflict} leaves nothing to renormalize")]
    DegenerateCombination { conflict: f64 },

    /// Fewer mass functions than the operation needs
    #[error("insufficient evidence: {active} active judgment(s) ({abstained} abstained), need {required}")]
    InsufficientEvidence {
        required: usize,
        active: usize,
        abstained: usize,
    },

    /// Pignistic transform on a mass function with only contradiction mass
    #[error("unresolved hypothesis: no non-contradiction mass to distribute")]
    UnresolvedHypothesis,

    /// Mass functions built over different frames were mixed
    #[error("frame mismatch: {left} vs {right}")]
    FrameMismatch { left: String, right: String },

    /// Frame definition rejected
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// Judgment record that cannot be encoded
    #[error("invalid judgment: {0}")]
    InvalidJudgment(String),

    /// Analysis configuration rejected
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Bootstrap abandoned between iterations
    #[error("bootstrap cancelled after {completed} of {requested} iterations")]
    Cancelled { completed: usize, requested: usize },

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for BeliefError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for belief-function operations
pub type Result<T> = std::result::Result<T, BeliefError>;
