//! Per-result status

use serde::{Deserialize, Serialize};

use crate::error::BeliefError;

/// Whether a result is usable, and why not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Status {
    Ok,
    Dropped { reason: DropReason },
}

/// Why a group or subject was marked unusable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DropReason {
    /// Every judgment was dropped during encoding
    NoEvidence { abstained: usize },
    /// Combination conflict at or above the operating threshold
    ConflictAboveThreshold { conflict: f64, threshold: f64 },
    /// Normalized combination with nothing left to renormalize
    DegenerateCombination { conflict: f64 },
    /// Only contradiction mass remains; no pignistic distribution
    UnresolvedHypothesis,
    /// Too few mass functions for the operation
    InsufficientEvidence {
        required: usize,
        active: usize,
        abstained: usize,
    },
    /// Every group result for the subject was dropped
    NoUsableGroups { total: usize, dropped: usize },
}

impl Status {
    pub fn dropped(reason: DropReason) -> Self {
        Self::Dropped { reason }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    pub fn reason(&self) -> Option<&DropReason> {
        match self {
            Self::Ok => None,
            Self::Dropped { reason } => Some(reason),
        }
    }
}

impl DropReason {
    /// Map a local evidence failure to a drop reason.
    ///
    /// Returns `None` for caller errors, which must propagate instead.
    pub fn from_error(err: &BeliefError) -> Option<Self> {
        match err {
            BeliefError::DegenerateCombination { conflict } => {
                Some(Self::DegenerateCombination { conflict: *conflict })
            }
            BeliefError::UnresolvedHypothesis => Some(Self::UnresolvedHypothesis),
            BeliefError::InsufficientEvidence {
                required,
                active,
                abstained,
            } => Some(Self::InsufficientEvidence {
                required: *required,
                active: *active,
                abstained: *abstained,
            }),
            _ => None,
        }
    }
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoEvidence { abstained } => {
                write!(f, "no evidence ({} abstained)", abstained)
            }
            Self::ConflictAboveThreshold {
                conflict,
                threshold,
            } => write!(f, "conflict {:.4} >= {}", conflict, threshold),
            Self::DegenerateCombination { conflict } => {
                write!(f, "degenerate combination (conflict {:.4})", conflict)
            }
            Self::UnresolvedHypothesis => write!(f, "unresolved hypothesis"),
            Self::InsufficientEvidence {
                required,
                active,
                abstained,
            } => write!(
                f,
                "{} active, {} abstained, need {}",
                active, abstained, required
            ),
            Self::NoUsableGroups { total, dropped } => {
                write!(f, "{}/{} groups dropped", dropped, total)
            }
        }
    }
}
