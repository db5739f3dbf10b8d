//! Combined result types

use serde::{Deserialize, Serialize};

use crate::encode::WorldPolicy;
use crate::mass::MassFunction;
use crate::status::Status;

/// Belief quantities for one stage of a combined mass function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageBelief {
    pub stage: u32,
    pub belief: f64,
    pub plausibility: f64,
    /// `None` when the pignistic transform is undefined
    pub pignistic: Option<f64>,
}

/// Combination of every judgment for one `(subject_id, group_id)` cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedResult {
    pub subject_id: String,
    pub group_id: String,
    pub policy: WorldPolicy,
    /// Judgments in the cell
    pub n_judgments: usize,
    /// Judgments that produced a mass function
    pub n_active: usize,
    /// Abstentions among the judgments (encoded under open world, dropped under closed)
    pub n_abstained: usize,
    /// Combination conflict; `None` when nothing was combined.
    ///
    /// A cell with one active judgment reports 0 even when that judgment is
    /// an open-world abstention carrying `m(∅)`. Such a cell passes the
    /// conflict filter and contributes its rescaled (uniform) pignistic
    /// vector; `mass` still shows the contradiction weight.
    pub conflict: Option<f64>,
    /// Reported mass function: unnormalized (open) or normalized (closed)
    pub mass: Option<MassFunction>,
    pub stages: Vec<StageBelief>,
    /// Maximum pignistic probability, only for usable results
    pub conviction: Option<f64>,
    /// Arg-max stage, only for usable results
    pub dominant_stage: Option<u32>,
    #[serde(flatten)]
    pub status: Status,
}

impl CombinedResult {
    pub fn is_usable(&self) -> bool {
        self.status.is_ok()
    }

    /// Pignistic probability of a stage, if defined
    pub fn pignistic(&self, stage: u32) -> Option<f64> {
        self.stages
            .iter()
            .find(|s| s.stage == stage)
            .and_then(|s| s.pignistic)
    }

    /// Pignistic probabilities in stage order, if defined for every stage
    pub fn pignistic_vector(&self) -> Option<Vec<f64>> {
        if self.stages.is_empty() {
            return None;
        }
        self.stages.iter().map(|s| s.pignistic).collect()
    }
}
