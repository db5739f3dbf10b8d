//! Analysis configuration
//!
//! Every field has a default, so a JSON request can omit the config entirely
//! or set only what it needs.

use serde::{Deserialize, Serialize};

use crate::bootstrap::{DEFAULT_ITERATIONS, DEFAULT_SEED};
use crate::combine::DEFAULT_CONFLICT_THRESHOLD;
use crate::encode::WorldPolicy;
use crate::error::{BeliefError, Result};
use crate::mass::{Frame, MAX_STAGE};

/// Default number of ordinal stages
pub const DEFAULT_FRAME_SIZE: usize = 4;

/// How groups are weighted during aggregation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weighting {
    /// Mean `quality_weight` of the group's rows
    #[default]
    Quality,
    /// Every retained group weighs 1
    Uniform,
}

/// Configuration of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Stages `1..=frame_size` (default: 4)
    pub frame_size: usize,
    /// Encoding and combination semantics (default: open)
    pub policy: WorldPolicy,
    /// Groups at or above this conflict are dropped (default: 0.9)
    pub conflict_threshold: f64,
    /// Bootstrap draws per subject (default: 1000)
    pub bootstrap_iterations: usize,
    /// Base seed; cell `i` uses `seed + i` (default: 42)
    pub seed: u64,
    pub weighting: Weighting,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_size: DEFAULT_FRAME_SIZE,
            policy: WorldPolicy::Open,
            conflict_threshold: DEFAULT_CONFLICT_THRESHOLD,
            bootstrap_iterations: DEFAULT_ITERATIONS,
            seed: DEFAULT_SEED,
            weighting: Weighting::Quality,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.frame_size == 0 || self.frame_size > MAX_STAGE as usize {
            return Err(BeliefError::InvalidConfig(format!(
                "frame_size must be in 1..={}, got {}",
                MAX_STAGE, self.frame_size
            )));
        }
        if !(self.conflict_threshold > 0.0 && self.conflict_threshold <= 1.0) {
            return Err(BeliefError::InvalidConfig(format!(
                "conflict_threshold must be in (0, 1], got {}",
                self.conflict_threshold
            )));
        }
        if self.bootstrap_iterations == 0 {
            return Err(BeliefError::InvalidConfig(
                "bootstrap_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The ordinal frame `{1, …, frame_size}`
    pub fn frame(&self) -> Result<Frame> {
        Frame::ordinal(self.frame_size)
    }
}
