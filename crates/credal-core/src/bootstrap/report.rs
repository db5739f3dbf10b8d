//! Stability report types

use serde::{Deserialize, Serialize};

use crate::aggregate::quantile::{mean, quantile, std_dev};
use crate::status::Status;

/// Resampling statistics of one stage's pignistic probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageStability {
    pub stage: u32,
    /// Pignistic probability from the full, unresampled evidence
    pub point: f64,
    pub mean: f64,
    /// 2.5th percentile
    pub q025: f64,
    /// 97.5th percentile
    pub q975: f64,
    /// Population standard deviation
    pub std: f64,
    /// `q975 - q025`
    pub ci_width: f64,
}

impl StageStability {
    /// Summarize bootstrap draws. `None` when there are no finite draws.
    pub fn from_samples(stage: u32, point: f64, samples: &[f64]) -> Option<Self> {
        let q025 = quantile(samples, 0.025)?;
        let q975 = quantile(samples, 0.975)?;
        Some(Self {
            stage,
            point,
            mean: mean(samples)?,
            q025,
            q975,
            std: std_dev(samples)?,
            ci_width: q975 - q025,
        })
    }
}

/// Bootstrap stability of one subject's combined belief.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityReport {
    pub subject_id: String,
    pub n_active: usize,
    pub n_abstained: usize,
    /// `n_abstained / (n_active + n_abstained)`, 0 with no judgments
    pub abstain_rate: f64,
    pub n_iterations: usize,
    /// Iterations whose normalized combination had nothing to renormalize
    pub n_degenerate: usize,
    pub conflict_point: Option<f64>,
    pub conflict_mean: Option<f64>,
    pub dominant_stage: Option<u32>,
    /// Share of iterations whose dominant stage differs from the point estimate
    pub flip_rate: Option<f64>,
    pub stages: Vec<StageStability>,
    #[serde(flatten)]
    pub status: Status,
}

impl StabilityReport {
    pub(crate) fn new(subject_id: &str, n_active: usize, n_abstained: usize, n_iterations: usize) -> Self {
        let total = n_active + n_abstained;
        Self {
            subject_id: subject_id.to_string(),
            n_active,
            n_abstained,
            abstain_rate: if total > 0 {
                n_abstained as f64 / total as f64
            } else {
                0.0
            },
            n_iterations,
            n_degenerate: 0,
            conflict_point: None,
            conflict_mean: None,
            dominant_stage: None,
            flip_rate: None,
            stages: Vec::new(),
            status: Status::Ok,
        }
    }

    pub fn is_usable(&self) -> bool {
        self.status.is_ok()
    }

    pub fn stage(&self, stage: u32) -> Option<&StageStability> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// Widest 95% interval across stages
    pub fn max_ci_width(&self) -> Option<f64> {
        self.stages
            .iter()
            .map(|s| s.ci_width)
            .reduce(f64::max)
    }

    pub fn mean_ci_width(&self) -> Option<f64> {
        let widths: Vec<f64> = self.stages.iter().map(|s| s.ci_width).collect();
        mean(&widths)
    }

    /// Point pignistic probabilities in stage order
    pub fn point_vector(&self) -> Option<Vec<f64>> {
        if self.stages.is_empty() {
            return None;
        }
        Some(self.stages.iter().map(|s| s.point).collect())
    }
}
