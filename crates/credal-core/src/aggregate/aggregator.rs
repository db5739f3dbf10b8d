//! Conflict filter and quality-weighted aggregation across groups

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::quantile::{weighted_mean, weighted_quantile};
use crate::combine::{CombinedResult, DEFAULT_CONFLICT_THRESHOLD};
use crate::error::{BeliefError, Result};
use crate::logging::prefix;
use crate::mass::EPSILON;
use crate::status::{DropReason, Status};

/// Allowed deviation of the summed mean pignistic probability from 1
const PIGNISTIC_SUM_TOLERANCE: f64 = 1e-6;

/// Pooled pignistic statistics for one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageAggregate {
    pub stage: u32,
    pub mean: f64,
    pub q10: f64,
    pub q90: f64,
}

/// Per-subject aggregate over usable groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub subject_id: String,
    /// Group results seen for the subject
    pub n_groups: usize,
    /// Groups retained after conflict filtering
    pub n_usable: usize,
    pub weight_sum: f64,
    /// Quality weights were absent or non-positive and 1.0 was used instead
    pub uniform_weights: bool,
    pub stages: Vec<StageAggregate>,
    /// Arg-max stage of the mean pignistic probability
    pub dominant_stage: Option<u32>,
    #[serde(flatten)]
    pub status: Status,
}

impl AggregateResult {
    pub fn is_usable(&self) -> bool {
        self.status.is_ok()
    }

    /// Σ mean pignistic probability; ≈ 1 for every usable subject
    pub fn pignistic_sum(&self) -> f64 {
        self.stages.iter().map(|s| s.mean).sum()
    }

    pub fn stage(&self, stage: u32) -> Option<&StageAggregate> {
        self.stages.iter().find(|s| s.stage == stage)
    }
}

/// Filters group results by conflict and pools the survivors per subject
#[derive(Debug, Clone)]
pub struct Aggregator {
    conflict_threshold: f64,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_CONFLICT_THRESHOLD)
    }
}

impl Aggregator {
    pub fn new(conflict_threshold: f64) -> Self {
        Self { conflict_threshold }
    }

    pub fn conflict_threshold(&self) -> f64 {
        self.conflict_threshold
    }

    /// Whether a group result survives the conflict filter.
    ///
    /// Judged on conflict and pignistic availability alone, so a threshold
    /// looser than the combiner's can readmit a group.
    pub fn retains(&self, result: &CombinedResult) -> bool {
        let below = result
            .conflict
            .is_some_and(|c| c < self.conflict_threshold - EPSILON);
        below && result.pignistic_vector().is_some()
    }

    /// Aggregate one subject's group results.
    ///
    /// `quality_weights` maps group id to its quality signal; missing,
    /// non-finite and negative values count as 0. When no retained group has
    /// positive weight every group gets weight 1.
    pub fn aggregate(
        &self,
        subject_id: &str,
        per_group: &[&CombinedResult],
        quality_weights: &BTreeMap<String, f64>,
    ) -> Result<AggregateResult> {
        if let Some(stray) = per_group.iter().find(|r| r.subject_id != subject_id) {
            return Err(BeliefError::InvalidJudgment(format!(
                "group result for subject {} passed to aggregate of {}",
                stray.subject_id, subject_id
            )));
        }

        let retained: Vec<&CombinedResult> =
            per_group.iter().copied().filter(|r| self.retains(r)).collect();

        let mut result = AggregateResult {
            subject_id: subject_id.to_string(),
            n_groups: per_group.len(),
            n_usable: retained.len(),
            weight_sum: 0.0,
            uniform_weights: false,
            stages: Vec::new(),
            dominant_stage: None,
            status: Status::Ok,
        };

        if retained.is_empty() {
            result.status = Status::dropped(DropReason::NoUsableGroups {
                total: per_group.len(),
                dropped: per_group.len(),
            });
            debug!(
                "{} {} unusable: all {} group(s) dropped",
                prefix::AGGREGATE,
                subject_id,
                per_group.len()
            );
            return Ok(result);
        }

        let reference = stage_ids(retained[0]);
        for r in &retained[1..] {
            let ids = stage_ids(r);
            if ids != reference {
                return Err(BeliefError::FrameMismatch {
                    left: format!("{:?}", reference),
                    right: format!("{:?}", ids),
                });
            }
        }

        let mut weights: Vec<f64> = retained
            .iter()
            .map(|r| {
                quality_weights
                    .get(&r.group_id)
                    .copied()
                    .filter(|w| w.is_finite())
                    .unwrap_or(0.0)
                    .max(0.0)
            })
            .collect();
        if weights.iter().sum::<f64>() <= 0.0 {
            weights = vec![1.0; retained.len()];
            result.uniform_weights = true;
        }
        result.weight_sum = weights.iter().sum();

        for (i, stage_belief) in retained[0].stages.iter().enumerate() {
            let values: Vec<f64> = retained
                .iter()
                .map(|r| r.stages[i].pignistic.unwrap_or(0.0))
                .collect();
            let mean = weighted_mean(&values, &weights).unwrap_or(f64::NAN);
            result.stages.push(StageAggregate {
                stage: stage_belief.stage,
                mean,
                q10: weighted_quantile(&values, &weights, 0.10).unwrap_or(f64::NAN),
                q90: weighted_quantile(&values, &weights, 0.90).unwrap_or(f64::NAN),
            });
        }

        let mut best: Option<(u32, f64)> = None;
        for s in &result.stages {
            if best.map_or(true, |(_, m)| s.mean > m) {
                best = Some((s.stage, s.mean));
            }
        }
        result.dominant_stage = best.map(|(stage, _)| stage);

        let sum = result.pignistic_sum();
        if (sum - 1.0).abs() > PIGNISTIC_SUM_TOLERANCE {
            warn!(
                "{} {} mean pignistic sums to {:.9}, expected 1",
                prefix::AGGREGATE,
                subject_id,
                sum
            );
        }

        Ok(result)
    }

    /// Aggregate every subject present in `results`, dropped ones included.
    pub fn aggregate_all(
        &self,
        results: &[CombinedResult],
        quality_weights: &BTreeMap<String, f64>,
    ) -> Result<Vec<AggregateResult>> {
        let mut by_subject: BTreeMap<&str, Vec<&CombinedResult>> = BTreeMap::new();
        for r in results {
            by_subject.entry(r.subject_id.as_str()).or_default().push(r);
        }

        by_subject
            .into_iter()
            .map(|(subject, group)| self.aggregate(subject, &group, quality_weights))
            .collect()
    }
}

fn stage_ids(result: &CombinedResult) -> Vec<u32> {
    result.stages.iter().map(|s| s.stage).collect()
}

/// Aggregate one subject's group results at the given threshold.
pub fn aggregate(
    subject_id: &str,
    per_group: &[&CombinedResult],
    quality_weights: &BTreeMap<String, f64>,
    conflict_threshold: f64,
) -> Result<AggregateResult> {
    Aggregator::new(conflict_threshold).aggregate(subject_id, per_group, quality_weights)
}
