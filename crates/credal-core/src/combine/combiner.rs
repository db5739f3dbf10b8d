//! Evidence combiner
//!
//! Encodes every judgment of a `(subject_id, group_id)` cell under the
//! configured world policy and folds the resulting mass functions into one.

use tracing::{debug, info};

use super::types::{CombinedResult, StageBelief};
use crate::encode::WorldPolicy;
use crate::error::{BeliefError, Result};
use crate::judgment::{group_by_cell, GroupKey, Judgment};
use crate::logging::prefix;
use crate::mass::{FocalSet, Frame, MassFunction, EPSILON};
use crate::status::{DropReason, Status};

/// Default operating conflict threshold
pub const DEFAULT_CONFLICT_THRESHOLD: f64 = 0.9;

/// Mass functions encoded from one cell
#[derive(Debug, Clone)]
pub struct EncodedGroup {
    pub masses: Vec<MassFunction>,
    pub n_abstained: usize,
}

/// Closed-world two-pass combination.
///
/// `conflict` comes from the unnormalized fold, `mass` from the normalized
/// one; `mass` is `None` when renormalization is degenerate.
#[derive(Debug, Clone)]
pub struct ClosedCombination {
    pub conflict: f64,
    pub mass: Option<MassFunction>,
}

/// Combine with conflict measured before normalization.
pub fn combine_closed<'a, I>(masses: I) -> Result<ClosedCombination>
where
    I: IntoIterator<Item = &'a MassFunction> + Clone,
{
    let conflict = MassFunction::combine_many(masses.clone(), false)?.conflict;
    let mass = match MassFunction::combine_many(masses, true) {
        Ok(combination) => Some(combination.mass),
        Err(BeliefError::DegenerateCombination { .. }) => None,
        Err(err) => return Err(err),
    };
    Ok(ClosedCombination { conflict, mass })
}

/// Combines judgments cell by cell under one policy and threshold
#[derive(Debug, Clone)]
pub struct EvidenceCombiner {
    frame: Frame,
    policy: WorldPolicy,
    conflict_threshold: f64,
}

impl EvidenceCombiner {
    pub fn new(frame: Frame, policy: WorldPolicy) -> Self {
        Self {
            frame,
            policy,
            conflict_threshold: DEFAULT_CONFLICT_THRESHOLD,
        }
    }

    pub fn with_conflict_threshold(mut self, threshold: f64) -> Self {
        self.conflict_threshold = threshold;
        self
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn policy(&self) -> WorldPolicy {
        self.policy
    }

    pub fn conflict_threshold(&self) -> f64 {
        self.conflict_threshold
    }

    /// Whether a conflict value is at or above the threshold
    pub fn exceeds_threshold(&self, conflict: f64) -> bool {
        conflict >= self.conflict_threshold - EPSILON
    }

    /// Encode judgments, dropping closed-world abstentions.
    pub fn encode_all(&self, judgments: &[&Judgment]) -> Result<EncodedGroup> {
        let mut masses = Vec::with_capacity(judgments.len());
        let mut n_abstained = 0;
        for judgment in judgments {
            if judgment.verdict.is_abstain() {
                n_abstained += 1;
            }
            if let Some(m) =
                self.policy
                    .encode(&judgment.verdict, judgment.confidence(), &self.frame)?
            {
                masses.push(m);
            }
        }
        Ok(EncodedGroup {
            masses,
            n_abstained,
        })
    }

    /// Combine every judgment of one cell.
    ///
    /// Errors only on malformed judgments or rows that belong to another cell;
    /// evidence problems are reported through the result's status.
    pub fn combine_group(&self, key: &GroupKey, judgments: &[&Judgment]) -> Result<CombinedResult> {
        if let Some(stray) = judgments
            .iter()
            .find(|j| j.subject_id != key.subject_id || j.group_id != key.group_id)
        {
            return Err(BeliefError::InvalidJudgment(format!(
                "judgment for {}|{} passed to cell {}|{}",
                stray.subject_id, stray.group_id, key.subject_id, key.group_id
            )));
        }

        let encoded = self.encode_all(judgments)?;
        let mut result = CombinedResult {
            subject_id: key.subject_id.clone(),
            group_id: key.group_id.clone(),
            policy: self.policy,
            n_judgments: judgments.len(),
            n_active: encoded.masses.len(),
            n_abstained: encoded.n_abstained,
            conflict: None,
            mass: None,
            stages: Vec::new(),
            conviction: None,
            dominant_stage: None,
            status: Status::Ok,
        };

        let (conflict, mass) = match encoded.masses.as_slice() {
            [] => {
                result.status = Status::dropped(DropReason::NoEvidence {
                    abstained: encoded.n_abstained,
                });
                debug!(
                    "{} {}|{} has no evidence ({} abstained)",
                    prefix::COMBINE,
                    key.subject_id,
                    key.group_id,
                    encoded.n_abstained
                );
                return Ok(result);
            }
            // Nothing to conflict with.
            [single] => (0.0, Some(single.clone())),
            masses => match self.policy {
                WorldPolicy::Open => {
                    let combination = MassFunction::combine_many(masses, false)?;
                    (combination.conflict, Some(combination.mass))
                }
                WorldPolicy::Closed => {
                    let closed = combine_closed(masses)?;
                    (closed.conflict, closed.mass)
                }
            },
        };
        result.conflict = Some(conflict);

        let Some(mass) = mass else {
            result.status = Status::dropped(DropReason::DegenerateCombination { conflict });
            debug!(
                "{} {}|{} degenerate (conflict {:.4})",
                prefix::COMBINE,
                key.subject_id,
                key.group_id,
                conflict
            );
            return Ok(result);
        };

        let pignistic = mass.pignistic().ok();
        result.stages = self
            .frame
            .stages()
            .iter()
            .map(|&stage| {
                let h = FocalSet::singleton(stage);
                StageBelief {
                    stage,
                    belief: mass.belief(&h),
                    plausibility: mass.plausibility(&h),
                    pignistic: pignistic.as_ref().map(|p| p.get(stage)),
                }
            })
            .collect();
        result.mass = Some(mass);

        if self.exceeds_threshold(conflict) {
            result.status = Status::dropped(DropReason::ConflictAboveThreshold {
                conflict,
                threshold: self.conflict_threshold,
            });
        } else if let Some(p) = &pignistic {
            result.conviction = Some(p.conviction());
            result.dominant_stage = Some(p.dominant());
        } else {
            result.status = Status::dropped(DropReason::UnresolvedHypothesis);
        }

        if let Some(reason) = result.status.reason() {
            debug!(
                "{} {}|{} dropped: {}",
                prefix::COMBINE,
                key.subject_id,
                key.group_id,
                reason
            );
        }

        Ok(result)
    }

    /// Combine a whole judgment table, one result per cell in sorted order.
    pub fn combine_table(&self, judgments: &[Judgment]) -> Result<Vec<CombinedResult>> {
        let cells = group_by_cell(judgments);
        let mut results = Vec::with_capacity(cells.len());
        for (key, rows) in &cells {
            results.push(self.combine_group(key, rows)?);
        }

        let usable = results.iter().filter(|r| r.is_usable()).count();
        info!(
            "{} combined {} cells under {} world: {} usable, {} dropped",
            prefix::COMBINE,
            results.len(),
            self.policy,
            usable,
            results.len() - usable
        );
        Ok(results)
    }
}
