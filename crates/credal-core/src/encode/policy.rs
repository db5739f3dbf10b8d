//! World policies: how verdicts become mass functions

use serde::{Deserialize, Serialize};

use super::verdict::Verdict;
use crate::error::{BeliefError, Result};
use crate::mass::{FocalSet, Frame, MassFunction};

/// Interpretation of contradiction and abstention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorldPolicy {
    /// Transferable Belief Model: mass on ∅ is kept as contradiction and
    /// abstentions are evidence.
    #[default]
    Open,
    /// Classical Dempster-Shafer: abstentions are dropped and conflict is
    /// normalized away.
    Closed,
}

impl WorldPolicy {
    /// Whether combined results are reported from the normalized combination
    pub fn normalizes(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Encode one verdict with confidence `p`.
    ///
    /// | verdict         | open                 | closed        |
    /// |-----------------|----------------------|---------------|
    /// | abstain         | m(∅)=p, m(Θ)=1-p     | dropped       |
    /// | Θ               | m(Θ)=p, m(∅)=1-p     | m(Θ)=1        |
    /// | proper subset V | m(V)=p, m(Θ)=1-p     | m(V)=p, m(Θ)=1-p |
    pub fn encode(
        &self,
        verdict: &Verdict,
        confidence: f64,
        frame: &Frame,
    ) -> Result<Option<MassFunction>> {
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(BeliefError::InvalidJudgment(format!(
                "confidence {} outside [0, 1]",
                confidence
            )));
        }
        let theta = frame.full();

        let stages = match verdict {
            Verdict::Stages(stages) if !stages.is_empty() => stages,
            // An empty stage list carries no judgment either.
            _ => {
                return match self {
                    Self::Open => {
                        let m = MassFunction::new(
                            frame.clone(),
                            [(FocalSet::EMPTY, confidence), (theta, 1.0 - confidence)],
                        )?;
                        Ok(Some(m))
                    }
                    Self::Closed => Ok(None),
                };
            }
        };

        let focal = frame.focal(stages)?;
        if focal == theta {
            let m = match self {
                Self::Open => MassFunction::new(
                    frame.clone(),
                    [(theta, confidence), (FocalSet::EMPTY, 1.0 - confidence)],
                )?,
                Self::Closed => MassFunction::vacuous(frame.clone()),
            };
            return Ok(Some(m));
        }

        simple_support(frame, focal, confidence).map(Some)
    }
}

/// Simple support function `m(V)=p, m(Θ)=1-p`, shared by both policies.
fn simple_support(frame: &Frame, focal: FocalSet, p: f64) -> Result<MassFunction> {
    MassFunction::new(frame.clone(), [(focal, p), (frame.full(), 1.0 - p)])
}

impl std::fmt::Display for WorldPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}
