//! Frame of discernment

use serde::{Deserialize, Serialize};

use super::focal::FocalSet;
use crate::error::{BeliefError, Result};

/// Ordered, immutable set of atomic hypotheses (ordinal stages).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<u32>", try_from = "Vec<u32>")]
pub struct Frame {
    stages: Vec<u32>,
    full: FocalSet,
}

impl Frame {
    /// Build a frame from distinct stage identifiers.
    pub fn new(stages: Vec<u32>) -> Result<Self> {
        if stages.is_empty() {
            return Err(BeliefError::InvalidFrame("frame has no stages".into()));
        }
        let full = FocalSet::from_stages(stages.iter().copied())?;
        if full.len() != stages.len() {
            return Err(BeliefError::InvalidFrame(format!(
                "duplicate stages in {:?}",
                stages
            )));
        }
        let mut stages = stages;
        stages.sort_unstable();
        Ok(Self { stages, full })
    }

    /// The ordinal frame `{1, ..., n}`.
    pub fn ordinal(n: usize) -> Result<Self> {
        let n = u32::try_from(n)
            .map_err(|_| BeliefError::InvalidFrame(format!("frame size {} too large", n)))?;
        Self::new((1..=n).collect())
    }

    /// Stages in ascending order
    pub fn stages(&self) -> &[u32] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Θ itself as a focal set
    pub fn full(&self) -> FocalSet {
        self.full
    }

    pub fn contains(&self, set: &FocalSet) -> bool {
        set.is_subset_of(&self.full)
    }

    /// `Θ \ set`
    pub fn complement(&self, set: &FocalSet) -> FocalSet {
        self.full.difference(set)
    }

    /// Focal set for a verdict, rejecting stages outside the frame.
    pub fn focal(&self, stages: &[u32]) -> Result<FocalSet> {
        let set = FocalSet::from_stages(stages.iter().copied())?;
        if !self.contains(&set) {
            return Err(BeliefError::InvalidJudgment(format!(
                "verdict {:?} lies outside frame {}",
                stages, self
            )));
        }
        Ok(set)
    }
}

impl From<Frame> for Vec<u32> {
    fn from(frame: Frame) -> Self {
        frame.stages
    }
}

impl TryFrom<Vec<u32>> for Frame {
    type Error = BeliefError;

    fn try_from(stages: Vec<u32>) -> Result<Self> {
        Self::new(stages)
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Θ{}", self.full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_frame() {
        let frame = Frame::ordinal(4).unwrap();
        assert_eq!(frame.stages(), &[1, 2, 3, 4]);
        assert_eq!(frame.len(), 4);
        assert_eq!(frame.to_string(), "Θ{1,2,3,4}");
    }

    #[test]
    fn stages_are_sorted() {
        let frame = Frame::new(vec![3, 0, 7]).unwrap();
        assert_eq!(frame.stages(), &[0, 3, 7]);
    }

    #[test]
    fn rejects_empty_and_duplicates() {
        assert!(Frame::new(vec![]).is_err());
        assert!(Frame::ordinal(0).is_err());
        assert!(Frame::new(vec![1, 1, 2]).is_err());
        assert!(Frame::ordinal(64).is_err());
    }

    #[test]
    fn complement_and_focal() {
        let frame = Frame::ordinal(4).unwrap();
        let h = frame.focal(&[2, 3]).unwrap();
        assert_eq!(frame.complement(&h).to_vec(), vec![1, 4]);
        assert!(frame.focal(&[5]).is_err());
    }
}
