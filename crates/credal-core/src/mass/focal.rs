//! Canonical focal sets
//!
//! A focal set is stored as a 64-bit membership mask indexed by stage
//! identifier, so `{3, 1}` and `{1, 3}` are the same value and hash alike.

use serde::{Deserialize, Serialize};

use crate::error::{BeliefError, Result};

/// Largest stage identifier a focal set can hold.
pub const MAX_STAGE: u32 = 63;

/// A subset of the frame of discernment.
///
/// The empty set stands for contradiction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(into = "Vec<u32>", try_from = "Vec<u32>")]
pub struct FocalSet(u64);

impl FocalSet {
    /// The empty set (contradiction)
    pub const EMPTY: FocalSet = FocalSet(0);

    /// Build a focal set from stage identifiers. Duplicates collapse.
    pub fn from_stages<I>(stages: I) -> Result<Self>
    where
        I: IntoIterator<Item = u32>,
    {
        let mut bits = 0u64;
        for stage in stages {
            if stage > MAX_STAGE {
                return Err(BeliefError::InvalidFrame(format!(
                    "stage {} exceeds maximum identifier {}",
                    stage, MAX_STAGE
                )));
            }
            bits |= 1u64 << stage;
        }
        Ok(Self(bits))
    }

    /// Single-stage set. Panics if `stage > MAX_STAGE`.
    pub fn singleton(stage: u32) -> Self {
        assert!(stage <= MAX_STAGE, "stage {} out of range", stage);
        Self(1u64 << stage)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of stages in the set
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn contains(&self, stage: u32) -> bool {
        stage <= MAX_STAGE && self.0 & (1u64 << stage) != 0
    }

    pub fn intersection(&self, other: &Self) -> Self {
        Self(self.0 & other.0)
    }

    pub fn union(&self, other: &Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Stages in `self` that are not in `other`
    pub fn difference(&self, other: &Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn intersects(&self, other: &Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Stage identifiers in ascending order
    pub fn stages(&self) -> impl Iterator<Item = u32> + '_ {
        (0..=MAX_STAGE).filter(move |s| self.0 & (1u64 << s) != 0)
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.stages().collect()
    }
}

impl From<FocalSet> for Vec<u32> {
    fn from(set: FocalSet) -> Self {
        set.to_vec()
    }
}

impl TryFrom<Vec<u32>> for FocalSet {
    type Error = BeliefError;

    fn try_from(stages: Vec<u32>) -> Result<Self> {
        Self::from_stages(stages)
    }
}

impl std::fmt::Display for FocalSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "∅");
        }
        let parts: Vec<String> = self.stages().map(|s| s.to_string()).collect();
        write!(f, "{{{}}}", parts.join(","))
    }
}
