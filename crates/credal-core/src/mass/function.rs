//! Mass functions and the conjunctive combination rule

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::focal::FocalSet;
use super::frame::Frame;
use crate::error::{BeliefError, Result};

/// Tolerance for threshold comparisons after repeated combination.
pub const EPSILON: f64 = 1e-9;

/// Tolerance for the sum-to-one check at construction.
pub const MASS_SUM_TOLERANCE: f64 = 1e-6;

/// One focal set and its weight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocalMass {
    pub set: FocalSet,
    pub mass: f64,
}

#[derive(Serialize, Deserialize)]
struct MassFunctionRepr {
    frame: Frame,
    focal: Vec<FocalMass>,
}

/// Sparse, validated assignment of belief weight to subsets of a frame.
///
/// Weights are finite, non-negative and sum to 1. Mass on the empty set is
/// contradiction and is kept as an ordinary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "MassFunctionRepr", try_from = "MassFunctionRepr")]
pub struct MassFunction {
    frame: Frame,
    masses: BTreeMap<FocalSet, f64>,
}

/// Result of combining mass functions
#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    pub mass: MassFunction,
    /// Mass that landed on the empty set
    pub conflict: f64,
}

impl MassFunction {
    /// Build and validate a mass function. Repeated focal sets accumulate.
    pub fn new<I>(frame: Frame, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (FocalSet, f64)>,
    {
        let mut masses = BTreeMap::new();
        for (set, mass) in entries {
            if !mass.is_finite() || mass < 0.0 {
                return Err(BeliefError::InvalidMassFunction(format!(
                    "weight {} on {} is not a finite non-negative number",
                    mass, set
                )));
            }
            if !frame.contains(&set) {
                return Err(BeliefError::InvalidMassFunction(format!(
                    "focal set {} lies outside {}",
                    set, frame
                )));
            }
            if mass > 0.0 {
                *masses.entry(set).or_insert(0.0) += mass;
            }
        }

        let total: f64 = masses.values().sum();
        if (total - 1.0).abs() > MASS_SUM_TOLERANCE {
            return Err(BeliefError::InvalidMassFunction(format!(
                "weights sum to {}, expected 1",
                total
            )));
        }

        Ok(Self { frame, masses })
    }

    /// Total ignorance: all mass on Θ
    pub fn vacuous(frame: Frame) -> Self {
        let mut masses = BTreeMap::new();
        masses.insert(frame.full(), 1.0);
        Self { frame, masses }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Weight on a focal set (0 if absent)
    pub fn mass(&self, set: &FocalSet) -> f64 {
        self.masses.get(set).copied().unwrap_or(0.0)
    }

    /// Contradiction mass `m(∅)`
    pub fn conflict(&self) -> f64 {
        self.mass(&FocalSet::EMPTY)
    }

    /// Focal sets with their weights, in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (&FocalSet, &f64)> {
        self.masses.iter()
    }

    pub fn focal_sets(&self) -> Vec<FocalMass> {
        self.masses
            .iter()
            .map(|(set, mass)| FocalMass {
                set: *set,
                mass: *mass,
            })
            .collect()
    }

    /// Number of focal sets
    pub fn len(&self) -> usize {
        self.masses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    /// Sum of all weights, ∅ included
    pub fn total(&self) -> f64 {
        self.masses.values().sum()
    }

    /// Σ m(A) over focal sets A ⊆ hypothesis. ∅ counts as a subset.
    pub fn belief(&self, hypothesis: &FocalSet) -> f64 {
        self.masses
            .iter()
            .filter(|(set, _)| set.is_subset_of(hypothesis))
            .map(|(_, mass)| mass)
            .sum()
    }

    /// `1 - bel(Θ \ hypothesis)`
    pub fn plausibility(&self, hypothesis: &FocalSet) -> f64 {
        1.0 - self.belief(&self.frame.complement(hypothesis))
    }

    /// `pl({stage}) - bel({stage})`: width of the epistemic interval
    /// (0 for stages outside the frame)
    pub fn uncertainty_gap(&self, stage: u32) -> f64 {
        if !self.frame.stages().contains(&stage) {
            return 0.0;
        }
        let h = FocalSet::singleton(stage);
        self.plausibility(&h) - self.belief(&h)
    }

    /// Pignistic transform (BetP).
    ///
    /// Every non-empty focal set shares its weight equally among its stages;
    /// the result is rescaled by the non-contradiction mass so it sums to 1.
    pub fn pignistic(&self) -> Result<Pignistic> {
        let resolved: f64 = self
            .masses
            .iter()
            .filter(|(set, _)| !set.is_empty())
            .map(|(_, mass)| mass)
            .sum();
        if resolved <= EPSILON {
            return Err(BeliefError::UnresolvedHypothesis);
        }

        let mut probabilities: BTreeMap<u32, f64> =
            self.frame.stages().iter().map(|s| (*s, 0.0)).collect();
        for (set, mass) in &self.masses {
            if set.is_empty() {
                continue;
            }
            let share = mass / (set.len() as f64 * resolved);
            for stage in set.stages() {
                *probabilities.entry(stage).or_insert(0.0) += share;
            }
        }

        Ok(Pignistic { probabilities })
    }

    /// Conjunctive (Dempster) combination with another mass function.
    ///
    /// Without normalization the empty-set bucket keeps the conflict mass.
    /// With normalization it is removed and the rest rescaled by `1 - k`.
    pub fn combine(&self, other: &MassFunction, normalize: bool) -> Result<Combination> {
        if self.frame != other.frame {
            return Err(BeliefError::FrameMismatch {
                left: self.frame.to_string(),
                right: other.frame.to_string(),
            });
        }

        let mut product: BTreeMap<FocalSet, f64> = BTreeMap::new();
        let mut conflict = 0.0;
        for (a, ma) in &self.masses {
            for (b, mb) in &other.masses {
                let weight = ma * mb;
                let meet = a.intersection(b);
                if meet.is_empty() {
                    conflict += weight;
                } else {
                    *product.entry(meet).or_insert(0.0) += weight;
                }
            }
        }

        if normalize {
            let norm = 1.0 - conflict;
            if norm <= EPSILON {
                return Err(BeliefError::DegenerateCombination { conflict });
            }
            for weight in product.values_mut() {
                *weight /= norm;
            }
        } else if conflict > 0.0 {
            product.insert(FocalSet::EMPTY, conflict);
        }

        Ok(Combination {
            mass: Self {
                frame: self.frame.clone(),
                masses: product,
            },
            conflict,
        })
    }

    /// Left fold of [`MassFunction::combine`] over a non-empty sequence.
    ///
    /// The conflict of a normalized fold is `1 - Π(1 - k_i)`, the empty-set
    /// mass the unnormalized fold would carry.
    pub fn combine_many<'a, I>(masses: I, normalize: bool) -> Result<Combination>
    where
        I: IntoIterator<Item = &'a MassFunction>,
    {
        let mut masses = masses.into_iter();
        let first = masses.next().ok_or(BeliefError::InsufficientEvidence {
            required: 1,
            active: 0,
            abstained: 0,
        })?;

        let mut acc = first.clone();
        let mut surviving = 1.0;
        for next in masses {
            let step = acc.combine(next, normalize).map_err(|err| match err {
                BeliefError::DegenerateCombination { conflict } => {
                    BeliefError::DegenerateCombination {
                        conflict: 1.0 - surviving * (1.0 - conflict),
                    }
                }
                other => other,
            })?;
            if normalize {
                surviving *= 1.0 - step.conflict;
            }
            acc = step.mass;
        }

        let conflict = if normalize {
            // Only a lone operand can still carry contradiction here.
            if acc.conflict() > 0.0 {
                surviving *= 1.0 - acc.conflict();
                acc = acc.normalized()?;
            }
            1.0 - surviving
        } else {
            acc.conflict()
        };

        Ok(Combination {
            mass: acc,
            conflict,
        })
    }

    /// Copy with the empty-set mass removed and the rest rescaled.
    pub fn normalized(&self) -> Result<MassFunction> {
        let conflict = self.conflict();
        let norm = 1.0 - conflict;
        if norm <= EPSILON {
            return Err(BeliefError::DegenerateCombination { conflict });
        }
        let masses = self
            .masses
            .iter()
            .filter(|(set, _)| !set.is_empty())
            .map(|(set, mass)| (*set, mass / norm))
            .collect();
        Ok(Self {
            frame: self.frame.clone(),
            masses,
        })
    }

    /// Elementwise comparison over the union of focal sets.
    pub fn approx_eq(&self, other: &MassFunction, tolerance: f64) -> bool {
        self.frame == other.frame
            && self
                .masses
                .keys()
                .chain(other.masses.keys())
                .all(|set| (self.mass(set) - other.mass(set)).abs() <= tolerance)
    }
}

impl From<MassFunction> for MassFunctionRepr {
    fn from(m: MassFunction) -> Self {
        Self {
            focal: m.focal_sets(),
            frame: m.frame,
        }
    }
}

impl TryFrom<MassFunctionRepr> for MassFunction {
    type Error = BeliefError;

    fn try_from(repr: MassFunctionRepr) -> Result<Self> {
        Self::new(repr.frame, repr.focal.into_iter().map(|f| (f.set, f.mass)))
    }
}

impl std::fmt::Display for MassFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .masses
            .iter()
            .map(|(set, mass)| format!("{}: {:.4}", set, mass))
            .collect();
        write!(f, "{{ {} }}", parts.join(", "))
    }
}

/// Pignistic probability distribution over the stages of a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pignistic {
    probabilities: BTreeMap<u32, f64>,
}

impl Pignistic {
    /// Probability of a stage (0 for stages outside the frame)
    pub fn get(&self, stage: u32) -> f64 {
        self.probabilities.get(&stage).copied().unwrap_or(0.0)
    }

    /// `(stage, probability)` in ascending stage order
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.probabilities.iter().map(|(s, p)| (*s, *p))
    }

    /// Probabilities in ascending stage order
    pub fn values(&self) -> Vec<f64> {
        self.probabilities.values().copied().collect()
    }

    pub fn sum(&self) -> f64 {
        self.probabilities.values().sum()
    }

    /// Arg-max stage; ties go to the smallest stage identifier.
    pub fn dominant(&self) -> u32 {
        let mut best = (0, f64::NEG_INFINITY);
        for (stage, p) in self.iter() {
            if p > best.1 {
                best = (stage, p);
            }
        }
        best.0
    }

    /// Largest probability
    pub fn conviction(&self) -> f64 {
        self.probabilities
            .values()
            .copied()
            .fold(0.0, f64::max)
    }
}
