//! BootstrapEstimator - resampled recombination of a subject's evidence

use std::sync::atomic::{AtomicBool, Ordering};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

#[cfg(all(not(target_arch = "wasm32"), feature = "parallel"))]
use rayon::prelude::*;

use super::report::{StabilityReport, StageStability};
use crate::aggregate::quantile::mean;
use crate::combine::combine_closed;
use crate::error::{BeliefError, Result};
use crate::logging::prefix;
use crate::mass::MassFunction;
use crate::status::{DropReason, Status};

pub const DEFAULT_ITERATIONS: usize = 1000;
pub const DEFAULT_SEED: u64 = 42;
/// Fewest mass functions worth resampling
pub const MIN_MASSES: usize = 2;

/// Encoded evidence for one subject, pooled across its groups
#[derive(Debug, Clone)]
pub struct SubjectEvidence {
    pub subject_id: String,
    pub masses: Vec<MassFunction>,
    pub n_abstained: usize,
}

impl SubjectEvidence {
    pub fn new(subject_id: impl Into<String>, masses: Vec<MassFunction>) -> Self {
        Self {
            subject_id: subject_id.into(),
            masses,
            n_abstained: 0,
        }
    }

    pub fn with_abstained(mut self, n_abstained: usize) -> Self {
        self.n_abstained = n_abstained;
        self
    }
}

/// Seeded bootstrap over combined mass functions
#[derive(Debug, Clone)]
pub struct BootstrapEstimator {
    iterations: usize,
    seed: u64,
}

impl Default for BootstrapEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS, DEFAULT_SEED)
    }
}

impl BootstrapEstimator {
    pub fn new(iterations: usize, seed: u64) -> Self {
        Self { iterations, seed }
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Estimate with the configured seed.
    pub fn estimate(&self, evidence: &SubjectEvidence) -> Result<StabilityReport> {
        self.estimate_with_seed(evidence, self.seed, None)
    }

    /// Estimate with an explicit seed, checking `cancel` between iterations.
    ///
    /// Evidence problems (too few masses, degenerate point estimate, every
    /// iteration degenerate) yield a dropped report. Frame mismatches and
    /// cancellation are errors; a cancelled run never returns a partial report.
    pub fn estimate_with_seed(
        &self,
        evidence: &SubjectEvidence,
        seed: u64,
        cancel: Option<&AtomicBool>,
    ) -> Result<StabilityReport> {
        if self.iterations == 0 {
            return Err(BeliefError::InvalidConfig(
                "bootstrap needs at least one iteration".to_string(),
            ));
        }

        let masses = &evidence.masses;
        let n = masses.len();
        let mut report =
            StabilityReport::new(&evidence.subject_id, n, evidence.n_abstained, self.iterations);

        if n < MIN_MASSES {
            report.status = Status::dropped(DropReason::InsufficientEvidence {
                required: MIN_MASSES,
                active: n,
                abstained: evidence.n_abstained,
            });
            debug!(
                "{} {} skipped: {} active, {} abstained",
                prefix::BOOTSTRAP,
                evidence.subject_id,
                n,
                evidence.n_abstained
            );
            return Ok(report);
        }

        let point = combine_closed(masses)?;
        report.conflict_point = Some(point.conflict);
        let Some(point_mass) = point.mass else {
            report.status = Status::dropped(DropReason::DegenerateCombination {
                conflict: point.conflict,
            });
            return Ok(report);
        };
        let point_pignistic = point_mass.pignistic()?;
        let point_dominant = point_pignistic.dominant();
        report.dominant_stage = Some(point_dominant);

        let stages = point_mass.frame().stages().to_vec();
        let mut draws: Vec<Vec<f64>> = vec![Vec::with_capacity(self.iterations); stages.len()];
        let mut conflicts = Vec::with_capacity(self.iterations);
        let mut flips = 0usize;

        let mut rng = StdRng::seed_from_u64(seed);
        let mut sample: Vec<&MassFunction> = Vec::with_capacity(n);
        for completed in 0..self.iterations {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                return Err(BeliefError::Cancelled {
                    completed,
                    requested: self.iterations,
                });
            }

            sample.clear();
            sample.extend((0..n).map(|_| &masses[rng.gen_range(0..n)]));

            let combined = combine_closed(sample.iter().copied())?;
            conflicts.push(combined.conflict);

            let Some(mass) = combined.mass else {
                report.n_degenerate += 1;
                flips += 1;
                continue;
            };
            let pignistic = mass.pignistic()?;
            if pignistic.dominant() != point_dominant {
                flips += 1;
            }
            for (column, &stage) in draws.iter_mut().zip(&stages) {
                column.push(pignistic.get(stage));
            }
        }

        report.conflict_mean = mean(&conflicts);
        report.flip_rate = Some(flips as f64 / self.iterations as f64);

        let summarized: Option<Vec<StageStability>> = stages
            .iter()
            .zip(&draws)
            .map(|(&stage, column)| {
                StageStability::from_samples(stage, point_pignistic.get(stage), column)
            })
            .collect();
        match summarized {
            Some(stages) => report.stages = stages,
            None => {
                report.status = Status::dropped(DropReason::DegenerateCombination {
                    conflict: report.conflict_mean.unwrap_or(1.0),
                });
            }
        }

        debug!(
            "{} {} flip rate {:.3}, {} degenerate of {}",
            prefix::BOOTSTRAP,
            evidence.subject_id,
            report.flip_rate.unwrap_or(0.0),
            report.n_degenerate,
            self.iterations
        );

        Ok(report)
    }

    /// Estimate every subject, seeding subject `i` with `seed + i`.
    ///
    /// Reports come back in input order whether or not the run is parallel.
    pub fn estimate_all(
        &self,
        subjects: &[SubjectEvidence],
        cancel: Option<&AtomicBool>,
    ) -> Result<Vec<StabilityReport>> {
        let reports = self.estimate_each(subjects, cancel)?;
        let usable = reports.iter().filter(|r| r.is_usable()).count();
        info!(
            "{} {} subjects, {} stable estimates, {} iterations each",
            prefix::BOOTSTRAP,
            reports.len(),
            usable,
            self.iterations
        );
        Ok(reports)
    }

    #[cfg(all(not(target_arch = "wasm32"), feature = "parallel"))]
    fn estimate_each(
        &self,
        subjects: &[SubjectEvidence],
        cancel: Option<&AtomicBool>,
    ) -> Result<Vec<StabilityReport>> {
        subjects
            .par_iter()
            .enumerate()
            .map(|(idx, evidence)| {
                self.estimate_with_seed(evidence, self.seed.wrapping_add(idx as u64), cancel)
            })
            .collect()
    }

    #[cfg(any(target_arch = "wasm32", not(feature = "parallel")))]
    fn estimate_each(
        &self,
        subjects: &[SubjectEvidence],
        cancel: Option<&AtomicBool>,
    ) -> Result<Vec<StabilityReport>> {
        subjects
            .iter()
            .enumerate()
            .map(|(idx, evidence)| {
                self.estimate_with_seed(evidence, self.seed.wrapping_add(idx as u64), cancel)
            })
            .collect()
    }
}

/// Bootstrap one subject's mass functions.
pub fn bootstrap(
    subject_id: &str,
    masses: &[MassFunction],
    n_iterations: usize,
    seed: u64,
) -> Result<StabilityReport> {
    let evidence = SubjectEvidence::new(subject_id, masses.to_vec());
    BootstrapEstimator::new(n_iterations, seed).estimate(&evidence)
}
