//! Bootstrap stability estimation
//!
//! Resamples a subject's mass functions with replacement, recombines each
//! draw twice (unnormalized for conflict, normalized for pignistic values)
//! and reports percentile intervals and how often the dominant stage flips.
//!
//! Runs are reproducible from the seed. With the `parallel` feature,
//! [`BootstrapEstimator::estimate_all`] spreads subjects over the rayon pool.

mod estimator;
mod report;

pub use estimator::{
    bootstrap, BootstrapEstimator, SubjectEvidence, DEFAULT_ITERATIONS, DEFAULT_SEED, MIN_MASSES,
};
pub use report::{StabilityReport, StageStability};
