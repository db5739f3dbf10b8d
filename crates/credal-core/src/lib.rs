//! Credal Core Engine
//!
//! Belief-function aggregation of ordinal verdicts. Raters propose subsets of
//! a small ordered frame of stages with a confidence; the engine encodes each
//! response as a Dempster-Shafer mass function, combines responses per
//! `(subject, group)` cell with conflict tracking, filters and pools the cells
//! per subject, and measures how stable the result is under resampling.
//!
//! # Features
//!
//! - `parallel` - Bootstrap subjects in parallel via rayon
//! - `native` - Enable all native optimizations (currently `parallel`)
//!
//! # Example
//!
//! ```rust
//! use credal_core::{Analysis, AnalysisConfig, Judgment, Verdict, WorldPolicy};
//!
//! let judgments = vec![
//!     Judgment::new("E1", "r1", Verdict::stages([2])).with_confidence(0.9),
//!     Judgment::new("E1", "r1", Verdict::stages([2, 3])).with_confidence(0.6),
//!     Judgment::new("E1", "r1", Verdict::Abstain).with_confidence(0.8),
//! ];
//!
//! let config = AnalysisConfig {
//!     policy: WorldPolicy::Closed,
//!     bootstrap_iterations: 100,
//!     ..AnalysisConfig::default()
//! };
//! let output = Analysis::new(config).unwrap().run(&judgments).unwrap();
//! assert_eq!(output.combined[0].dominant_stage, Some(2));
//! assert_eq!(output.aggregates[0].dominant_stage, Some(2));
//! ```

pub mod aggregate;
pub mod analysis;
pub mod bootstrap;
pub mod combine;
pub mod config;
pub mod encode;
pub mod error;
pub mod judgment;
pub mod logging;
pub mod mass;
pub mod metrics;
pub mod status;

// Re-export main types at crate root
pub use aggregate::{aggregate, AggregateResult, Aggregator, StageAggregate};
pub use analysis::{analyze_json, Analysis, AnalysisInput, AnalysisOutput};
pub use bootstrap::{
    bootstrap, BootstrapEstimator, StabilityReport, StageStability, SubjectEvidence,
};
pub use combine::{CombinedResult, EvidenceCombiner, StageBelief};
pub use config::{AnalysisConfig, Weighting};
pub use encode::{encode, Verdict, WorldPolicy};
pub use error::{BeliefError, Result};
pub use judgment::{GroupKey, Judgment};
pub use mass::{Combination, FocalSet, Frame, MassFunction, Pignistic};
pub use metrics::{DecisionGeometry, StabilitySummary};
pub use status::{DropReason, Status};
