//! Conflict filtering and weighted aggregation
//!
//! Group results whose conflict reaches the operating threshold are dropped;
//! the rest are pooled per subject with quality-weighted means and weighted
//! 10th/90th percentiles of pignistic probability.

mod aggregator;
pub mod quantile;

pub use aggregator::{aggregate, AggregateResult, Aggregator, StageAggregate};
pub use quantile::{weighted_mean, weighted_quantile};
