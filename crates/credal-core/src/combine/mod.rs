//! Evidence combination per `(subject_id, group_id)` cell
//!
//! Open world folds the cell's mass functions with the unnormalized rule and
//! reports contradiction as data. Closed world folds twice: unnormalized to
//! observe the conflict, normalized to obtain usable values.
//!
//! # Example
//!
//! ```rust
//! use credal_core::combine::EvidenceCombiner;
//! use credal_core::encode::{Verdict, WorldPolicy};
//! use credal_core::judgment::Judgment;
//! use credal_core::mass::Frame;
//!
//! let rows = vec![
//!     Judgment::new("E1", "rubric-a", Verdict::Stages(vec![2])).with_confidence(0.9),
//!     Judgment::new("E1", "rubric-a", Verdict::Stages(vec![2, 3])).with_confidence(0.6),
//! ];
//! let combiner = EvidenceCombiner::new(Frame::ordinal(4).unwrap(), WorldPolicy::Closed);
//! let results = combiner.combine_table(&rows).unwrap();
//! assert_eq!(results[0].dominant_stage, Some(2));
//! ```

mod combiner;
mod types;

pub use combiner::{
    combine_closed, ClosedCombination, EncodedGroup, EvidenceCombiner, DEFAULT_CONFLICT_THRESHOLD,
};
pub use types::{CombinedResult, StageBelief};
