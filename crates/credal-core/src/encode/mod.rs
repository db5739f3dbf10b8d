//! Verdict encoding
//!
//! Maps one rater's response (stages or abstain, plus a confidence) into a
//! mass function under a [`WorldPolicy`].

mod policy;
mod verdict;

pub use policy::WorldPolicy;
pub use verdict::Verdict;

use crate::error::Result;
use crate::mass::{Frame, MassFunction};

/// Encode a verdict. Returns `None` only for a closed-world abstention.
pub fn encode(
    verdict: &Verdict,
    confidence: f64,
    frame: &Frame,
    policy: WorldPolicy,
) -> Result<Option<MassFunction>> {
    policy.encode(verdict, confidence, frame)
}
