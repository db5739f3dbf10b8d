//! Belief-function algebra
//!
//! Mass functions over the power set of a small frame of discernment, the
//! conjunctive combination rule in its open-world (unnormalized, TBM) and
//! closed-world (normalized, Dempster) forms, and the derived belief,
//! plausibility and pignistic quantities.
//!
//! # Example
//!
//! ```rust
//! use credal_core::mass::{FocalSet, Frame, MassFunction};
//!
//! let frame = Frame::ordinal(4).unwrap();
//! let two = FocalSet::from_stages([2]).unwrap();
//! let a = MassFunction::new(frame.clone(), [(two, 0.9), (frame.full(), 0.1)]).unwrap();
//! let b = MassFunction::vacuous(frame);
//!
//! let combined = a.combine(&b, false).unwrap();
//! assert_eq!(combined.conflict, 0.0);
//! assert_eq!(combined.mass.pignistic().unwrap().dominant(), 2);
//! ```

mod focal;
mod frame;
mod function;

pub use focal::{FocalSet, MAX_STAGE};
pub use frame::Frame;
pub use function::{
    Combination, FocalMass, MassFunction, Pignistic, EPSILON, MASS_SUM_TOLERANCE,
};

/// Conflict between two sources: empty-set mass of their unnormalized
/// combination. Used as a polarization measure between rater families.
pub fn cross_conflict(a: &MassFunction, b: &MassFunction) -> crate::Result<f64> {
    Ok(a.combine(b, false)?.conflict)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_conflict_of_disjoint_sources() {
        let frame = Frame::ordinal(4).unwrap();
        let a = MassFunction::new(frame.clone(), [(FocalSet::singleton(1), 1.0)]).unwrap();
        let b = MassFunction::new(
            frame.clone(),
            [(FocalSet::singleton(4), 0.5), (frame.full(), 0.5)],
        )
        .unwrap();
        let k = cross_conflict(&a, &b).unwrap();
        assert!((k - 0.5).abs() < 1e-12);
        assert_eq!(cross_conflict(&a, &a).unwrap(), 0.0);
    }
}
