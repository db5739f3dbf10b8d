//! Distribution-level metrics over verdicts and stability reports

use serde::{Deserialize, Serialize};

use crate::aggregate::quantile::{mean, quantile, std_dev};
use crate::bootstrap::StabilityReport;
use crate::encode::Verdict;

/// Interval width above which a stage estimate counts as unstable
pub const UNSTABLE_CI_WIDTH: f64 = 0.1;
/// Conviction above which a distribution counts as decisive
pub const DECISIVE_PIGNISTIC: f64 = 0.8;

/// Smoothing added to every probability before taking logarithms
const ENTROPY_SMOOTHING: f64 = 1e-10;

/// Normalize to sum 1. `None` when the total is not positive.
fn normalize(values: &[f64]) -> Option<Vec<f64>> {
    let total: f64 = values.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return None;
    }
    Some(values.iter().map(|v| v / total).collect())
}

fn kl_base2(p: &[f64], m: &[f64]) -> f64 {
    p.iter()
        .zip(m)
        .filter(|(pi, _)| **pi > 0.0)
        .map(|(pi, mi)| pi * (pi / mi).log2())
        .sum()
}

/// Jensen-Shannon divergence (base 2, in `[0, 1]`) between two score
/// distributions, each normalized first.
///
/// `None` for mismatched lengths or an all-zero distribution.
pub fn jsd_polarization(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }
    let p = normalize(a)?;
    let q = normalize(b)?;
    let m: Vec<f64> = p.iter().zip(&q).map(|(x, y)| 0.5 * (x + y)).collect();
    let jsd = 0.5 * kl_base2(&p, &m) + 0.5 * kl_base2(&q, &m);
    Some(jsd.clamp(0.0, 1.0))
}

/// Polarization scaled by mean agreement probability
pub fn entrenchment_index(polarization: f64, mean_agreement: f64) -> f64 {
    polarization * mean_agreement
}

/// Mean absolute change between paired probabilities
pub fn swap_sensitivity(original: &[f64], swapped: &[f64]) -> Option<f64> {
    if original.len() != swapped.len() {
        return None;
    }
    let deltas: Vec<f64> = original
        .iter()
        .zip(swapped)
        .map(|(a, b)| (a - b).abs())
        .collect();
    mean(&deltas)
}

/// Histogram over stages `1..=scale_size`.
///
/// Each verdict spreads one unit evenly over its stages; stages outside the
/// scale keep their share but land in no bin. Abstentions are skipped.
pub fn score_histogram(verdicts: &[Verdict], scale_size: usize) -> Vec<f64> {
    let mut hist = vec![0.0; scale_size];
    for verdict in verdicts {
        let Verdict::Stages(stages) = verdict else {
            continue;
        };
        if stages.is_empty() {
            continue;
        }
        let weight = 1.0 / stages.len() as f64;
        for &stage in stages {
            let stage = stage as usize;
            if (1..=scale_size).contains(&stage) {
                hist[stage - 1] += weight;
            }
        }
    }
    hist
}

/// Shannon entropy in bits, after smoothing and renormalizing.
pub fn shannon_entropy(probabilities: &[f64]) -> Option<f64> {
    let smoothed: Vec<f64> = probabilities.iter().map(|p| p + ENTROPY_SMOOTHING).collect();
    let p = normalize(&smoothed)?;
    Some(-p.iter().map(|pi| pi * pi.log2()).sum::<f64>())
}

/// Entropy divided by its maximum `log2(n)`; 1-stage frames use divisor 1.
pub fn normalized_entropy(probabilities: &[f64]) -> Option<f64> {
    let max = if probabilities.len() > 1 {
        (probabilities.len() as f64).log2()
    } else {
        1.0
    };
    Some(shannon_entropy(probabilities)? / max)
}

/// Interval-width summary over every (subject, stage) cell of usable reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilitySummary {
    pub n_cells: usize,
    pub mean_ci_width: f64,
    pub median_ci_width: f64,
    pub max_ci_width: f64,
    /// Share of cells wider than [`UNSTABLE_CI_WIDTH`]
    pub frac_unstable: f64,
    pub mean_std: f64,
    pub mean_conflict: Option<f64>,
}

impl StabilitySummary {
    /// `None` when no usable report has stage statistics.
    pub fn from_reports(reports: &[StabilityReport]) -> Option<Self> {
        let cells: Vec<_> = reports
            .iter()
            .filter(|r| r.is_usable())
            .flat_map(|r| r.stages.iter())
            .collect();
        if cells.is_empty() {
            return None;
        }

        let widths: Vec<f64> = cells.iter().map(|c| c.ci_width).collect();
        let stds: Vec<f64> = cells.iter().map(|c| c.std).collect();
        let conflicts: Vec<f64> = reports
            .iter()
            .filter(|r| r.is_usable())
            .filter_map(|r| r.conflict_mean)
            .collect();
        let unstable = widths.iter().filter(|w| **w > UNSTABLE_CI_WIDTH).count();

        Some(Self {
            n_cells: cells.len(),
            mean_ci_width: mean(&widths)?,
            median_ci_width: quantile(&widths, 0.5)?,
            max_ci_width: widths.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            frac_unstable: unstable as f64 / cells.len() as f64,
            mean_std: mean(&stds)?,
            mean_conflict: mean(&conflicts),
        })
    }
}

/// Spread of point pignistic vectors across subjects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionGeometry {
    pub n_subjects: usize,
    /// Euclidean distance over all subject pairs
    pub mean_pairwise_dist: f64,
    pub std_pairwise_dist: f64,
    pub mean_entropy: f64,
    pub std_entropy: f64,
    /// Share of subjects whose conviction exceeds [`DECISIVE_PIGNISTIC`]
    pub discreteness: f64,
}

impl DecisionGeometry {
    /// `None` with fewer than two usable reports.
    pub fn from_reports(reports: &[StabilityReport]) -> Option<Self> {
        let vectors: Vec<Vec<f64>> = reports
            .iter()
            .filter(|r| r.is_usable())
            .filter_map(StabilityReport::point_vector)
            .collect();
        if vectors.len() < 2 {
            return None;
        }

        let mut distances = Vec::with_capacity(vectors.len() * (vectors.len() - 1) / 2);
        for (i, a) in vectors.iter().enumerate() {
            for b in &vectors[i + 1..] {
                let d2: f64 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
                distances.push(d2.sqrt());
            }
        }

        let entropies: Vec<f64> = vectors
            .iter()
            .filter_map(|v| shannon_entropy(v))
            .collect();
        let decisive = vectors
            .iter()
            .filter(|v| v.iter().copied().fold(0.0, f64::max) > DECISIVE_PIGNISTIC)
            .count();

        Some(Self {
            n_subjects: vectors.len(),
            mean_pairwise_dist: mean(&distances)?,
            std_pairwise_dist: std_dev(&distances)?,
            mean_entropy: mean(&entropies)?,
            std_entropy: std_dev(&entropies)?,
            discreteness: decisive as f64 / vectors.len() as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::StageStability;
    use crate::status::{DropReason, Status};
    use pretty_assertions::assert_eq;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn report(subject: &str, points: &[f64], widths: &[f64]) -> StabilityReport {
        StabilityReport {
            subject_id: subject.to_string(),
            n_active: 3,
            n_abstained: 0,
            abstain_rate: 0.0,
            n_iterations: 10,
            n_degenerate: 0,
            conflict_point: Some(0.2),
            conflict_mean: Some(0.25),
            dominant_stage: Some(1),
            flip_rate: Some(0.0),
            stages: points
                .iter()
                .zip(widths)
                .enumerate()
                .map(|(i, (&point, &width))| StageStability {
                    stage: i as u32 + 1,
                    point,
                    mean: point,
                    q025: point - width / 2.0,
                    q975: point + width / 2.0,
                    std: width / 4.0,
                    ci_width: width,
                })
                .collect(),
            status: Status::Ok,
        }
    }

    #[test]
    fn jsd_bounds() {
        assert!(close(jsd_polarization(&[1.0, 0.0], &[0.0, 1.0]).unwrap(), 1.0));
        assert!(close(jsd_polarization(&[2.0, 2.0], &[1.0, 1.0]).unwrap(), 0.0));
        let mid = jsd_polarization(&[3.0, 1.0], &[1.0, 3.0]).unwrap();
        assert!(mid > 0.0 && mid < 1.0);
        assert!(jsd_polarization(&[0.0, 0.0], &[1.0, 1.0]).is_none());
        assert!(jsd_polarization(&[1.0], &[1.0, 1.0]).is_none());
    }

    #[test]
    fn histogram_splits_subset_verdicts() {
        let verdicts = vec![
            Verdict::stages([2]),
            Verdict::stages([2, 3]),
            Verdict::Abstain,
            Verdict::stages([4, 9]),
        ];
        assert_eq!(score_histogram(&verdicts, 4), vec![0.0, 1.5, 0.5, 0.5]);
    }

    #[test]
    fn entropy_extremes() {
        assert!(close(normalized_entropy(&[0.25; 4]).unwrap(), 1.0));
        assert!(normalized_entropy(&[1.0, 0.0, 0.0, 0.0]).unwrap() < 1e-6);
        assert!(close(shannon_entropy(&[0.5, 0.5]).unwrap(), 1.0));
    }

    #[test]
    fn swap_and_entrenchment() {
        assert!(close(swap_sensitivity(&[0.2, 0.8], &[0.4, 0.4]).unwrap(), 0.3));
        assert!(close(entrenchment_index(0.5, 0.6), 0.3));
    }

    #[test]
    fn stability_summary_skips_dropped_reports() {
        let mut dropped = report("c", &[0.5, 0.5], &[0.9, 0.9]);
        dropped.status = Status::dropped(DropReason::UnresolvedHypothesis);
        let reports = vec![
            report("a", &[0.9, 0.1], &[0.05, 0.05]),
            report("b", &[0.4, 0.6], &[0.2, 0.3]),
            dropped,
        ];
        let summary = StabilitySummary::from_reports(&reports).unwrap();
        assert_eq!(summary.n_cells, 4);
        assert!(close(summary.mean_ci_width, 0.15));
        assert!(close(summary.median_ci_width, 0.125));
        assert!(close(summary.max_ci_width, 0.3));
        assert!(close(summary.frac_unstable, 0.5));
        assert_eq!(summary.mean_conflict, Some(0.25));
        assert!(StabilitySummary::from_reports(&[]).is_none());
    }

    #[test]
    fn decision_geometry_of_two_subjects() {
        let reports = vec![
            report("a", &[1.0, 0.0], &[0.0, 0.0]),
            report("b", &[0.0, 1.0], &[0.0, 0.0]),
        ];
        let geometry = DecisionGeometry::from_reports(&reports).unwrap();
        assert_eq!(geometry.n_subjects, 2);
        assert!(close(geometry.mean_pairwise_dist, 2f64.sqrt()));
        assert!(close(geometry.std_pairwise_dist, 0.0));
        assert!(close(geometry.discreteness, 1.0));
        assert!(geometry.mean_entropy < 1e-6);
        assert!(DecisionGeometry::from_reports(&reports[..1]).is_none());
    }
}
