//! Judgment records and grouping.
//!
//! The input table is flat: one row per rater response. Combination reasons
//! about all rows sharing a `(group_id, subject_id)` pair; aggregation and the
//! bootstrap reason about all rows of one subject. This module provides both
//! views in deterministic (sorted) order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::encode::Verdict;

/// Confidence assumed when a row carries none.
pub const DEFAULT_CONFIDENCE: f64 = 1.0;

/// One rater's response to one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Judgment {
    /// Evidence item being judged
    pub subject_id: String,
    /// Independent evidence source (e.g. rubric) that produced the judgment
    pub group_id: String,
    pub verdict: Verdict,
    /// Confidence in `[0, 1]`; `None` means fully confident
    #[serde(default)]
    pub confidence: Option<f64>,
    /// External quality signal for the group, used as aggregation weight
    #[serde(default)]
    pub quality_weight: Option<f64>,
}

impl Judgment {
    pub fn new(subject_id: impl Into<String>, group_id: impl Into<String>, verdict: Verdict) -> Self {
        Self {
            subject_id: subject_id.into(),
            group_id: group_id.into(),
            verdict,
            confidence: None,
            quality_weight: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_quality_weight(mut self, weight: f64) -> Self {
        self.quality_weight = Some(weight);
        self
    }

    /// Confidence with the default applied
    pub fn confidence(&self) -> f64 {
        self.confidence.unwrap_or(DEFAULT_CONFIDENCE)
    }
}

/// Key of one combination cell
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub subject_id: String,
    pub group_id: String,
}

/// Group judgments by `(subject_id, group_id)`, sorted by key.
pub fn group_by_cell(judgments: &[Judgment]) -> BTreeMap<GroupKey, Vec<&Judgment>> {
    let mut map: BTreeMap<GroupKey, Vec<&Judgment>> = BTreeMap::new();
    for judgment in judgments {
        let key = GroupKey {
            subject_id: judgment.subject_id.clone(),
            group_id: judgment.group_id.clone(),
        };
        map.entry(key).or_default().push(judgment);
    }
    map
}

/// Group judgments by subject, sorted by subject id.
pub fn group_by_subject(judgments: &[Judgment]) -> BTreeMap<String, Vec<&Judgment>> {
    let mut map: BTreeMap<String, Vec<&Judgment>> = BTreeMap::new();
    for judgment in judgments {
        map.entry(judgment.subject_id.clone())
            .or_default()
            .push(judgment);
    }
    map
}

/// Mean quality weight per group over rows that carry one.
///
/// Non-finite values are ignored; groups with no usable value are absent.
pub fn quality_by_group(judgments: &[Judgment]) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for judgment in judgments {
        if let Some(w) = judgment.quality_weight.filter(|w| w.is_finite()) {
            let entry = sums.entry(judgment.group_id.clone()).or_insert((0.0, 0));
            entry.0 += w;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(group, (sum, n))| (group, sum / n as f64))
        .collect()
}
