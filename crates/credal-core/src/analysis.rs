//! Batch analysis pipeline and JSON entry point.
//!
//! Runs the whole chain over a judgment table: combination per
//! `(subject_id, group_id)` cell, conflict filtering and weighted aggregation
//! per subject, and bootstrap stability per subject with a run-wide summary.

use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregate::{AggregateResult, Aggregator};
use crate::bootstrap::{BootstrapEstimator, StabilityReport, SubjectEvidence};
use crate::combine::{CombinedResult, EvidenceCombiner};
use crate::config::{AnalysisConfig, Weighting};
use crate::encode::WorldPolicy;
use crate::error::Result;
use crate::judgment::{group_by_subject, quality_by_group, Judgment};
use crate::logging::prefix;
use crate::metrics::{DecisionGeometry, StabilitySummary};
use crate::mass::Frame;

/// Input for [`analyze_json`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisInput {
    pub judgments: Vec<Judgment>,
    /// Analysis configuration (uses defaults if omitted)
    #[serde(default)]
    pub config: AnalysisConfig,
}

/// Everything one run produces. Dropped cells and subjects are listed too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub config: AnalysisConfig,
    pub combined: Vec<CombinedResult>,
    pub aggregates: Vec<AggregateResult>,
    pub stability: Vec<StabilityReport>,
    /// Interval-width summary over usable subject estimates
    pub stability_summary: Option<StabilitySummary>,
    /// Decision-space geometry, with two or more usable subject estimates
    pub geometry: Option<DecisionGeometry>,
}

/// Configured pipeline
#[derive(Debug, Clone)]
pub struct Analysis {
    config: AnalysisConfig,
    combiner: EvidenceCombiner,
    aggregator: Aggregator,
    estimator: BootstrapEstimator,
}

impl Analysis {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let frame = config.frame()?;
        Ok(Self {
            combiner: EvidenceCombiner::new(frame, config.policy)
                .with_conflict_threshold(config.conflict_threshold),
            aggregator: Aggregator::new(config.conflict_threshold),
            estimator: BootstrapEstimator::new(config.bootstrap_iterations, config.seed),
            config,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn frame(&self) -> &Frame {
        self.combiner.frame()
    }

    /// Combine every cell of the table.
    pub fn combine(&self, judgments: &[Judgment]) -> Result<Vec<CombinedResult>> {
        self.combiner.combine_table(judgments)
    }

    /// Aggregate combined cells per subject with the configured weighting.
    pub fn aggregate(
        &self,
        judgments: &[Judgment],
        combined: &[CombinedResult],
    ) -> Result<Vec<AggregateResult>> {
        let weights = match self.config.weighting {
            Weighting::Quality => quality_by_group(judgments),
            Weighting::Uniform => BTreeMap::new(),
        };
        self.aggregator.aggregate_all(combined, &weights)
    }

    /// Closed-world evidence per subject for the bootstrap, pooling every
    /// group's judgments of that subject.
    ///
    /// The bootstrap recombines with normalization, so abstentions are
    /// dropped and counted whatever the configured policy.
    pub fn stability_evidence(&self, judgments: &[Judgment]) -> Result<Vec<SubjectEvidence>> {
        let encoder = EvidenceCombiner::new(self.frame().clone(), WorldPolicy::Closed);
        group_by_subject(judgments)
            .into_iter()
            .map(|(subject_id, rows)| -> Result<SubjectEvidence> {
                let encoded = encoder.encode_all(&rows)?;
                Ok(SubjectEvidence::new(subject_id, encoded.masses)
                    .with_abstained(encoded.n_abstained))
            })
            .collect()
    }

    pub fn run(&self, judgments: &[Judgment]) -> Result<AnalysisOutput> {
        self.run_with_cancel(judgments, None)
    }

    /// Run the pipeline; `cancel` is checked between bootstrap iterations.
    pub fn run_with_cancel(
        &self,
        judgments: &[Judgment],
        cancel: Option<&AtomicBool>,
    ) -> Result<AnalysisOutput> {
        let combined = self.combine(judgments)?;
        let aggregates = self.aggregate(judgments, &combined)?;
        let evidence = self.stability_evidence(judgments)?;
        let stability = self.estimator.estimate_all(&evidence, cancel)?;

        let stability_summary = StabilitySummary::from_reports(&stability);
        let geometry = DecisionGeometry::from_reports(&stability);

        info!(
            "{} {} judgments: {} cells, {} subjects ({} usable), {} stable subjects",
            prefix::RUN,
            judgments.len(),
            combined.len(),
            aggregates.len(),
            aggregates.iter().filter(|a| a.is_usable()).count(),
            stability.iter().filter(|s| s.is_usable()).count()
        );

        Ok(AnalysisOutput {
            config: self.config.clone(),
            combined,
            aggregates,
            stability,
            stability_summary,
            geometry,
        })
    }
}

/// Analyze a JSON request.
///
/// Takes `{"judgments": [...], "config": {...}}` and returns the serialized
/// [`AnalysisOutput`], or `{"error": "..."}`.
pub fn analyze_json(input: &str) -> String {
    let parsed: AnalysisInput = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(e) => return error_json(&format!("invalid analysis input: {}", e)),
    };

    let output = Analysis::new(parsed.config).and_then(|analysis| analysis.run(&parsed.judgments));
    match output {
        Ok(output) => match serde_json::to_string(&output) {
            Ok(json) => json,
            Err(e) => error_json(&format!("serialization failed: {}", e)),
        },
        Err(e) => error_json(&e.to_string()),
    }
}

fn error_json(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::Verdict;
    use crate::status::DropReason;
    use pretty_assertions::assert_eq;

    fn table() -> Vec<Judgment> {
        vec![
            Judgment::new("E1", "r1", Verdict::stages([2])).with_confidence(0.9),
            Judgment::new("E1", "r1", Verdict::stages([2, 3])).with_confidence(0.6),
            Judgment::new("E1", "r1", Verdict::Abstain).with_confidence(0.8),
            Judgment::new("E1", "r2", Verdict::stages([2])).with_confidence(0.7),
            Judgment::new("E1", "r2", Verdict::stages([2])).with_confidence(0.5),
            Judgment::new("E2", "r1", Verdict::stages([4])).with_confidence(0.8),
            Judgment::new("E2", "r1", Verdict::stages([3, 4])).with_confidence(0.7),
            Judgment::new("E2", "r2", Verdict::stages([1])).with_quality_weight(0.2),
        ]
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            bootstrap_iterations: 50,
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn run_lists_every_cell_and_subject() {
        let output = Analysis::new(config()).unwrap().run(&table()).unwrap();
        assert_eq!(output.combined.len(), 4);
        assert_eq!(output.aggregates.len(), 2);
        assert_eq!(output.stability.len(), 2);

        let e1 = &output.aggregates[0];
        assert_eq!(e1.subject_id, "E1");
        assert_eq!(e1.dominant_stage, Some(2));
        assert!((e1.pignistic_sum() - 1.0).abs() < 1e-6);

        let subjects: Vec<&str> = output
            .stability
            .iter()
            .map(|s| s.subject_id.as_str())
            .collect();
        assert_eq!(subjects, vec!["E1", "E2"]);
    }

    #[test]
    fn bootstrap_drops_abstentions_under_open_policy() {
        let output = Analysis::new(config()).unwrap().run(&table()).unwrap();
        let e1 = &output.stability[0];
        assert_eq!(e1.n_active, 4);
        assert_eq!(e1.n_abstained, 1);
        assert!(e1.is_usable());
        assert_eq!(e1.dominant_stage, Some(2));
    }

    #[test]
    fn bootstrap_pools_groups_per_subject() {
        let judgments = vec![
            Judgment::new("E1", "r1", Verdict::stages([2])).with_confidence(0.9),
            Judgment::new("E1", "r2", Verdict::stages([2])).with_confidence(0.8),
            Judgment::new("E1", "r3", Verdict::stages([3])).with_confidence(0.6),
        ];
        let config = AnalysisConfig {
            policy: WorldPolicy::Closed,
            ..config()
        };
        let output = Analysis::new(config).unwrap().run(&judgments).unwrap();

        assert_eq!(output.combined.len(), 3);
        assert_eq!(output.stability.len(), 1);
        let report = &output.stability[0];
        assert_eq!(report.subject_id, "E1");
        assert_eq!(report.n_active, 3);
        assert!(report.is_usable());
        assert_eq!(report.dominant_stage, Some(2));
        assert!(report.flip_rate.is_some());
    }

    #[test]
    fn insufficient_subject_is_listed_but_not_summarized() {
        let judgments = vec![
            Judgment::new("E1", "r1", Verdict::stages([2])).with_confidence(0.9),
            Judgment::new("E1", "r2", Verdict::stages([2, 3])).with_confidence(0.5),
            Judgment::new("E2", "r1", Verdict::stages([4])).with_confidence(0.7),
            Judgment::new("E2", "r2", Verdict::Abstain),
        ];
        let output = Analysis::new(config()).unwrap().run(&judgments).unwrap();

        assert_eq!(output.stability.len(), 2);
        assert!(matches!(
            output.stability[1].status.reason(),
            Some(DropReason::InsufficientEvidence {
                active: 1,
                abstained: 1,
                ..
            })
        ));

        let summary = output.stability_summary.unwrap();
        // One usable subject over a four-stage frame
        assert_eq!(summary.n_cells, 4);
        assert!(output.geometry.is_none());
    }

    #[test]
    fn summaries_span_all_subjects() {
        let output = Analysis::new(config()).unwrap().run(&table()).unwrap();
        let summary = output.stability_summary.unwrap();
        assert_eq!(summary.n_cells, 8);
        let geometry = output.geometry.unwrap();
        assert_eq!(geometry.n_subjects, 2);
        assert!(geometry.mean_pairwise_dist > 0.0);
    }

    #[test]
    fn json_round_trip() {
        let input = serde_json::json!({
            "judgments": [
                {"subject_id": "E1", "group_id": "r1", "verdict": [2], "confidence": 0.9},
                {"subject_id": "E1", "group_id": "r1", "verdict": [2, 3], "confidence": 0.6},
                {"subject_id": "E1", "group_id": "r1", "verdict": "abstain", "confidence": 0.8}
            ],
            "config": {"policy": "closed", "bootstrap_iterations": 20}
        });
        let json = analyze_json(&input.to_string());
        let output: AnalysisOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(output.config.policy, WorldPolicy::Closed);
        assert_eq!(output.combined[0].dominant_stage, Some(2));
        assert_eq!(output.combined[0].n_abstained, 1);
    }

    #[test]
    fn json_errors_are_reported() {
        let value: serde_json::Value = serde_json::from_str(&analyze_json("not json")).unwrap();
        assert!(value["error"]
            .as_str()
            .unwrap()
            .starts_with("invalid analysis input"));

        let bad_config = r#"{"judgments": [], "config": {"conflict_threshold": 2.0}}"#;
        let value: serde_json::Value = serde_json::from_str(&analyze_json(bad_config)).unwrap();
        assert!(value["error"].as_str().unwrap().contains("conflict_threshold"));

        let bad_verdict = r#"{"judgments": [{"subject_id": "E1", "group_id": "r1", "verdict": [9]}]}"#;
        let value: serde_json::Value = serde_json::from_str(&analyze_json(bad_verdict)).unwrap();
        assert!(value["error"].is_string());
    }
}
