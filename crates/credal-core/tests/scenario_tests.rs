//! End-to-end tests over judgment tables

use credal_core::{
    analyze_json, encode, Analysis, AnalysisConfig, AnalysisOutput, DropReason, EvidenceCombiner,
    FocalSet, Frame, GroupKey, Judgment, MassFunction, Verdict, Weighting, WorldPolicy,
};
use pretty_assertions::assert_eq;

/// The three-judgment cell: a point verdict, a two-stage verdict, an abstention
fn three_raters() -> Vec<Judgment> {
    vec![
        Judgment::new("E1", "r1", Verdict::stages([2])).with_confidence(0.9),
        Judgment::new("E1", "r1", Verdict::stages([2, 3])).with_confidence(0.6),
        Judgment::new("E1", "r1", Verdict::Abstain).with_confidence(0.8),
    ]
}

fn combine(policy: WorldPolicy, judgments: &[Judgment]) -> credal_core::CombinedResult {
    let combiner = EvidenceCombiner::new(Frame::ordinal(4).unwrap(), policy);
    let rows: Vec<&Judgment> = judgments.iter().collect();
    let key = GroupKey {
        subject_id: "E1".into(),
        group_id: "r1".into(),
    };
    combiner.combine_group(&key, &rows).unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_open_world_encoding_of_three_raters() {
    let frame = Frame::ordinal(4).unwrap();
    let expected = [
        MassFunction::new(
            frame.clone(),
            [(FocalSet::singleton(2), 0.9), (frame.full(), 0.1)],
        )
        .unwrap(),
        MassFunction::new(
            frame.clone(),
            [(frame.focal(&[2, 3]).unwrap(), 0.6), (frame.full(), 0.4)],
        )
        .unwrap(),
        MassFunction::new(frame.clone(), [(FocalSet::EMPTY, 0.8), (frame.full(), 0.2)]).unwrap(),
    ];

    for (judgment, expected) in three_raters().iter().zip(&expected) {
        let encoded = encode(
            &judgment.verdict,
            judgment.confidence(),
            &frame,
            WorldPolicy::Open,
        )
        .unwrap()
        .unwrap();
        assert!(encoded.approx_eq(expected, 1e-12), "{} vs {}", encoded, expected);
    }
}

#[test]
fn test_open_world_combination_of_three_raters() {
    let open = combine(WorldPolicy::Open, &three_raters());
    assert!(open.is_usable());
    assert_eq!(open.n_active, 3);
    assert_eq!(open.n_abstained, 1);

    // The abstention sends 0.8 of everything to the empty set.
    let conflict = open.conflict.unwrap();
    assert!(conflict > 0.0);
    assert!(close(conflict, 0.8));
    assert_eq!(open.dominant_stage, Some(2));
    assert!(close(open.pignistic(2).unwrap(), 0.94));
}

#[test]
fn test_closed_world_variant_has_less_conflict() {
    let open = combine(WorldPolicy::Open, &three_raters());
    let closed = combine(WorldPolicy::Closed, &three_raters());

    assert!(closed.is_usable());
    assert_eq!(closed.n_active, 2);
    assert_eq!(closed.n_abstained, 1);
    assert!(closed.conflict.unwrap() < open.conflict.unwrap());
    assert!(closed.pignistic(2).unwrap() >= open.pignistic(2).unwrap() - 1e-9);
    assert_eq!(closed.dominant_stage, Some(2));
}

#[test]
fn test_high_conflict_group_is_excluded_from_aggregate() {
    let judgments = vec![
        // r1 agrees on stage 2
        Judgment::new("E1", "r1", Verdict::stages([2])).with_confidence(0.8),
        Judgment::new("E1", "r1", Verdict::stages([2])).with_confidence(0.7),
        // r2 is split between 1 and 4 with full confidence
        Judgment::new("E1", "r2", Verdict::stages([1])),
        Judgment::new("E1", "r2", Verdict::stages([4])),
    ];
    let config = AnalysisConfig {
        bootstrap_iterations: 20,
        weighting: Weighting::Uniform,
        ..AnalysisConfig::default()
    };
    let output = Analysis::new(config).unwrap().run(&judgments).unwrap();

    let r2 = output.combined.iter().find(|c| c.group_id == "r2").unwrap();
    assert!(!r2.is_usable());
    assert!(r2.dominant_stage.is_none());
    assert!(matches!(
        r2.status.reason(),
        Some(DropReason::ConflictAboveThreshold { .. })
    ));

    let subject = &output.aggregates[0];
    assert_eq!(subject.n_groups, 2);
    assert_eq!(subject.n_usable, 1);
    assert_eq!(subject.dominant_stage, Some(2));
}

#[test]
fn test_subject_with_only_abstentions_is_listed_as_dropped() {
    let judgments = vec![
        Judgment::new("E1", "r1", Verdict::Abstain),
        Judgment::new("E1", "r1", Verdict::Abstain),
        Judgment::new("E2", "r1", Verdict::stages([3])).with_confidence(0.6),
    ];
    let config = AnalysisConfig {
        policy: WorldPolicy::Closed,
        bootstrap_iterations: 20,
        ..AnalysisConfig::default()
    };
    let output = Analysis::new(config).unwrap().run(&judgments).unwrap();

    assert_eq!(output.aggregates.len(), 2);
    let e1 = &output.aggregates[0];
    assert_eq!(e1.subject_id, "E1");
    assert!(!e1.is_usable());
    assert!(e1.stages.is_empty());
    assert_eq!(
        output.combined[0].status.reason(),
        Some(&DropReason::NoEvidence { abstained: 2 })
    );
    assert!(output.aggregates[1].is_usable());
}

#[test]
fn test_identical_seeds_give_identical_runs() {
    let config = AnalysisConfig {
        bootstrap_iterations: 100,
        seed: 7,
        ..AnalysisConfig::default()
    };
    let mut judgments = three_raters();
    judgments.push(Judgment::new("E1", "r1", Verdict::stages([3])).with_confidence(0.5));

    let a = Analysis::new(config.clone()).unwrap().run(&judgments).unwrap();
    let b = Analysis::new(config).unwrap().run(&judgments).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_json_entry_point_round_trip() {
    let input = r#"{
        "judgments": [
            {"subject_id": "E1", "group_id": "r1", "verdict": [2], "confidence": 0.9, "quality_weight": 0.8},
            {"subject_id": "E1", "group_id": "r1", "verdict": [2, 3], "confidence": 0.6},
            {"subject_id": "E1", "group_id": "r1", "verdict": true, "confidence": 0.8},
            {"subject_id": "E1", "group_id": "r2", "verdict": [], "confidence": 0.5}
        ],
        "config": {"bootstrap_iterations": 30}
    }"#;
    let output: AnalysisOutput = serde_json::from_str(&analyze_json(input)).unwrap();

    assert_eq!(output.config.policy, WorldPolicy::Open);
    assert_eq!(output.combined.len(), 2);
    assert_eq!(output.combined[0].n_abstained, 1);
    assert_eq!(output.combined[1].n_abstained, 1);
    assert_eq!(output.aggregates[0].dominant_stage, Some(2));

    // Serializing the parsed output again gives the same document.
    let again: AnalysisOutput =
        serde_json::from_str(&serde_json::to_string(&output).unwrap()).unwrap();
    assert_eq!(again, output);
}

#[test]
fn test_json_entry_point_rejects_false_verdict() {
    let input = r#"{"judgments": [{"subject_id": "E1", "group_id": "r1", "verdict": false}]}"#;
    let value: serde_json::Value = serde_json::from_str(&analyze_json(input)).unwrap();
    assert!(value["error"].is_string());
}

#[test]
fn test_subject_spread_over_single_judgment_groups_is_bootstrapped() {
    let judgments = vec![
        Judgment::new("E1", "r1", Verdict::stages([2])).with_confidence(0.9),
        Judgment::new("E1", "r2", Verdict::stages([2])).with_confidence(0.8),
        Judgment::new("E1", "r3", Verdict::stages([3])).with_confidence(0.6),
    ];
    let config = AnalysisConfig {
        policy: WorldPolicy::Closed,
        bootstrap_iterations: 100,
        ..AnalysisConfig::default()
    };
    let output = Analysis::new(config).unwrap().run(&judgments).unwrap();

    assert_eq!(output.combined.len(), 3);
    assert_eq!(output.stability.len(), 1);
    let report = &output.stability[0];
    assert!(report.is_usable());
    assert_eq!(report.n_active, 3);
    assert_eq!(report.dominant_stage, Some(2));
    assert_eq!(output.stability_summary.unwrap().n_cells, 4);
    assert!(output.geometry.is_none());
}
