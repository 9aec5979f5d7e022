//! Validation gate behaviour through the public API

use forge_artifact::{CanonicalSection, IssueType, PhaseArtifact};
use forge_gate::{GateConfig, QualityThresholds, ValidationGate, AUTO_FIX_PLACEHOLDER};
use forge_test_utils::{artifact_missing_sections, complete_artifact, init_tracing};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn missing_sections_fail_below_threshold() {
    init_tracing();
    let gate = ValidationGate::default();

    let result = gate.validate(&artifact_missing_sections("reports")).await;

    assert!(!result.passed);
    assert!(result.overall_score < 70.0);
    let missing: Vec<_> = result
        .issues
        .iter()
        .filter(|i| i.id.starts_with("missing-section-"))
        .map(|i| i.id.as_str())
        .collect();
    assert!(missing.len() >= 3);
    for section in ["objective", "successCriteria", "contextRequirements"] {
        assert!(missing.contains(&format!("missing-section-{section}").as_str()));
    }
}

#[tokio::test]
async fn unchanged_artifact_shows_no_improvement() {
    let gate = ValidationGate::default();
    let artifact = complete_artifact("auth");

    let first = gate.validate(&artifact).await;
    let second = gate.validate(&artifact).await;

    assert_eq!(first.improvement_score, 0.0);
    assert_eq!(second.improvement_score, 0.0);
    assert_eq!(gate.trend("auth").len(), 2);
}

#[tokio::test]
async fn improvement_tracks_previous_score() {
    let gate = ValidationGate::default();
    let before = gate.validate(&artifact_missing_sections("auth")).await;
    let after = gate.validate(&complete_artifact("auth")).await;

    assert!(after.improvement_score > 0.0);
    assert!((after.improvement_score - (after.overall_score - before.overall_score)).abs() < 1e-9);
}

#[tokio::test]
async fn self_reference_is_rejected_regardless_of_quality() {
    let gate = ValidationGate::default();
    let artifact = complete_artifact("auth").with_dependencies(["auth"]);

    let result = gate.validate(&artifact).await;

    assert!(!result.passed);
    let issue = result.issue("self-dependency").unwrap();
    assert!(issue.severity >= 9);
    assert_eq!(issue.issue_type, IssueType::Error);
}

#[tokio::test]
async fn history_and_trend_are_bounded() {
    let gate = ValidationGate::default();
    let artifact = complete_artifact("auth");
    for _ in 0..25 {
        gate.validate(&artifact).await;
    }
    assert_eq!(gate.history("auth").len(), 10);
    assert_eq!(gate.trend("auth").len(), 20);

    assert!(gate.clear_history("auth"));
    assert!(gate.history("auth").is_empty());
    assert!(!gate.clear_history("auth"));
}

#[tokio::test]
async fn history_forgets_least_recent_artifacts_past_cap() {
    let gate = ValidationGate::new(GateConfig::default().with_tracked_artifacts(5));
    for n in 0..50 {
        gate.validate(&complete_artifact(&format!("phase-{n}"))).await;
    }

    let retained = (0..50)
        .filter(|n| !gate.history(&format!("phase-{n}")).is_empty())
        .count();
    assert_eq!(retained, 5);
    assert_eq!(gate.trend("phase-49").len(), 1);
    assert!(gate.history("phase-0").is_empty());
}

#[tokio::test]
async fn auto_fix_fills_only_missing_fields() {
    let gate = ValidationGate::new(GateConfig::default().with_auto_fix(true));
    let mut artifact = PhaseArtifact::new("draft", "", "");

    let result = gate.validate_and_fix(&mut artifact).await;

    assert!(!result.passed);
    assert_eq!(result.auto_fixes, vec!["name", "description", "objective"]);
    assert_eq!(artifact.name, AUTO_FIX_PLACEHOLDER);
    assert_eq!(artifact.objective.as_deref(), Some(AUTO_FIX_PLACEHOLDER));
    assert!(artifact.success_criteria.is_none());

    // the result describes the unfixed artifact
    assert!(result.issue("missing-field-name").is_some());
    let rescored = gate.validate(&artifact).await;
    assert!(rescored.issue("missing-field-name").is_none());
}

#[tokio::test]
async fn auto_fix_is_opt_in() {
    let gate = ValidationGate::default();
    let mut artifact = PhaseArtifact::new("draft", "", "");
    let result = gate.validate_and_fix(&mut artifact).await;
    assert!(result.auto_fixes.is_empty());
    assert!(artifact.name.is_empty());
}

#[tokio::test]
async fn configured_sections_drive_structure() {
    let gate = ValidationGate::new(
        GateConfig::default().with_required_sections([CanonicalSection::Objective]),
    );
    let artifact = PhaseArtifact::new("a", "A", "Build the thing.").with_objective("Ship it");
    let result = gate.validate(&artifact).await;
    assert_eq!(result.category_scores.get("structural"), Some(&100.0));
}

#[tokio::test]
async fn lenient_thresholds_remove_quality_warnings() {
    let strict = ValidationGate::default();
    let lenient = ValidationGate::new(
        GateConfig::default().with_quality(QualityThresholds::uniform(0.0)),
    );
    let artifact = artifact_missing_sections("r");

    let strict_result = strict.validate(&artifact).await;
    let lenient_result = lenient.validate(&artifact).await;

    assert!(strict_result.warnings().count() > 0);
    assert_eq!(lenient_result.warnings().count(), 0);
    assert_eq!(strict_result.overall_score, lenient_result.overall_score);
}
