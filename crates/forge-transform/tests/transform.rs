//! End-to-end transformer behavior

use forge_artifact::{
    CanonicalSection, ChangeKind, Complexity, Priority, SourceFormat, SpecificationDocument,
};
use forge_test_utils::{init_tracing, sample_document, sample_structured};
use forge_transform::{PartialPhaseConfig, PhaseTransformer, TransformError, TransformerConfig};
use pretty_assertions::assert_eq;
use serde_json::json;

fn transform(doc: &SpecificationDocument) -> forge_transform::TransformOutcome {
    PhaseTransformer::default()
        .transform(doc, &PartialPhaseConfig::default())
        .unwrap()
}

fn added_sections(artifact: &forge_artifact::PhaseArtifact) -> Vec<&str> {
    artifact
        .metadata
        .changes
        .iter()
        .filter(|c| c.kind == ChangeKind::Added)
        .map(|c| c.section.as_str())
        .collect()
}

#[test]
fn header_text_becomes_canonical_artifact() {
    init_tracing();
    let outcome = transform(&sample_document());
    let artifact = &outcome.artifact;

    assert_eq!(artifact.id, "payment-processing");
    assert_eq!(artifact.name, "Payment Processing");
    assert!(artifact.description.starts_with("Process card payments"));
    assert_eq!(
        artifact.objective.as_deref(),
        Some("Accept card payments through the payment gateway.")
    );
    assert_eq!(
        artifact.success_criteria,
        Some(vec!["Validate card numbers before submission".to_string()])
    );
    assert_eq!(artifact.metadata.source_format, Some(SourceFormat::Text));
    assert!(artifact.metadata.source_fingerprint.is_some());
    assert!(artifact.metadata.transformed_at.is_some());

    let added = added_sections(artifact);
    assert!(!added.contains(&CanonicalSection::Objective.field_name()));
    assert!(added.contains(&CanonicalSection::SuccessCriteria.field_name()));
    assert!(added.contains(&CanonicalSection::ValidationCheckpoints.field_name()));

    assert!(outcome.preservation.passed(), "{:?}", outcome.preservation);
    assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
}

#[test]
fn requirements_and_steps_are_enriched() {
    let outcome = transform(&sample_document());
    let enrichment = &outcome.artifact.enrichment;

    let requirements = enrichment.requirements.as_ref().unwrap();
    assert_eq!(requirements.len(), 3);
    assert_eq!(requirements.functional.len(), 1);
    assert_eq!(requirements.non_functional.len(), 1);
    assert_eq!(requirements.technical.len(), 1);
    assert!(requirements.in_order().iter().all(|r| r.priority == Priority::High));

    let plan = enrichment.implementation.as_ref().unwrap();
    assert_eq!(plan.steps.len(), 3);
    assert_eq!(plan.steps[1].dependencies, vec!["gateway client".to_string()]);
    assert_eq!(plan.steps[2].dependencies, vec!["checkout handler".to_string()]);
    assert_eq!(
        plan.total_estimated_minutes,
        plan.steps.iter().map(|s| s.estimated_minutes).sum::<u32>()
    );

    assert!(enrichment.description.is_some());
}

#[test]
fn structured_record_keeps_supplied_sections() {
    let outcome = transform(&SpecificationDocument::structured(sample_structured()));
    let artifact = &outcome.artifact;

    assert_eq!(artifact.id, "search");
    assert_eq!(artifact.dependencies, vec!["catalogue".to_string()]);
    assert_eq!(
        artifact.success_criteria,
        Some(vec!["Top result matches exact product names".to_string()])
    );
    let added = added_sections(artifact);
    assert!(!added.contains(&"objective"));
    assert!(!added.contains(&"successCriteria"));
    assert!(added.contains(&"contextRequirements"));

    let context = artifact.context_requirements.as_ref().unwrap();
    assert!(context.iter().any(|c| c.contains("'catalogue'")));
}

#[test]
fn non_object_records_are_rejected() {
    let err = PhaseTransformer::default()
        .transform(
            &SpecificationDocument::structured(json!(42)),
            &PartialPhaseConfig::default(),
        )
        .unwrap_err();
    assert!(matches!(err, TransformError::UnsupportedInput(_)));
}

#[test]
fn caller_overrides_win_and_are_recorded() {
    let partial = PartialPhaseConfig::with_id("search-v2")
        .name("Search")
        .dependencies(["catalogue", "indexer"])
        .complexity(Complexity::High);
    let outcome = PhaseTransformer::default()
        .transform(&SpecificationDocument::structured(sample_structured()), &partial)
        .unwrap();
    let artifact = &outcome.artifact;

    assert_eq!(artifact.id, "search-v2");
    assert_eq!(artifact.name, "Search");
    assert_eq!(artifact.complexity, Complexity::High);

    let modified: Vec<&str> = artifact
        .metadata
        .changes
        .iter()
        .filter(|c| c.kind == ChangeKind::Modified)
        .map(|c| c.section.as_str())
        .collect();
    assert_eq!(modified, vec!["id", "name", "dependencies", "complexity"]);
}

#[test]
fn identical_overrides_are_not_recorded() {
    let partial = PartialPhaseConfig::with_id("search").name("Product search");
    let outcome = PhaseTransformer::default()
        .transform(&SpecificationDocument::structured(sample_structured()), &partial)
        .unwrap();
    assert!(outcome
        .artifact
        .metadata
        .changes
        .iter()
        .all(|c| c.kind != ChangeKind::Modified));
}

#[test]
fn frontmatter_supplies_fields_and_extras() {
    let text = "---\n\
                id: billing\n\
                title: Billing\n\
                goal: Invoice customers monthly\n\
                complexity: low\n\
                owner: finance\n\
                ---\n\
                Generate invoices for every active subscription.\n\
                \n\
                ## Rollout Notes\n\
                Ship behind a flag.\n";
    let outcome = transform(&SpecificationDocument::text(text));
    let artifact = &outcome.artifact;

    assert_eq!(artifact.id, "billing");
    assert_eq!(artifact.name, "Billing");
    assert_eq!(artifact.objective.as_deref(), Some("Invoice customers monthly"));
    assert_eq!(artifact.complexity, Complexity::Low);
    assert_eq!(
        artifact.metadata.extra_sections.get("frontmatter.owner").map(String::as_str),
        Some("finance")
    );
    assert_eq!(
        artifact.metadata.extra_sections.get("Rollout Notes").map(String::as_str),
        Some("Ship behind a flag.")
    );
}

#[test]
fn strict_threshold_produces_warning() {
    let transformer =
        PhaseTransformer::new(TransformerConfig::default().with_preservation_threshold(1.01));
    let outcome = transformer
        .transform(&sample_document(), &PartialPhaseConfig::default())
        .unwrap();
    assert!(!outcome.preservation.passed());
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("preservation"));
}

#[test]
fn transform_is_deterministic_apart_from_timestamps() {
    let a = transform(&sample_document()).artifact;
    let b = transform(&sample_document()).artifact;
    assert_eq!(a.id, b.id);
    assert_eq!(a.success_criteria, b.success_criteria);
    assert_eq!(a.context_requirements, b.context_requirements);
    assert_eq!(a.enrichment, b.enrichment);
    assert_eq!(a.metadata.source_fingerprint, b.metadata.source_fingerprint);
}
