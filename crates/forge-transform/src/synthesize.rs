//! Synthesis of absent canonical sections
//!
//! Only sections that are `None` are synthesized; a section the input
//! supplied, even empty, is left alone. Every synthesis appends a change
//! entry.

use forge_artifact::text::{is_action_verb, sentences, tokenize};
use forge_artifact::{CanonicalSection, ChangeEntry, ChangeKind, Impact, PhaseArtifact};

use crate::enrich::{classify_requirement, RequirementKind};

/// Most items synthesized into one list
const MAX_SYNTHESIZED_ITEMS: usize = 5;

/// Fill every absent canonical section from existing content
pub(crate) fn synthesize_missing(artifact: &mut PhaseArtifact, requirements: &[String]) {
    if artifact.objective.is_none() {
        let objective = first_sentence(&artifact.description)
            .unwrap_or_else(|| format!("Deliver {}", artifact.name.trim()));
        artifact.objective = Some(objective);
        record(artifact, CanonicalSection::Objective, "Derived from the description", Impact::High);
    }

    if artifact.success_criteria.is_none() {
        let mut criteria: Vec<String> = requirements
            .iter()
            .filter(|r| classify_requirement(r) == RequirementKind::Functional)
            .take(MAX_SYNTHESIZED_ITEMS)
            .cloned()
            .collect();
        if criteria.is_empty() {
            criteria = sentences(&artifact.description)
                .into_iter()
                .filter(|s| tokenize(s).iter().any(|w| is_action_verb(w)))
                .take(MAX_SYNTHESIZED_ITEMS)
                .map(str::to_string)
                .collect();
        }
        if criteria.is_empty() {
            if let Some(objective) = &artifact.objective {
                criteria.push(format!("{} is achieved", objective.trim_end_matches('.')));
            }
        }
        artifact.success_criteria = Some(criteria);
        record(
            artifact,
            CanonicalSection::SuccessCriteria,
            "Derived from requirements and description",
            Impact::Medium,
        );
    }

    if artifact.context_requirements.is_none() {
        let mut context: Vec<String> = requirements
            .iter()
            .filter(|r| classify_requirement(r) != RequirementKind::Functional)
            .take(MAX_SYNTHESIZED_ITEMS)
            .cloned()
            .collect();
        context.extend(
            artifact
                .dependencies
                .iter()
                .map(|dep| format!("Requires completion of phase '{dep}'")),
        );
        if context.is_empty() {
            context.push("Builds on the existing project structure and conventions".to_string());
        }
        artifact.context_requirements = Some(context);
        record(
            artifact,
            CanonicalSection::ContextRequirements,
            "Derived from non-functional requirements and dependencies",
            Impact::Low,
        );
    }

    if artifact.validation_checkpoints.is_none() {
        let checkpoints = artifact
            .success_criteria
            .iter()
            .flatten()
            .filter(|c| !c.trim().is_empty())
            .map(|c| format!("Verify that {}", lowercase_first(c.trim())))
            .collect();
        artifact.validation_checkpoints = Some(checkpoints);
        record(
            artifact,
            CanonicalSection::ValidationCheckpoints,
            "One checkpoint per success criterion",
            Impact::Medium,
        );
    }

    if artifact.example_patterns.is_none() {
        artifact.example_patterns = Some(Vec::new());
        record(
            artifact,
            CanonicalSection::ExamplePatterns,
            "Empty until pattern enrichment",
            Impact::Low,
        );
    }
}

fn record(artifact: &mut PhaseArtifact, section: CanonicalSection, what: &str, impact: Impact) {
    artifact.metadata.changes.push(ChangeEntry::now(
        ChangeKind::Added,
        section.field_name(),
        what,
        impact,
    ));
}

fn first_sentence(text: &str) -> Option<String> {
    sentences(text).first().map(|s| (*s).to_string())
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
