//! Structural validation
//!
//! Starts from 100 and subtracts a fixed penalty per finding.

use forge_artifact::{CanonicalSection, PhaseArtifact, ValidationIssue};
use std::collections::HashSet;

use crate::config::GateConfig;
use crate::report::ValidatorReport;

/// Category name used for structural findings
pub const STRUCTURAL: &str = "structural";

const MISSING_FIELD_PENALTY: f64 = 25.0;
const MISSING_SECTION_PENALTY: f64 = 20.0;
const SELF_DEPENDENCY_PENALTY: f64 = 50.0;
const MALFORMED_DEPENDENCY_PENALTY: f64 = 10.0;
const DUPLICATE_DEPENDENCY_PENALTY: f64 = 5.0;

/// Required fields, required sections and dependency hygiene
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralValidator;

impl StructuralValidator {
    /// Check `artifact` against `config`
    #[must_use]
    pub fn validate(artifact: &PhaseArtifact, config: &GateConfig) -> ValidatorReport {
        let mut penalty = 0.0;
        let mut issues = Vec::new();

        for (field, value) in [
            ("id", &artifact.id),
            ("name", &artifact.name),
            ("description", &artifact.description),
        ] {
            if value.trim().is_empty() {
                penalty += MISSING_FIELD_PENALTY;
                issues.push(ValidationIssue::error(
                    format!("missing-field-{field}"),
                    STRUCTURAL,
                    8,
                    format!("Required field '{field}' is empty"),
                    format!("Provide a non-empty {field}"),
                ));
            }
        }

        for section in &config.required_sections {
            if !artifact.has_section(*section) {
                penalty += MISSING_SECTION_PENALTY;
                issues.push(missing_section(*section, artifact.is_absent(*section)));
            }
        }

        let mut seen = HashSet::new();
        for dep in &artifact.dependencies {
            let dep = dep.trim();
            if !artifact.id.trim().is_empty() && dep == artifact.id.trim() {
                penalty += SELF_DEPENDENCY_PENALTY;
                issues.push(ValidationIssue::error(
                    "self-dependency",
                    STRUCTURAL,
                    10,
                    format!("Artifact '{}' depends on itself", artifact.id),
                    "Remove the artifact's own id from its dependencies",
                ));
            } else if !is_well_formed(dep) {
                penalty += MALFORMED_DEPENDENCY_PENALTY;
                issues.push(ValidationIssue::error(
                    "malformed-dependency",
                    STRUCTURAL,
                    7,
                    format!("Dependency '{dep}' is not a valid artifact id"),
                    "Use ids made of letters, digits, '-', '_', '.' or '/'",
                ));
            } else if !seen.insert(dep) {
                penalty += DUPLICATE_DEPENDENCY_PENALTY;
                issues.push(ValidationIssue::warning(
                    "duplicate-dependency",
                    STRUCTURAL,
                    4,
                    format!("Dependency '{dep}' is listed more than once"),
                    "List each dependency once",
                ));
            }
        }

        ValidatorReport {
            score: (100.0 - penalty).clamp(0.0, 100.0),
            issues,
        }
    }
}

fn missing_section(section: CanonicalSection, absent: bool) -> ValidationIssue {
    let state = if absent { "missing" } else { "empty" };
    ValidationIssue::error(
        format!("missing-section-{}", section.field_name()),
        STRUCTURAL,
        8,
        format!("Required section '{}' is {state}", section.field_name()),
        format!("Add a populated '{}' section", section.field_name()),
    )
}

fn is_well_formed(dep: &str) -> bool {
    !dep.is_empty()
        && dep
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_artifact::IssueType;

    fn full() -> PhaseArtifact {
        PhaseArtifact::new("auth", "Auth", "Add login.")
            .with_objective("Sign in")
            .with_success_criteria(["works"])
            .with_context_requirements(["session store"])
            .with_validation_checkpoints(["test login"])
    }

    #[test]
    fn complete_artifact_scores_full() {
        let report = StructuralValidator::validate(&full(), &GateConfig::default());
        assert_eq!(report.score, 100.0);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn each_missing_section_is_reported() {
        let artifact = PhaseArtifact::new("r", "Reports", "Reports.");
        let report = StructuralValidator::validate(&artifact, &GateConfig::default());
        assert_eq!(report.issues.len(), 4);
        assert_eq!(report.score, 20.0);
        assert!(report.issues.iter().all(|i| i.id.starts_with("missing-section-")));
    }

    #[test]
    fn empty_list_counts_as_missing() {
        let mut artifact = full();
        artifact.success_criteria = Some(vec!["  ".into()]);
        let report = StructuralValidator::validate(&artifact, &GateConfig::default());
        let issue = &report.issues[0];
        assert_eq!(issue.id, "missing-section-successCriteria");
        assert!(issue.message.ends_with("is empty"));
    }

    #[test]
    fn self_dependency_is_fatal() {
        let artifact = full().with_dependencies(["auth", "db"]);
        let report = StructuralValidator::validate(&artifact, &GateConfig::default());
        let issue = &report.issues[0];
        assert_eq!(issue.id, "self-dependency");
        assert_eq!(issue.severity, 10);
        assert_eq!(issue.issue_type, IssueType::Error);
        assert_eq!(report.score, 50.0);
    }

    #[test]
    fn malformed_and_duplicate_dependencies() {
        let artifact = full().with_dependencies(["db", "db", "two words", ""]);
        let report = StructuralValidator::validate(&artifact, &GateConfig::default());
        let ids: Vec<_> = report.issues.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["duplicate-dependency", "malformed-dependency", "malformed-dependency"]
        );
        assert_eq!(report.score, 75.0);
    }
}
