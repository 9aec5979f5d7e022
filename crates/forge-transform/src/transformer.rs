//! The phase transformer
//!
//! ```text
//! SpecificationDocument ──parse──▶ draft ──overrides──▶ enrich ──synthesize──▶ PhaseArtifact
//!                                                                     │
//!                                                         preservation check
//! ```

use chrono::Utc;
use forge_artifact::{
    ChangeEntry, ChangeKind, Complexity, ExamplePattern, HeuristicTextScorer, Impact,
    PhaseArtifact, SpecificationDocument, TextScorer,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{PartialPhaseConfig, TransformerConfig};
use crate::enrich::{analyze_description, break_down_requirements, plan_implementation};
use crate::error::TransformError;
use crate::preserve::{self, PreservationReport};
use crate::sections::{list_items, paragraph, ParsedText, SectionKind};
use crate::synthesize::synthesize_missing;

/// Id used when neither the input nor the caller names one
pub const FALLBACK_ID: &str = "phase";

/// A transformed artifact and everything noticed on the way
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOutcome {
    /// The canonical artifact
    pub artifact: PhaseArtifact,
    /// Non-fatal problems
    pub warnings: Vec<String>,
    /// Content preservation measurement
    pub preservation: PreservationReport,
}

/// Parsed input before overrides, enrichment and synthesis
#[derive(Debug)]
struct Draft {
    artifact: PhaseArtifact,
    requirements: Vec<String>,
    steps: Vec<String>,
}

/// Turns raw specification documents into canonical phase artifacts
#[derive(Debug, Clone)]
pub struct PhaseTransformer {
    config: TransformerConfig,
    scorer: Arc<dyn TextScorer>,
}

impl Default for PhaseTransformer {
    fn default() -> Self {
        Self::new(TransformerConfig::default())
    }
}

impl PhaseTransformer {
    /// Create transformer with the heuristic text scorer
    #[must_use]
    pub fn new(config: TransformerConfig) -> Self {
        Self::with_scorer(config, Arc::new(HeuristicTextScorer))
    }

    /// Create transformer with a custom text scorer
    #[must_use]
    pub fn with_scorer(config: TransformerConfig, scorer: Arc<dyn TextScorer>) -> Self {
        Self { config, scorer }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    /// Transform a document into a canonical artifact
    ///
    /// # Errors
    /// - [`TransformError::UnsupportedInput`] if a structured document is
    ///   not a JSON object
    /// - [`TransformError::InvalidField`] if a structured field has the
    ///   wrong type
    pub fn transform(
        &self,
        document: &SpecificationDocument,
        partial: &PartialPhaseConfig,
    ) -> Result<TransformOutcome, TransformError> {
        let fingerprint = document.fingerprint()?;
        let mut warnings = Vec::new();

        let Draft {
            mut artifact,
            requirements,
            steps,
        } = match document {
            SpecificationDocument::Text(text) => draft_from_text(text, &mut warnings),
            SpecificationDocument::Structured(value) => draft_from_structured(value)?,
        };

        apply_overrides(&mut artifact, partial);
        self.enrich(&mut artifact, &requirements, &steps);
        synthesize_missing(&mut artifact, &requirements);

        let now = Utc::now();
        artifact.metadata.created_at.get_or_insert(now);
        artifact.metadata.transformed_at = Some(now);
        artifact.metadata.source_format = Some(document.format());
        artifact.metadata.source_fingerprint = Some(fingerprint);

        let preservation = preserve::check(
            &document.plain_text(),
            &artifact,
            self.config.preservation_threshold,
        )?;
        if !preservation.passed() {
            warn!(
                artifact = %artifact.id,
                ratio = preservation.ratio,
                "Transformation lost source content"
            );
            warnings.push(format!(
                "content preservation {:.0}% is below {:.0}%",
                preservation.ratio * 100.0,
                preservation.threshold * 100.0
            ));
        }

        info!(
            artifact = %artifact.id,
            format = ?document.format(),
            changes = artifact.metadata.changes.len(),
            warnings = warnings.len(),
            "Transformed specification"
        );

        Ok(TransformOutcome {
            artifact,
            warnings,
            preservation,
        })
    }

    fn enrich(&self, artifact: &mut PhaseArtifact, requirements: &[String], steps: &[String]) {
        if self.config.analyze_description {
            artifact.enrichment.description =
                analyze_description(&artifact.description, self.scorer.as_ref());
        }
        if self.config.analyze_requirements {
            let items = if requirements.is_empty() {
                artifact.success_criteria.as_deref().unwrap_or_default()
            } else {
                requirements
            };
            artifact.enrichment.requirements = break_down_requirements(
                items,
                self.config.high_priority_count,
                self.config.medium_priority_count,
            );
        }
        if self.config.plan_implementation {
            artifact.enrichment.implementation = plan_implementation(steps);
        }
        debug!(
            artifact = %artifact.id,
            description = artifact.enrichment.description.is_some(),
            requirements = artifact.enrichment.requirements.is_some(),
            implementation = artifact.enrichment.implementation.is_some(),
            "Enriched sections"
        );
    }
}

fn draft_from_text(text: &str, warnings: &mut Vec<String>) -> Draft {
    let parsed = ParsedText::parse(text);
    warnings.extend(parsed.warnings.iter().cloned());
    let frontmatter = parsed.frontmatter.clone().unwrap_or_default();

    let mut description_parts: Vec<String> = Vec::new();
    description_parts.extend(frontmatter.description.clone());
    if !parsed.preamble.is_empty() {
        description_parts.push(parsed.preamble.clone());
    }
    description_parts.extend(
        parsed
            .sections_of(SectionKind::Description)
            .map(|s| s.body.clone())
            .filter(|b| !b.is_empty()),
    );

    let mut artifact = PhaseArtifact::new(
        frontmatter.id.clone().unwrap_or_default(),
        frontmatter
            .name
            .clone()
            .or_else(|| parsed.title.clone())
            .unwrap_or_default(),
        description_parts.join("\n\n"),
    );

    artifact.objective = frontmatter.objective.clone().or_else(|| {
        parsed
            .sections_of(SectionKind::Objective)
            .map(|s| paragraph(&s.body))
            .find(|p| !p.is_empty())
    });
    artifact.success_criteria = frontmatter
        .success_criteria
        .clone()
        .or_else(|| collect_items(&parsed, SectionKind::SuccessCriteria));
    artifact.context_requirements = frontmatter
        .context_requirements
        .clone()
        .or_else(|| collect_items(&parsed, SectionKind::ContextRequirements));
    artifact.validation_checkpoints = frontmatter
        .validation_checkpoints
        .clone()
        .or_else(|| collect_items(&parsed, SectionKind::ValidationCheckpoints));
    artifact.dependencies = frontmatter.dependencies.clone().unwrap_or_else(|| {
        collect_items(&parsed, SectionKind::Dependencies)
            .unwrap_or_default()
            .iter()
            .flat_map(|item| item.split(','))
            .map(|dep| dep.trim().to_string())
            .filter(|dep| !dep.is_empty())
            .collect()
    });
    if let Some(complexity) = frontmatter.complexity {
        artifact.complexity = complexity;
    }

    for section in parsed.unrecognized() {
        debug!(heading = %section.heading, "Kept unrecognized section verbatim");
        artifact
            .metadata
            .extra_sections
            .insert(section.heading.clone(), section.body.clone());
    }
    for (key, value) in &frontmatter.extra {
        let rendered = match value {
            serde_yaml::Value::String(s) => s.clone(),
            other => serde_yaml::to_string(other)
                .map(|s| s.trim_end().to_string())
                .unwrap_or_default(),
        };
        artifact
            .metadata
            .extra_sections
            .insert(format!("frontmatter.{key}"), rendered);
    }

    Draft {
        artifact,
        requirements: collect_items(&parsed, SectionKind::Requirements).unwrap_or_default(),
        steps: collect_items(&parsed, SectionKind::Implementation).unwrap_or_default(),
    }
}

/// Items of every section of `kind`; `None` when there is no such section
fn collect_items(parsed: &ParsedText, kind: SectionKind) -> Option<Vec<String>> {
    let mut found = false;
    let mut items = Vec::new();
    for section in parsed.sections_of(kind) {
        found = true;
        items.extend(list_items(&section.body));
    }
    found.then_some(items)
}

/// Keys the structured path understands, with accepted spellings
const ID_KEYS: &[&str] = &["id"];
const NAME_KEYS: &[&str] = &["name", "title"];
const DESCRIPTION_KEYS: &[&str] = &["description", "overview"];
const OBJECTIVE_KEYS: &[&str] = &["objective", "goal"];
const CRITERIA_KEYS: &[&str] = &["successCriteria", "success_criteria"];
const CONTEXT_KEYS: &[&str] = &["contextRequirements", "context_requirements"];
const CHECKPOINT_KEYS: &[&str] = &["validationCheckpoints", "validation_checkpoints"];
const EXAMPLE_KEYS: &[&str] = &["examplePatterns", "example_patterns"];
const DEPENDENCY_KEYS: &[&str] = &["dependencies"];
const COMPLEXITY_KEYS: &[&str] = &["complexity"];
const REQUIREMENT_KEYS: &[&str] = &["requirements"];
const STEP_KEYS: &[&str] = &["implementation", "steps"];

fn draft_from_structured(value: &Value) -> Result<Draft, TransformError> {
    let Value::Object(map) = value else {
        return Err(TransformError::UnsupportedInput(format!(
            "expected a JSON object, got {}",
            json_kind(value)
        )));
    };

    let mut artifact = PhaseArtifact::new(
        string_field(map, ID_KEYS)?.unwrap_or_default(),
        string_field(map, NAME_KEYS)?.unwrap_or_default(),
        string_field(map, DESCRIPTION_KEYS)?.unwrap_or_default(),
    );
    artifact.objective = string_field(map, OBJECTIVE_KEYS)?;
    artifact.success_criteria = list_field(map, CRITERIA_KEYS)?;
    artifact.context_requirements = list_field(map, CONTEXT_KEYS)?;
    artifact.validation_checkpoints = list_field(map, CHECKPOINT_KEYS)?;
    artifact.dependencies = list_field(map, DEPENDENCY_KEYS)?.unwrap_or_default();

    if let Some((key, raw)) = lookup(map, EXAMPLE_KEYS) {
        let patterns: Vec<ExamplePattern> = serde_json::from_value(raw.clone())
            .map_err(|e| TransformError::invalid_field(key, e.to_string()))?;
        artifact.example_patterns = Some(patterns);
    }
    if let Some(complexity) = string_field(map, COMPLEXITY_KEYS)? {
        artifact.complexity = complexity
            .parse::<Complexity>()
            .map_err(|e| TransformError::invalid_field("complexity", e.to_string()))?;
    }

    let known: Vec<&str> = [
        ID_KEYS,
        NAME_KEYS,
        DESCRIPTION_KEYS,
        OBJECTIVE_KEYS,
        CRITERIA_KEYS,
        CONTEXT_KEYS,
        CHECKPOINT_KEYS,
        EXAMPLE_KEYS,
        DEPENDENCY_KEYS,
        COMPLEXITY_KEYS,
        REQUIREMENT_KEYS,
        STEP_KEYS,
    ]
    .concat();
    for (key, value) in map.iter().filter(|(k, _)| !known.contains(&k.as_str())) {
        let rendered = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        artifact.metadata.extra_sections.insert(key.clone(), rendered);
    }

    Ok(Draft {
        artifact,
        requirements: list_field(map, REQUIREMENT_KEYS)?.unwrap_or_default(),
        steps: list_field(map, STEP_KEYS)?.unwrap_or_default(),
    })
}

fn lookup<'a>(
    map: &'a Map<String, Value>,
    keys: &[&'static str],
) -> Option<(&'static str, &'a Value)> {
    keys.iter()
        .find_map(|key| map.get(*key).filter(|v| !v.is_null()).map(|v| (*key, v)))
}

fn string_field(
    map: &Map<String, Value>,
    keys: &[&'static str],
) -> Result<Option<String>, TransformError> {
    match lookup(map, keys) {
        None => Ok(None),
        Some((_, Value::String(s))) => Ok(Some(s.clone())),
        Some((key, Value::Number(n))) if key == "id" => Ok(Some(n.to_string())),
        Some((key, other)) => Err(TransformError::invalid_field(
            key,
            format!("expected a string, got {}", json_kind(other)),
        )),
    }
}

fn list_field(
    map: &Map<String, Value>,
    keys: &[&'static str],
) -> Result<Option<Vec<String>>, TransformError> {
    match lookup(map, keys) {
        None => Ok(None),
        Some((_, Value::String(s))) => Ok(Some(list_items(s))),
        Some((key, Value::Array(items))) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(TransformError::invalid_field(
                    key,
                    format!("expected a list of strings, found {}", json_kind(other)),
                )),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some((key, other)) => Err(TransformError::invalid_field(
            key,
            format!("expected a list, got {}", json_kind(other)),
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Apply caller overrides, recording each one that changes a value
fn apply_overrides(artifact: &mut PhaseArtifact, partial: &PartialPhaseConfig) {
    let mut changes = Vec::new();

    if let Some(id) = &partial.id {
        if artifact.id != *id {
            if !artifact.id.is_empty() {
                let description = format!("Replaced input id '{}'", artifact.id);
                changes.push(modified("id", description, Impact::Low));
            }
            artifact.id.clone_from(id);
        }
    }
    if let Some(name) = &partial.name {
        if artifact.name != *name {
            changes.push(modified("name", "Name set by caller", Impact::Low));
            artifact.name.clone_from(name);
        }
    }
    if let Some(description) = &partial.description {
        if artifact.description != *description {
            changes.push(modified("description", "Description set by caller", Impact::High));
            artifact.description.clone_from(description);
        }
    }
    if let Some(objective) = &partial.objective {
        if artifact.objective.as_ref() != Some(objective) {
            changes.push(modified("objective", "Objective set by caller", Impact::High));
            artifact.objective = Some(objective.clone());
        }
    }
    if let Some(deps) = &partial.dependencies {
        if artifact.dependencies != *deps {
            changes.push(modified("dependencies", "Dependencies set by caller", Impact::Medium));
            artifact.dependencies.clone_from(deps);
        }
    }
    if let Some(complexity) = partial.complexity {
        if artifact.complexity != complexity {
            changes.push(modified("complexity", "Complexity set by caller", Impact::Low));
            artifact.complexity = complexity;
        }
    }

    if artifact.id.trim().is_empty() {
        artifact.id = slug(&artifact.name).unwrap_or_else(|| FALLBACK_ID.to_string());
    }
    if artifact.name.trim().is_empty() {
        artifact.name.clone_from(&artifact.id);
    }
    artifact.metadata.changes.extend(changes);
}

fn modified(section: &str, description: impl Into<String>, impact: Impact) -> ChangeEntry {
    ChangeEntry::now(ChangeKind::Modified, section, description, impact)
}

fn slug(name: &str) -> Option<String> {
    let slug = forge_artifact::text::tokenize(name).join("-");
    (!slug.is_empty()).then_some(slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_artifact::SourceFormat;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn transform(doc: impl Into<SpecificationDocument>) -> TransformOutcome {
        PhaseTransformer::default()
            .transform(&doc.into(), &PartialPhaseConfig::default())
            .unwrap()
    }

    #[test]
    fn non_object_is_unsupported() {
        let err = PhaseTransformer::default()
            .transform(
                &SpecificationDocument::structured(json!([1, 2])),
                &PartialPhaseConfig::default(),
            )
            .unwrap_err();
        assert!(matches!(err, TransformError::UnsupportedInput(_)));
        assert!(err.is_input_error());
    }

    #[test]
    fn wrong_field_type_is_reported() {
        let err = PhaseTransformer::default()
            .transform(
                &SpecificationDocument::structured(json!({"successCriteria": 3})),
                &PartialPhaseConfig::default(),
            )
            .unwrap_err();
        assert!(matches!(err, TransformError::InvalidField { ref field, .. } if field == "successCriteria"));
    }

    #[test]
    fn structured_fields_pass_through() {
        let outcome = transform(json!({
            "id": "search",
            "name": "Search",
            "description": "Build search.",
            "successCriteria": ["Finds products"],
            "complexity": "high",
            "owner": "team-a"
        }));
        let artifact = outcome.artifact;
        assert_eq!(artifact.success_criteria, Some(vec!["Finds products".to_string()]));
        assert_eq!(artifact.complexity, Complexity::High);
        assert_eq!(artifact.metadata.extra_sections.get("owner").map(String::as_str), Some("team-a"));
        assert_eq!(artifact.metadata.source_format, Some(SourceFormat::Structured));
    }

    #[test]
    fn missing_id_comes_from_name() {
        let outcome = transform("# Order Export\nExport orders nightly.");
        assert_eq!(outcome.artifact.id, "order-export");
        assert_eq!(outcome.artifact.name, "Order Export");
    }

    #[test]
    fn overrides_are_recorded() {
        let partial = PartialPhaseConfig::with_id("p1").objective("Ship exports");
        let outcome = PhaseTransformer::default()
            .transform(&"## Goal\nExport orders.".into(), &partial)
            .unwrap();
        let artifact = outcome.artifact;
        assert_eq!(artifact.id, "p1");
        assert_eq!(artifact.objective.as_deref(), Some("Ship exports"));
        let modified: Vec<_> = artifact
            .metadata
            .changes
            .iter()
            .filter(|c| c.kind == ChangeKind::Modified)
            .map(|c| c.section.as_str())
            .collect();
        assert_eq!(modified, vec!["objective"]);
    }

    #[test]
    fn enrichment_can_be_disabled() {
        let transformer = PhaseTransformer::new(TransformerConfig::default().without_enrichment());
        let outcome = transformer
            .transform(&"Build the thing.".into(), &PartialPhaseConfig::default())
            .unwrap();
        assert_eq!(outcome.artifact.enrichment, Default::default());
    }
}
