//! Phase templates
//!
//! A template contributes success criteria, context requirements and
//! validation checkpoints to a generated phase. [`TemplateRegistry`] picks
//! the template whose keywords best match an objective.

use forge_artifact::text::word_set;
use forge_artifact::Complexity;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Id given to templates synthesized from requirements
pub const SYNTHESIZED_TEMPLATE_ID: &str = "synthesized";

/// Reusable shape of a phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseTemplate {
    /// Unique id
    pub id: String,
    /// Display name
    pub name: String,
    /// Domain matched against the project type
    pub domain: String,
    /// Lowercase words matched against the objective
    pub keywords: Vec<String>,
    /// Criteria added to every phase built from this template
    pub success_criteria: Vec<String>,
    /// Context added to every phase built from this template
    pub context_requirements: Vec<String>,
    /// Checkpoints added to every phase built from this template
    pub validation_checkpoints: Vec<String>,
    /// Typical complexity
    pub complexity: Complexity,
}

impl PhaseTemplate {
    /// Empty template
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            domain: domain.into(),
            keywords: Vec::new(),
            success_criteria: Vec::new(),
            context_requirements: Vec::new(),
            validation_checkpoints: Vec::new(),
            complexity: Complexity::Medium,
        }
    }

    /// With keywords (lowercased)
    #[must_use]
    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| k.to_lowercase()).collect();
        self
    }

    /// With success criteria
    #[must_use]
    pub fn with_criteria(mut self, criteria: &[&str]) -> Self {
        self.success_criteria = criteria.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// With context requirements
    #[must_use]
    pub fn with_context(mut self, context: &[&str]) -> Self {
        self.context_requirements = context.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// With validation checkpoints
    #[must_use]
    pub fn with_checkpoints(mut self, checkpoints: &[&str]) -> Self {
        self.validation_checkpoints = checkpoints.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// With complexity
    #[inline]
    #[must_use]
    pub fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = complexity;
        self
    }

    /// Template built only from an objective when nothing in the registry fits
    #[must_use]
    pub fn synthesized(objective: &str) -> Self {
        let objective = objective.trim().trim_end_matches('.');
        Self::new(SYNTHESIZED_TEMPLATE_ID, "Synthesized", "general")
            .with_context(&["Scope is limited to the stated objective"])
            .with_checkpoints(&["Review the delivered work against the objective"])
            .with_criteria(&[format!("{objective} is demonstrably complete").as_str()])
    }

    /// Match score against an objective and project type; 0 means no match
    #[must_use]
    pub fn score(&self, objective: &str, project_type: &str) -> f64 {
        let words = word_set(objective);
        let hits = self.keywords.iter().filter(|k| words.contains(*k)).count();
        if hits == 0 {
            return 0.0;
        }
        let domain_bonus = if word_set(project_type).contains(&self.domain.to_lowercase()) {
            0.5
        } else {
            0.0
        };
        #[allow(clippy::cast_precision_loss)]
        let hits = hits as f64;
        hits + domain_bonus
    }
}

/// Templates by id, in registration order
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: IndexMap<String, PhaseTemplate>,
}

impl TemplateRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create registry with the built-in templates
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for template in default_templates() {
            registry.register(template);
        }
        registry
    }

    /// Register a template, returning the one it replaced
    pub fn register(&mut self, template: PhaseTemplate) -> Option<PhaseTemplate> {
        self.templates.insert(template.id.clone(), template)
    }

    /// Remove a template
    pub fn remove(&mut self, id: &str) -> Option<PhaseTemplate> {
        self.templates.shift_remove(id)
    }

    /// Look up a template
    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&PhaseTemplate> {
        self.templates.get(id)
    }

    /// Registered ids in registration order
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }

    /// Number of templates
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Best-scoring template; earlier registration wins ties
    #[must_use]
    pub fn select(&self, objective: &str, project_type: &str) -> Option<&PhaseTemplate> {
        let mut best: Option<(&PhaseTemplate, f64)> = None;
        for template in self.templates.values() {
            let score = template.score(objective, project_type);
            if score > 0.0 && best.map_or(true, |(_, s)| score > s) {
                best = Some((template, score));
            }
        }
        best.map(|(template, _)| template)
    }
}

fn default_templates() -> Vec<PhaseTemplate> {
    vec![
        PhaseTemplate::new("api-service", "API service", "web")
            .with_keywords(&["api", "endpoint", "endpoints", "service", "rest", "http", "route"])
            .with_criteria(&[
                "Every endpoint returns documented status codes",
                "Request payloads are validated before processing",
            ])
            .with_context(&["API contract is versioned", "Authentication scheme is defined"])
            .with_checkpoints(&[
                "Verify each endpoint with an integration test",
                "Verify error responses for malformed requests",
            ]),
        PhaseTemplate::new("data-pipeline", "Data pipeline", "data")
            .with_keywords(&["data", "pipeline", "etl", "import", "export", "batch", "ingest"])
            .with_criteria(&[
                "Every input record is loaded or reported as rejected",
                "Reruns produce the same output",
            ])
            .with_context(&["Source and target schemas are documented"])
            .with_checkpoints(&["Verify record counts between source and target"])
            .with_complexity(Complexity::High),
        PhaseTemplate::new("ui-feature", "UI feature", "frontend")
            .with_keywords(&["ui", "page", "form", "screen", "component", "dashboard", "view"])
            .with_criteria(&[
                "All interactive elements are keyboard accessible",
                "Input errors are shown next to the offending field",
            ])
            .with_context(&["Design mockups are approved"])
            .with_checkpoints(&["Verify the flow in a browser test"])
            .with_complexity(Complexity::Low),
        PhaseTemplate::new("infrastructure", "Infrastructure", "ops")
            .with_keywords(&["deploy", "deployment", "infrastructure", "cluster", "monitoring", "ci"])
            .with_criteria(&["Deployment completes without manual steps"])
            .with_context(&["Target environment credentials are provisioned"])
            .with_checkpoints(&["Verify a rollback restores the previous release"]),
        PhaseTemplate::new("test-suite", "Test suite", "quality")
            .with_keywords(&["test", "tests", "testing", "coverage", "qa", "regression"])
            .with_criteria(&["Critical paths are covered by automated tests"])
            .with_context(&["Test environment mirrors production configuration"])
            .with_checkpoints(&["Verify the suite passes on a clean checkout"])
            .with_complexity(Complexity::Low),
    ]
}
