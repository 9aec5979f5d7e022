//! Phase generator
//!
//! Composes the transformer, the pattern library and the validation gate
//! into two entry points:
//!
//! - [`PhaseGenerator::transform_existing`]: raw document to validated
//!   artifact, served from the transformation cache when the input and
//!   the library are unchanged
//! - [`PhaseGenerator::generate_new`]: requirements to validated artifact,
//!   built from a template; never touches the cache
//!
//! Neither returns an error. Every failure, panics included, becomes a
//! failed [`GenerationResult`].

use chrono::Utc;
use forge_artifact::{
    ChangeEntry, ChangeKind, Complexity, ExamplePattern, Fingerprint, Impact, PhaseArtifact,
    SpecificationDocument,
};
use forge_gate::ValidationGate;
use forge_patterns::{PatternLibrary, SearchCriteria};
use forge_transform::{PartialPhaseConfig, PhaseTransformer};
use futures::FutureExt;
use parking_lot::RwLock;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::cache::{CachedTransform, EntryVersion, TransformCache, TransformCacheStats};
use crate::config::{ForgeConfig, GeneratorConfig};
use crate::error::ForgeError;
use crate::templates::{PhaseTemplate, TemplateRegistry};
use crate::types::{GenerationContext, GenerationMetrics, GenerationResult, PhaseRequirements};

/// Orchestrates transformation, example enrichment and validation
#[derive(Debug)]
pub struct PhaseGenerator {
    config: GeneratorConfig,
    transformer: PhaseTransformer,
    library: Arc<PatternLibrary>,
    gate: Arc<ValidationGate>,
    templates: RwLock<TemplateRegistry>,
    cache: TransformCache,
}

impl Default for PhaseGenerator {
    fn default() -> Self {
        Self::build(ForgeConfig::default())
    }
}

impl PhaseGenerator {
    /// Create generator with fresh components
    ///
    /// # Errors
    /// Returns [`ForgeError::Config`] if a value is out of range
    pub fn new(config: ForgeConfig) -> Result<Self, ForgeError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Create generator around existing library and gate
    ///
    /// Their own configuration applies; only the transformer and generator
    /// sections of `config` are used.
    ///
    /// # Errors
    /// Returns [`ForgeError::Config`] if a value is out of range
    pub fn with_components(
        config: ForgeConfig,
        library: Arc<PatternLibrary>,
        gate: Arc<ValidationGate>,
    ) -> Result<Self, ForgeError> {
        config.validate()?;
        Ok(Self::assemble(
            config.generator,
            PhaseTransformer::new(config.transformer),
            library,
            gate,
        ))
    }

    fn build(config: ForgeConfig) -> Self {
        Self::assemble(
            config.generator,
            PhaseTransformer::new(config.transformer),
            Arc::new(PatternLibrary::new(config.patterns)),
            Arc::new(ValidationGate::new(config.gate)),
        )
    }

    fn assemble(
        config: GeneratorConfig,
        transformer: PhaseTransformer,
        library: Arc<PatternLibrary>,
        gate: Arc<ValidationGate>,
    ) -> Self {
        let cache = TransformCache::new(config.cache_capacity, config.cache_ttl);
        Self {
            config,
            transformer,
            library,
            gate,
            templates: RwLock::new(TemplateRegistry::with_defaults()),
            cache,
        }
    }

    /// Generator configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The owned pattern library
    #[inline]
    #[must_use]
    pub fn library(&self) -> &Arc<PatternLibrary> {
        &self.library
    }

    /// The owned validation gate
    #[inline]
    #[must_use]
    pub fn gate(&self) -> &Arc<ValidationGate> {
        &self.gate
    }

    /// The transformer
    #[inline]
    #[must_use]
    pub fn transformer(&self) -> &PhaseTransformer {
        &self.transformer
    }

    /// Add or replace a template
    pub fn register_template(&self, template: PhaseTemplate) -> Option<PhaseTemplate> {
        self.templates.write().register(template)
    }

    /// Registered template ids
    #[must_use]
    pub fn template_ids(&self) -> Vec<String> {
        self.templates
            .read()
            .ids()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Transform a raw document into a validated, example-enriched artifact
    ///
    /// The artifact id is always `id`; an input id that differs is recorded
    /// as a modification.
    pub async fn transform_existing(
        &self,
        id: &str,
        document: &SpecificationDocument,
        partial: &PartialPhaseConfig,
    ) -> GenerationResult {
        metrics::counter!("forge_generator_requests_total", "path" => "transform").increment(1);
        let started = Instant::now();
        let run = self.run_transform(id, document, partial, started);
        finish(id, "transform", run).await
    }

    /// Build and validate a brand new artifact from requirements
    pub async fn generate_new(
        &self,
        id: &str,
        requirements: &PhaseRequirements,
        context: &GenerationContext,
    ) -> GenerationResult {
        metrics::counter!("forge_generator_requests_total", "path" => "generate").increment(1);
        let started = Instant::now();
        let run = self.run_generate(id, requirements, context, started);
        finish(id, "generate", run).await
    }

    /// Drop the cached transformation for `id`
    pub async fn invalidate(&self, id: &str) {
        self.cache.invalidate(id).await;
        debug!(artifact = id, "Invalidated cached transformation");
    }

    /// Drop every cached transformation
    pub fn clear_cache(&self) {
        self.cache.clear();
        info!("Cleared transformation cache");
    }

    /// Transformation cache statistics
    pub async fn cache_stats(&self) -> TransformCacheStats {
        self.cache.stats().await
    }

    async fn run_transform(
        &self,
        id: &str,
        document: &SpecificationDocument,
        partial: &PartialPhaseConfig,
        started: Instant,
    ) -> Result<GenerationResult, ForgeError> {
        if id.trim().is_empty() {
            return Err(ForgeError::InvalidRequirements("artifact id is empty".into()));
        }
        // Nothing to coordinate when no entry will be read or written
        let _guard = if self.config.enable_cache {
            Some(self.cache.lock(id).await)
        } else {
            None
        };

        let version = EntryVersion {
            input: Fingerprint::compute_serializable(&(document, partial))?,
            library_generation: self.library.generation(),
        };

        if self.config.enable_cache {
            if let Some(entry) = self.cache.get(id, version).await {
                metrics::counter!("forge_generator_cache_hits_total").increment(1);
                debug!(artifact = id, "Transformation cache hit");
                let metrics = GenerationMetrics {
                    processing_time_ms: elapsed_ms(started),
                    complexity_score: entry.complexity_score,
                    validation_time: entry.validation.overall_score,
                    example_matches: entry.artifact.example_count(),
                    template_usage: 0,
                    cache_hits: 1,
                };
                return Ok(GenerationResult {
                    success: true,
                    phase: Some(entry.artifact.clone()),
                    validation: entry.validation.clone(),
                    metrics,
                    warnings: entry.warnings.clone(),
                    errors: Vec::new(),
                });
            }
        }

        let mut overrides = partial.clone();
        overrides.id = Some(id.to_string());
        let outcome = self.transformer.transform(document, &overrides)?;
        let mut artifact = outcome.artifact;
        let mut warnings = outcome.warnings;

        let criteria = SearchCriteria::default()
            .with_max_examples(self.config.transform_example_limit)
            .with_min_similarity(self.config.transform_min_similarity);
        let matches = self.library.find_similar(&artifact.description, &criteria).await;
        attach_examples(&mut artifact, matches.into_iter().map(|m| m.pattern));

        let complexity_score = transform_complexity(&artifact);
        if partial.complexity.is_none() {
            artifact.complexity = Complexity::from_score(f64::from(complexity_score));
        }

        let validation = self.gate.validate_and_fix(&mut artifact).await;
        if !validation.passed {
            warnings.push(format!(
                "validation failed with score {:.1}",
                validation.overall_score
            ));
        }

        let metrics = GenerationMetrics {
            processing_time_ms: elapsed_ms(started),
            complexity_score,
            validation_time: validation.overall_score,
            example_matches: artifact.example_count(),
            template_usage: 0,
            cache_hits: 0,
        };

        if self.config.enable_cache {
            self.cache
                .insert(
                    id,
                    CachedTransform {
                        version,
                        artifact: artifact.clone(),
                        validation: validation.clone(),
                        complexity_score,
                        warnings: warnings.clone(),
                    },
                )
                .await;
        }

        info!(
            artifact = id,
            passed = validation.passed,
            score = validation.overall_score,
            examples = metrics.example_matches,
            "Transformed phase"
        );

        Ok(GenerationResult {
            success: true,
            phase: Some(artifact),
            validation,
            metrics,
            warnings,
            errors: Vec::new(),
        })
    }

    async fn run_generate(
        &self,
        id: &str,
        requirements: &PhaseRequirements,
        context: &GenerationContext,
        started: Instant,
    ) -> Result<GenerationResult, ForgeError> {
        if id.trim().is_empty() {
            return Err(ForgeError::InvalidRequirements("artifact id is empty".into()));
        }
        let objective = requirements.objective.trim();
        if objective.is_empty() {
            return Err(ForgeError::InvalidRequirements("objective is empty".into()));
        }

        let criteria = SearchCriteria::default()
            .with_max_examples(self.config.generate_example_limit)
            .with_min_similarity(self.config.generate_min_similarity);
        let matches = self.library.find_similar(objective, &criteria).await;

        let selected = self
            .templates
            .read()
            .select(objective, &context.project_type)
            .cloned();
        let template_usage = usize::from(selected.is_some());
        let template = selected.unwrap_or_else(|| PhaseTemplate::synthesized(objective));

        let mut artifact = build_artifact(id, requirements, context, &template);
        attach_examples(&mut artifact, matches.into_iter().map(|m| m.pattern));

        let complexity_score = generate_complexity(template_usage, &artifact);
        artifact.complexity = Complexity::from_score(f64::from(complexity_score));

        let validation = self.gate.validate_and_fix(&mut artifact).await;
        let mut warnings = Vec::new();
        if template_usage == 0 {
            warnings.push("no registered template matched; synthesized one".to_string());
        }
        if !validation.passed {
            warnings.push(format!(
                "validation failed with score {:.1}",
                validation.overall_score
            ));
        }

        let metrics = GenerationMetrics {
            processing_time_ms: elapsed_ms(started),
            complexity_score,
            validation_time: validation.overall_score,
            example_matches: artifact.example_count(),
            template_usage,
            cache_hits: 0,
        };

        info!(
            artifact = id,
            template = %template.id,
            passed = validation.passed,
            score = validation.overall_score,
            "Generated phase"
        );

        Ok(GenerationResult {
            success: true,
            phase: Some(artifact),
            validation,
            metrics,
            warnings,
            errors: Vec::new(),
        })
    }
}

/// Run a pipeline future, folding errors and panics into the envelope
async fn finish<F>(id: &str, path: &'static str, run: F) -> GenerationResult
where
    F: Future<Output = Result<GenerationResult, ForgeError>>,
{
    let outcome = match AssertUnwindSafe(run).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(ForgeError::Panicked(panic_message(payload.as_ref()))),
    };
    match outcome {
        Ok(result) => result,
        Err(err) => {
            metrics::counter!("forge_generator_failures_total", "path" => path).increment(1);
            error!(artifact = id, path, error = %err, "Pipeline failed");
            GenerationResult::failed(id, err.to_string())
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// templates x3 + examples x2 + dependencies; transformation uses no template
fn transform_complexity(artifact: &PhaseArtifact) -> u32 {
    count(artifact.example_count())
        .saturating_mul(2)
        .saturating_add(count(artifact.dependencies.len()))
}

/// templates x2 + examples + dependencies x2
fn generate_complexity(templates: usize, artifact: &PhaseArtifact) -> u32 {
    count(templates)
        .saturating_mul(2)
        .saturating_add(count(artifact.example_count()))
        .saturating_add(count(artifact.dependencies.len()).saturating_mul(2))
}

/// Append matched examples not already attached
fn attach_examples(artifact: &mut PhaseArtifact, matches: impl Iterator<Item = ExamplePattern>) {
    let examples = artifact.example_patterns.get_or_insert_with(Vec::new);
    let before = examples.len();
    for pattern in matches {
        if !examples.iter().any(|p| p.id == pattern.id) {
            examples.push(pattern);
        }
    }
    let added = examples.len() - before;
    if added > 0 {
        artifact.metadata.changes.push(ChangeEntry::now(
            ChangeKind::Added,
            "examplePatterns",
            format!("Attached {added} similar example(s)"),
            Impact::Medium,
        ));
    }
}

fn build_artifact(
    id: &str,
    requirements: &PhaseRequirements,
    context: &GenerationContext,
    template: &PhaseTemplate,
) -> PhaseArtifact {
    let objective = requirements.objective.trim();
    let name = requirements
        .name
        .clone()
        .or_else(|| context.current_phase.clone())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| id.to_string());
    let description = requirements.description.clone().unwrap_or_else(|| {
        let mut description = format!("{}.", objective.trim_end_matches('.'));
        if !context.project_name.is_empty() {
            description.push_str(&format!(" Part of the {} project", context.project_name));
            if !context.project_type.is_empty() {
                description.push_str(&format!(" ({})", context.project_type));
            }
            description.push('.');
        }
        description
    });

    let mut success_criteria = requirements.functional.clone();
    extend_unique(&mut success_criteria, &template.success_criteria);

    let mut context_requirements = requirements.non_functional.clone();
    extend_unique(&mut context_requirements, &requirements.constraints);
    extend_unique(&mut context_requirements, &context.constraints);
    extend_unique(
        &mut context_requirements,
        &context
            .previous_phases
            .iter()
            .map(|phase| format!("Builds on completed phase '{phase}'"))
            .collect::<Vec<_>>(),
    );
    extend_unique(
        &mut context_requirements,
        &context
            .system_capabilities
            .iter()
            .map(|capability| format!("May rely on {capability}"))
            .collect::<Vec<_>>(),
    );
    extend_unique(&mut context_requirements, &template.context_requirements);

    let mut validation_checkpoints: Vec<String> = requirements
        .functional
        .iter()
        .map(|criterion| format!("Verify that {}", criterion.to_lowercase()))
        .collect();
    extend_unique(&mut validation_checkpoints, &template.validation_checkpoints);

    let mut artifact = PhaseArtifact::new(id, name, description)
        .with_objective(objective)
        .with_success_criteria(success_criteria)
        .with_context_requirements(context_requirements)
        .with_validation_checkpoints(validation_checkpoints)
        .with_dependencies(requirements.dependencies.iter().cloned());
    artifact.example_patterns = Some(Vec::new());

    let now = Utc::now();
    artifact.metadata.created_at = Some(now);
    artifact.metadata.template_id = Some(template.id.clone());
    artifact.metadata.changes.push(ChangeEntry::now(
        ChangeKind::Added,
        "template",
        format!("Built from template '{}'", template.id),
        Impact::High,
    ));
    for (key, value) in &context.user_preferences {
        artifact
            .metadata
            .extra_sections
            .insert(format!("preference.{key}"), value.clone());
    }
    artifact
}

fn extend_unique(target: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}
