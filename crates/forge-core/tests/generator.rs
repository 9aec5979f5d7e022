//! Generator pipeline behavior

use async_trait::async_trait;
use forge_artifact::{Complexity, PhaseArtifact, SpecificationDocument};
use forge_core::{
    ForgeConfig, GenerationContext, GeneratorConfig, PhaseGenerator, PhaseRequirements,
    SYNTHESIZED_TEMPLATE_ID,
};
use forge_gate::{CustomValidator, GateError, ValidationGate, ValidatorReport};
use forge_patterns::{PatternLibrary, PatternLibraryConfig};
use forge_test_utils::{init_tracing, sample_document, sample_patterns};
use forge_transform::PartialPhaseConfig;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn seeded_generator() -> anyhow::Result<PhaseGenerator> {
    let library = PatternLibrary::with_patterns(PatternLibraryConfig::default(), sample_patterns())?;
    Ok(PhaseGenerator::with_components(
        ForgeConfig::default(),
        Arc::new(library),
        Arc::new(ValidationGate::default()),
    )?)
}

fn orders_api() -> SpecificationDocument {
    SpecificationDocument::text("# Orders API\nRESTful API endpoint implementation for orders.")
}

#[tokio::test]
async fn repeated_transform_is_served_from_cache() {
    init_tracing();
    let generator = PhaseGenerator::default();
    let partial = PartialPhaseConfig::default();

    let first = generator
        .transform_existing("payments", &sample_document(), &partial)
        .await;
    let second = generator
        .transform_existing("payments", &sample_document(), &partial)
        .await;

    assert!(first.success, "{:?}", first.errors);
    assert_eq!(first.metrics.cache_hits, 0);
    assert_eq!(second.metrics.cache_hits, 1);
    assert_eq!(first.phase, second.phase);
    assert_eq!(first.validation, second.validation);
    assert_eq!(generator.gate().history("payments").len(), 1);
}

#[tokio::test]
async fn generate_never_fills_the_cache() {
    let generator = PhaseGenerator::default();
    let generated = generator
        .generate_new(
            "payments",
            &PhaseRequirements::new("Expose payment endpoints"),
            &GenerationContext::default(),
        )
        .await;
    assert!(generated.success);
    assert_eq!(generated.metrics.cache_hits, 0);

    let transformed = generator
        .transform_existing("payments", &sample_document(), &PartialPhaseConfig::default())
        .await;
    assert_eq!(transformed.metrics.cache_hits, 0);
    assert_eq!(generator.cache_stats().await.entry_count, 1);
}

#[tokio::test]
async fn changed_input_misses_the_cache() {
    let generator = PhaseGenerator::default();
    let partial = PartialPhaseConfig::default();
    generator
        .transform_existing("p", &SpecificationDocument::text("# P\nFirst draft."), &partial)
        .await;
    let changed = generator
        .transform_existing("p", &SpecificationDocument::text("# P\nSecond draft."), &partial)
        .await;
    assert_eq!(changed.metrics.cache_hits, 0);

    let renamed = generator
        .transform_existing(
            "p",
            &SpecificationDocument::text("# P\nSecond draft."),
            &PartialPhaseConfig::default().name("Renamed"),
        )
        .await;
    assert_eq!(renamed.metrics.cache_hits, 0);
}

#[tokio::test]
async fn library_mutation_misses_the_cache() -> anyhow::Result<()> {
    let generator = seeded_generator()?;
    let partial = PartialPhaseConfig::default();
    generator.transform_existing("orders", &orders_api(), &partial).await;

    generator.library().remove_pattern("batch-etl")?;
    let after = generator.transform_existing("orders", &orders_api(), &partial).await;
    assert_eq!(after.metrics.cache_hits, 0);

    let again = generator.transform_existing("orders", &orders_api(), &partial).await;
    assert_eq!(again.metrics.cache_hits, 1);
    Ok(())
}

#[tokio::test]
async fn transformed_artifact_gets_similar_examples() -> anyhow::Result<()> {
    let generator = seeded_generator()?;
    let result = generator
        .transform_existing("orders", &orders_api(), &PartialPhaseConfig::default())
        .await;

    let phase = result.phase.expect("phase");
    let ids: Vec<&str> = phase
        .example_patterns
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|p| p.id.as_str())
        .collect();
    assert_eq!(ids, vec!["rest-endpoint"]);
    assert_eq!(result.metrics.example_matches, 1);
    assert_eq!(result.metrics.complexity_score, 2);
    assert_eq!(phase.complexity, Complexity::Low);
    assert_eq!(phase.id, "orders");
    assert_eq!(result.metrics.validation_time, result.validation.overall_score);
    Ok(())
}

#[tokio::test]
async fn caller_complexity_overrides_derived_value() {
    let generator = PhaseGenerator::default();
    let result = generator
        .transform_existing(
            "orders",
            &orders_api(),
            &PartialPhaseConfig::default().complexity(Complexity::High),
        )
        .await;
    assert_eq!(result.phase.unwrap().complexity, Complexity::High);
}

#[tokio::test]
async fn generate_uses_matching_template() {
    let generator = PhaseGenerator::default();
    let requirements = PhaseRequirements::new("Expose REST endpoints for order management")
        .with_functional(["List orders by customer", "Cancel an open order"])
        .with_dependencies(["auth"]);
    let context = GenerationContext::new("shop", "web-service").with_previous_phases(["auth"]);

    let result = generator.generate_new("orders", &requirements, &context).await;
    let phase = result.phase.expect("phase");

    assert_eq!(phase.metadata.template_id.as_deref(), Some("api-service"));
    assert_eq!(result.metrics.template_usage, 1);
    assert_eq!(result.metrics.example_matches, 0);
    // one template x2, no examples, one dependency x2
    assert_eq!(result.metrics.complexity_score, 4);
    assert_eq!(phase.complexity, Complexity::Low);
    assert_eq!(phase.objective.as_deref(), Some("Expose REST endpoints for order management"));
    assert_eq!(phase.dependencies, vec!["auth".to_string()]);
    assert!(result.warnings.iter().all(|w| !w.contains("template")));
}

#[tokio::test]
async fn generate_synthesizes_template_when_none_match() {
    let generator = PhaseGenerator::default();
    let result = generator
        .generate_new(
            "report",
            &PhaseRequirements::new("Write the annual report"),
            &GenerationContext::default(),
        )
        .await;
    let phase = result.phase.expect("phase");
    assert_eq!(phase.metadata.template_id.as_deref(), Some(SYNTHESIZED_TEMPLATE_ID));
    assert_eq!(result.metrics.template_usage, 0);
    assert!(result.warnings.iter().any(|w| w.contains("template")));
}

#[tokio::test]
async fn empty_objective_fails_closed() {
    let generator = PhaseGenerator::default();
    let result = generator
        .generate_new("x", &PhaseRequirements::new("  "), &GenerationContext::default())
        .await;
    assert!(!result.success);
    assert!(result.errors[0].contains("objective"));
    assert_eq!(result.validation.overall_score, 0.0);
    assert!(result.validation.has_blocking_issues());
}

#[derive(Debug)]
struct Exploding;

#[async_trait]
impl CustomValidator for Exploding {
    fn id(&self) -> &str {
        "exploding"
    }

    async fn validate(&self, _artifact: &PhaseArtifact) -> Result<ValidatorReport, GateError> {
        panic!("validator exploded");
    }
}

#[tokio::test]
async fn panics_become_failed_envelopes() -> anyhow::Result<()> {
    let generator = PhaseGenerator::default();
    generator.gate().register_validator(Arc::new(Exploding))?;

    let transformed = generator
        .transform_existing("p", &sample_document(), &PartialPhaseConfig::default())
        .await;
    assert!(!transformed.success);
    assert!(transformed.errors[0].contains("validator exploded"));
    assert_eq!(transformed.metrics.cache_hits, 0);

    let generated = generator
        .generate_new(
            "q",
            &PhaseRequirements::new("Expose endpoints"),
            &GenerationContext::default(),
        )
        .await;
    assert!(!generated.success);
    assert!(generated.phase.is_none());

    // The lock taken before the panic was released
    generator.gate().unregister_validator("exploding")?;
    let retried = generator
        .transform_existing("p", &sample_document(), &PartialPhaseConfig::default())
        .await;
    assert!(retried.success);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_transforms_of_one_id_compute_once() {
    let generator = Arc::new(PhaseGenerator::default());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let generator = Arc::clone(&generator);
            tokio::spawn(async move {
                generator
                    .transform_existing("payments", &sample_document(), &PartialPhaseConfig::default())
                    .await
            })
        })
        .collect();

    let mut hits = 0;
    for handle in handles {
        let result = handle.await.expect("task");
        assert!(result.success);
        hits += result.metrics.cache_hits;
    }
    assert_eq!(hits, 3);
    assert_eq!(generator.gate().history("payments").len(), 1);
}

#[tokio::test]
async fn invalidate_and_clear_force_recomputation() {
    let generator = PhaseGenerator::default();
    let partial = PartialPhaseConfig::default();
    generator.transform_existing("p", &sample_document(), &partial).await;

    generator.invalidate("p").await;
    let after_invalidate = generator.transform_existing("p", &sample_document(), &partial).await;
    assert_eq!(after_invalidate.metrics.cache_hits, 0);

    generator.clear_cache();
    let after_clear = generator.transform_existing("p", &sample_document(), &partial).await;
    assert_eq!(after_clear.metrics.cache_hits, 0);
}

#[tokio::test]
async fn cache_state_stays_bounded_across_many_ids() -> anyhow::Result<()> {
    let config = ForgeConfig::default()
        .with_generator(GeneratorConfig::default().with_cache_capacity(10));
    let generator = PhaseGenerator::new(config)?;
    let partial = PartialPhaseConfig::default();

    for n in 0..200 {
        let result = generator
            .transform_existing(&format!("phase-{n}"), &sample_document(), &partial)
            .await;
        assert!(result.success, "{:?}", result.errors);
    }

    let stats = generator.cache_stats().await;
    assert!(stats.entry_count <= 10, "{stats:?}");
    assert_eq!(stats.locked_ids, 0);
    Ok(())
}

#[tokio::test]
async fn uncached_generator_allocates_no_locks() -> anyhow::Result<()> {
    let config = ForgeConfig::default().with_generator(GeneratorConfig::default().with_cache(false));
    let generator = PhaseGenerator::new(config)?;

    for n in 0..50 {
        generator
            .transform_existing(&format!("phase-{n}"), &sample_document(), &PartialPhaseConfig::default())
            .await;
    }

    let stats = generator.cache_stats().await;
    assert_eq!(stats.entry_count, 0);
    assert_eq!(stats.locked_ids, 0);
    Ok(())
}

#[tokio::test]
async fn expired_entries_are_recomputed_without_leaking_locks() -> anyhow::Result<()> {
    let config = ForgeConfig::default().with_generator(
        GeneratorConfig::default().with_cache_ttl(std::time::Duration::from_millis(50)),
    );
    let generator = PhaseGenerator::new(config)?;
    let partial = PartialPhaseConfig::default();

    generator.transform_existing("p", &sample_document(), &partial).await;
    tokio::time::sleep(std::time::Duration::from_millis(120)).await;
    let after_expiry = generator.transform_existing("p", &sample_document(), &partial).await;

    assert_eq!(after_expiry.metrics.cache_hits, 0);
    assert_eq!(generator.cache_stats().await.locked_ids, 0);
    Ok(())
}

#[tokio::test]
async fn toml_config_disables_cache() -> anyhow::Result<()> {
    let config = ForgeConfig::from_toml_str(
        "[generator]\nenable_cache = false\n\n[gate]\npass_threshold = 60.0\n",
    )?;
    assert_eq!(config.gate.pass_threshold, 60.0);
    let generator = PhaseGenerator::new(config)?;
    assert!(!generator.config().enable_cache);

    let partial = PartialPhaseConfig::default();
    generator.transform_existing("p", &sample_document(), &partial).await;
    let second = generator.transform_existing("p", &sample_document(), &partial).await;
    assert_eq!(second.metrics.cache_hits, 0);
    assert_eq!(generator.cache_stats().await.entry_count, 0);
    Ok(())
}

#[test]
fn invalid_config_is_rejected() {
    let config = ForgeConfig::default().with_generator(GeneratorConfig {
        generate_min_similarity: 1.5,
        ..GeneratorConfig::default()
    });
    assert!(PhaseGenerator::new(config).is_err());
}
