//! Testing utilities for the Phase Forge workspace
//!
//! Shared fixtures and tracing setup.

#![allow(missing_docs)]

use forge_artifact::{ExamplePattern, PhaseArtifact, SpecificationDocument};
use std::sync::Once;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Install a fmt subscriber filtered by `RUST_LOG` (default `warn`)
///
/// `FORGE_LOG_FORMAT=json` switches to JSON lines. Safe to call from every
/// test; only the first call installs.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer();
        let json = std::env::var("FORGE_LOG_FORMAT").is_ok_and(|f| f == "json");
        let _ = if json {
            builder.json().try_init()
        } else {
            builder.compact().try_init()
        };
    });
}

/// Small library spanning two domains
///
/// "build an api" matches only `rest-endpoint` (similarity 0.25).
pub fn sample_patterns() -> Vec<ExamplePattern> {
    vec![
        ExamplePattern::new(
            "rest-endpoint",
            "REST endpoint",
            "RESTful API endpoint implementation",
            "web",
        )
        .with_quality(0.9)
        .with_category("api")
        .with_complexity(0.5)
        .with_example(
            "GET /users/{id}",
            "200 OK with a user document",
            "HTTP handler behind the router",
        ),
        ExamplePattern::new(
            "db-query",
            "Query tuning",
            "database query optimization",
            "data",
        )
        .with_quality(0.75)
        .with_category("performance")
        .with_complexity(0.7),
        ExamplePattern::new(
            "form-validation",
            "Form validation",
            "client side form input validation",
            "web",
        )
        .with_quality(0.6)
        .with_category("ui")
        .with_complexity(0.3),
        ExamplePattern::new(
            "batch-etl",
            "Batch ETL",
            "batch data extraction and loading jobs",
            "data",
        )
        .with_quality(0.4)
        .with_category("pipeline")
        .with_complexity(0.6),
    ]
}

/// Artifact with every canonical section filled in
pub fn complete_artifact(id: &str) -> PhaseArtifact {
    PhaseArtifact::new(
        id,
        "User authentication",
        "Implement token based login for the web client. Store sessions in the cache \
         and expire them after thirty minutes. Reject invalid credentials with a clear \
         error message.\n\nLog every failed attempt for auditing.",
    )
    .with_objective("Create a secure login flow that issues signed session tokens")
    .with_success_criteria([
        "Login returns a token within 200 ms",
        "Invalid credentials return status 401",
        "Sessions expire after 30 minutes",
    ])
    .with_context_requirements([
        "Implement the handler in the auth service",
        "Use the existing session cache",
    ])
    .with_validation_checkpoints([
        "Verify token signature in integration tests",
        "Measure login latency under load",
    ])
}

/// Artifact lacking objective, success criteria and context requirements
pub fn artifact_missing_sections(id: &str) -> PhaseArtifact {
    PhaseArtifact::new(id, "Reporting", "Reports.")
}

/// Header-structured specification text
pub fn sample_spec_text() -> &'static str {
    "# Payment Processing\n\
     \n\
     Process card payments for the storefront and record every transaction.\n\
     \n\
     ## Objective\n\
     Accept card payments through the payment gateway.\n\
     \n\
     ## Requirements\n\
     - Validate card numbers before submission\n\
     - Respond within 300 ms for ninety percent of requests\n\
     - Store transactions in the ledger database\n\
     \n\
     ## Implementation\n\
     1. Create the gateway client\n\
     2. Build the checkout handler after the gateway client\n\
     3. Write ledger records, requires the checkout handler\n"
}

/// Text document wrapping [`sample_spec_text`]
pub fn sample_document() -> SpecificationDocument {
    SpecificationDocument::text(sample_spec_text())
}

/// Structured record with a subset of canonical fields
pub fn sample_structured() -> serde_json::Value {
    serde_json::json!({
        "id": "search",
        "name": "Product search",
        "description": "Build full text search over the product catalogue.",
        "objective": "Return relevant products for free text queries",
        "successCriteria": ["Top result matches exact product names"],
        "dependencies": ["catalogue"]
    })
}
