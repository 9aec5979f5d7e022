//! Per-validator output

use forge_artifact::ValidationIssue;
use serde::{Deserialize, Serialize};

/// Score and findings of one validator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorReport {
    /// Score in `[0, 100]`
    pub score: f64,
    /// Findings
    pub issues: Vec<ValidationIssue>,
}

impl ValidatorReport {
    /// Clean report with a score
    #[must_use]
    pub fn new(score: f64) -> Self {
        Self {
            score: score.clamp(0.0, 100.0),
            issues: Vec::new(),
        }
    }

    /// With an issue
    #[must_use]
    pub fn with_issue(mut self, issue: ValidationIssue) -> Self {
        self.issues.push(issue);
        self
    }
}
