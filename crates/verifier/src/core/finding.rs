use crate::core::{Category, FindingConfidence, Severity, Tier, ValidationResult};
use serde::{Deserialize, Serialize};

/// Provenance of a semantic-tier finding: enough to reproduce the model
/// interaction and audit how the claim was cross-validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmCheckMetadata {
    pub prompt_template: String,
    pub model_id: String,
    pub attempts: u32,
    pub raw_response: String,
    pub parsed_answer: String,
    pub cross_validation_result: ValidationResult,
}

/// A single reportable issue. Created once by a check or by the semantic
/// escalation step, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Stable id, derived from the qualified function name and check name.
    pub id: String,

    /// Check name, used as the SARIF ruleId suffix.
    pub finding_type: String,

    pub severity: Severity,

    pub category: Category,

    pub title: String,

    pub description: String,

    /// `function_name:line_start`
    pub location: String,

    pub tier: Tier,

    pub confidence: FindingConfidence,

    pub evidence: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub counterexample: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub suggested_fix: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub llm_metadata: Option<LlmCheckMetadata>,
}

impl Finding {
    pub fn new(
        qualified_name: &str,
        finding_type: &str,
        severity: Severity,
        category: Category,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: format!("{qualified_name}:{finding_type}"),
            finding_type: finding_type.to_string(),
            severity,
            category,
            title: title.into(),
            description: description.into(),
            location: String::new(),
            tier: Tier::Deterministic,
            confidence: FindingConfidence::High,
            evidence: Vec::new(),
            counterexample: None,
            suggested_fix: None,
            llm_metadata: None,
        }
    }

    pub fn at(mut self, function_name: &str, line: usize) -> Self {
        self.location = format!("{function_name}:{line}");
        self
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_confidence(mut self, confidence: FindingConfidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_evidence(mut self, evidence: Vec<String>) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn with_counterexample(mut self, counterexample: impl Into<String>) -> Self {
        self.counterexample = Some(counterexample.into());
        self
    }

    pub fn with_suggested_fix(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fix = Some(fix.into());
        self
    }

    pub fn with_llm_metadata(mut self, metadata: LlmCheckMetadata) -> Self {
        self.llm_metadata = Some(metadata);
        self
    }

    /// SARIF ruleId: `<category>.<finding_type>`.
    pub fn rule_id(&self) -> String {
        format!("{}.{}", self.category, self.finding_type)
    }

    /// Line number parsed back out of the location string, for exporters.
    pub fn line(&self) -> usize {
        self.location
            .rsplit(':')
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1)
    }
}
