//! Pipeline orchestration.
//!
//! Per function the flow is: extract facts, run the rule checks, then
//! optionally escalate to the semantic tier and cross-validate the answer.
//! Only a source file that fails to parse is fatal to that file; every
//! later failure degrades the affected function and the batch continues.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::checks::CheckRegistry;
use crate::config::VerifierConfig;
use crate::core::{
    generate_report, Category, Finding, FindingConfidence, LlmCheckMetadata, Severity, Tier,
    ValidationResult, VerificationReport,
};
use crate::facts::{extract_function_facts, FunctionFacts};
use crate::llm::prompts::{build_null_safety_prompt, NULL_SAFETY_TEMPLATE_ID};
use crate::llm::{
    parse_null_safety_response, CompletionOptions, LlmProvider, SemanticAnswer,
};
use crate::parse::{parse_module, ParseError};
use crate::validate::cross_validate_null_safety;

pub struct Pipeline {
    registry: CheckRegistry,
    provider: Option<Arc<dyn LlmProvider>>,
    config: VerifierConfig,
}

impl Pipeline {
    pub fn new(config: VerifierConfig) -> Self {
        let registry = CheckRegistry::with_defaults().with_parallel(config.parallel_checks);
        Self {
            registry,
            provider: None,
            config,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_registry(mut self, registry: CheckRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub async fn verify_file(&self, path: &Path) -> Result<VerificationReport> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let report = self
            .verify_source(&path.display().to_string(), &source)
            .await?;
        Ok(report)
    }

    /// Verify all functions in one source file. Fails only when the source
    /// does not parse.
    pub async fn verify_source(
        &self,
        file_path: &str,
        source: &str,
    ) -> Result<VerificationReport, ParseError> {
        info!(file = file_path, "verification started");

        let module = parse_module(source)?;
        let decls = module.functions();
        info!(file = file_path, functions = decls.len(), "module parsed");

        let mut all_findings = Vec::new();
        let mut analyzed = Vec::new();

        for decl in &decls {
            let Some(node) = module.function_node(decl) else {
                warn!(function = %decl.name, "declaration node not found, skipping");
                continue;
            };

            let facts = extract_function_facts(
                node,
                module.source(),
                decl.class_name.as_deref(),
                module.star_imports_used(),
            );
            analyzed.push(facts.qualified_name.clone());

            let rule_findings = self.registry.run_all(&facts);
            debug!(
                function = %facts.qualified_name,
                findings = rule_findings.len(),
                "rule checks complete"
            );
            all_findings.extend(rule_findings);

            if let Some(provider) = &self.provider {
                if facts.loc <= self.config.max_loc_for_semantic_checks {
                    match self.null_safety_check(&facts, provider.as_ref()).await {
                        Ok(Some(finding)) => all_findings.push(finding),
                        Ok(None) => {}
                        Err(e) => {
                            // degrade this function, keep the batch alive
                            warn!(
                                function = %facts.qualified_name,
                                error = %e,
                                "semantic check failed, skipping"
                            );
                        }
                    }
                } else {
                    info!(
                        function = %facts.qualified_name,
                        loc = facts.loc,
                        budget = self.config.max_loc_for_semantic_checks,
                        "semantic check skipped, function over budget"
                    );
                }
            }
        }

        let report = generate_report(file_path, source, analyzed, all_findings);
        info!(
            file = file_path,
            findings = report.metrics.finding_count,
            critical = report.metrics.critical_findings,
            analysis_id = %report.analysis_id,
            "verification complete"
        );
        Ok(report)
    }

    /// One semantic escalation: prompt, complete, parse, cross-validate.
    /// Returns at most one finding.
    async fn null_safety_check(
        &self,
        facts: &FunctionFacts,
        provider: &dyn LlmProvider,
    ) -> Result<Option<Finding>> {
        let prompt = build_null_safety_prompt(facts);
        let options = CompletionOptions {
            max_tokens: self.config.llm.max_tokens,
            temperature: self.config.llm.temperature,
        };

        let completion = provider.complete(&prompt, &options).await?;
        let raw_response = completion.text;
        let (answer, blamed_names) = parse_null_safety_response(&raw_response);
        let (confidence, validation) = cross_validate_null_safety(answer, &blamed_names, facts);

        debug!(
            function = %facts.qualified_name,
            answer = %answer,
            validation = %validation,
            "semantic answer cross-validated"
        );

        let metadata = |parsed_answer: String| LlmCheckMetadata {
            prompt_template: NULL_SAFETY_TEMPLATE_ID.to_string(),
            model_id: provider.model_id().to_string(),
            attempts: completion.attempts,
            raw_response: raw_response.clone(),
            parsed_answer,
            cross_validation_result: validation,
        };

        match (answer, validation) {
            (SemanticAnswer::Unclear, _) => Ok(None),
            (SemanticAnswer::Safe, ValidationResult::Confirmed) => Ok(None),
            (SemanticAnswer::Safe, _) => {
                // the model missed parameters the facts show are unchecked;
                // surface the disagreement instead of dropping it
                let unchecked: Vec<&str> = facts
                    .param_names()
                    .into_iter()
                    .filter(|p| !facts.none_checked_params.contains(*p))
                    .collect();
                Ok(Some(
                    Finding::new(
                        &facts.qualified_name,
                        "null_safety",
                        Severity::Medium,
                        Category::Logic,
                        "Null safety claim contradicted by extracted facts",
                        format!(
                            "Model analysis claims function {} handles None for all \
                             parameters, but parameters {} have no None check. The \
                             disagreement is surfaced for review.",
                            facts.function_name,
                            unchecked.join(", ")
                        ),
                    )
                    .at(&facts.function_name, facts.line_start)
                    .with_tier(Tier::Semantic)
                    .with_confidence(confidence)
                    .with_evidence(vec![
                        format!("model analysis: {raw_response}"),
                        format!("cross-validation: {validation}"),
                        format!("parameters without None checks: {}", unchecked.join(", ")),
                    ])
                    .with_llm_metadata(metadata(format!("{answer}: []"))),
                ))
            }
            (SemanticAnswer::Unsafe, _) if blamed_names.is_empty() => {
                // the verdict blames no parameter, so nothing can be checked
                // against the facts; surface the claim instead of dropping it
                Ok(Some(
                    Finding::new(
                        &facts.qualified_name,
                        "null_safety",
                        Severity::Medium,
                        Category::Logic,
                        "Null safety issue reported without parameter names",
                        format!(
                            "Model analysis flags function {} as unsafe but names \
                             no parameters, so the claim cannot be checked against \
                             the extracted facts. Surfaced for review.",
                            facts.function_name
                        ),
                    )
                    .at(&facts.function_name, facts.line_start)
                    .with_tier(Tier::Semantic)
                    .with_confidence(FindingConfidence::Low)
                    .with_evidence(vec![
                        format!("model analysis: {raw_response}"),
                        "no parameter names extracted from the verdict".to_string(),
                    ])
                    .with_llm_metadata(metadata(format!("{answer}: []"))),
                ))
            }
            (SemanticAnswer::Unsafe, _) => {
                let severity = if validation == ValidationResult::Confirmed {
                    Severity::High
                } else {
                    Severity::Medium
                };
                let names = blamed_names.join(", ");
                Ok(Some(
                    Finding::new(
                        &facts.qualified_name,
                        "null_safety",
                        severity,
                        Category::Logic,
                        format!("Null safety issue: {names}"),
                        format!(
                            "Function {} may crash if passed None for parameters: \
                             {names}. These parameters are used without None checks.",
                            facts.function_name
                        ),
                    )
                    .at(&facts.function_name, facts.line_start)
                    .with_tier(Tier::Semantic)
                    .with_confidence(confidence)
                    .with_evidence(vec![
                        format!("model analysis: {raw_response}"),
                        format!("cross-validation: {validation}"),
                    ])
                    .with_llm_metadata(metadata(format!("{answer}: {names}"))),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{FailingProvider, StubProvider};

    const UNSAFE_SOURCE: &str = "def greet(name):\n    return name.upper()\n";

    fn pipeline() -> Pipeline {
        Pipeline::new(VerifierConfig::default())
    }

    #[tokio::test]
    async fn rule_checks_run_without_provider() {
        let source = "def f():\n    try:\n        g()\n    except:\n        pass\n";
        let report = pipeline().verify_source("t.py", source).await.unwrap();
        assert_eq!(report.metrics.finding_count, 1);
        assert_eq!(report.findings[0].finding_type, "bare_except");
        assert_eq!(report.functions_analyzed, vec!["f"]);
    }

    #[tokio::test]
    async fn unsafe_answer_becomes_semantic_finding() {
        let provider = Arc::new(
            StubProvider::new().with_response("greet", "UNSAFE: name (calls .upper())"),
        );
        let report = pipeline()
            .with_provider(provider.clone())
            .verify_source("t.py", UNSAFE_SOURCE)
            .await
            .unwrap();

        assert_eq!(provider.call_count(), 1);
        let finding = report
            .findings
            .iter()
            .find(|f| f.finding_type == "null_safety")
            .unwrap();
        assert_eq!(finding.tier, Tier::Semantic);
        assert_eq!(finding.severity, Severity::High);
        assert_eq!(finding.confidence, FindingConfidence::High);
        let metadata = finding.llm_metadata.as_ref().unwrap();
        assert_eq!(metadata.cross_validation_result, ValidationResult::Confirmed);
        assert_eq!(metadata.model_id, "stub");
        assert_eq!(metadata.attempts, 1);
    }

    #[tokio::test]
    async fn unsafe_answer_without_names_is_surfaced() {
        let provider = Arc::new(StubProvider::new().with_response("greet", "UNSAFE: it will crash"));
        let report = pipeline()
            .with_provider(provider)
            .verify_source("t.py", UNSAFE_SOURCE)
            .await
            .unwrap();

        let finding = report
            .findings
            .iter()
            .find(|f| f.finding_type == "null_safety")
            .unwrap();
        assert_eq!(finding.severity, Severity::Medium);
        assert_eq!(finding.confidence, FindingConfidence::Low);
        assert!(finding.title.contains("without parameter names"));
    }

    #[tokio::test]
    async fn contradicted_unsafe_answer_is_downgraded() {
        let source = "def greet(name):\n    if name is None:\n        return ''\n    return name.upper()\n";
        let provider = Arc::new(StubProvider::new().with_response("greet", "UNSAFE: name"));
        let report = pipeline()
            .with_provider(provider)
            .verify_source("t.py", source)
            .await
            .unwrap();

        let finding = report
            .findings
            .iter()
            .find(|f| f.finding_type == "null_safety")
            .unwrap();
        assert_eq!(finding.severity, Severity::Medium);
        assert_eq!(finding.confidence, FindingConfidence::Low);
        assert_eq!(
            finding.llm_metadata.as_ref().unwrap().cross_validation_result,
            ValidationResult::Contradicted
        );
    }

    #[tokio::test]
    async fn contradicted_safe_answer_is_surfaced() {
        let provider = Arc::new(
            StubProvider::new().with_response("greet", "SAFE: all parameters handled"),
        );
        let report = pipeline()
            .with_provider(provider)
            .verify_source("t.py", UNSAFE_SOURCE)
            .await
            .unwrap();

        let finding = report
            .findings
            .iter()
            .find(|f| f.finding_type == "null_safety")
            .unwrap();
        assert_eq!(finding.severity, Severity::Medium);
        assert_eq!(finding.confidence, FindingConfidence::Low);
        assert!(finding.description.contains("name"));
    }

    #[tokio::test]
    async fn unclear_answer_produces_no_finding() {
        let provider = Arc::new(StubProvider::new());
        let report = pipeline()
            .with_provider(provider)
            .verify_source("t.py", UNSAFE_SOURCE)
            .await
            .unwrap();
        assert!(report.findings.iter().all(|f| f.finding_type != "null_safety"));
    }

    #[tokio::test]
    async fn over_budget_function_skips_escalation() {
        let mut config = VerifierConfig::default();
        config.max_loc_for_semantic_checks = 1;
        let provider = Arc::new(StubProvider::new().with_response("greet", "UNSAFE: name"));
        let report = Pipeline::new(config)
            .with_provider(provider.clone())
            .verify_source("t.py", UNSAFE_SOURCE)
            .await
            .unwrap();

        assert_eq!(provider.call_count(), 0);
        assert!(report.findings.iter().all(|f| f.tier != Tier::Semantic));
    }

    #[tokio::test]
    async fn adapter_failure_degrades_function_and_continues() {
        let source = "def a(x):\n    return x.strip()\n\ndef b(y):\n    return y.strip()\n";
        let provider = Arc::new(FailingProvider::new("provider down"));
        let report = pipeline()
            .with_provider(provider.clone())
            .verify_source("t.py", source)
            .await
            .unwrap();

        // both functions were attempted, neither aborted the run
        assert_eq!(provider.call_count(), 2);
        assert_eq!(report.functions_analyzed, vec!["a", "b"]);
        assert!(report.findings.iter().all(|f| f.tier != Tier::Semantic));
    }

    #[tokio::test]
    async fn malformed_source_is_a_parse_error() {
        let err = pipeline()
            .verify_source("t.py", "def broken(:\n    pass\n")
            .await
            .unwrap_err();
        assert!(err.line >= 1);
    }
}
