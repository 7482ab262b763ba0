//! Report assembly.
//!
//! A report carries its own provenance (analysis id, source hash, timestamp)
//! and is explicit about the epistemics: proven properties are stated as the
//! absence of finding categories at the tiers actually run, and the fixed
//! assumptions/limitations lists are always included so partial confidence is
//! never presented as certainty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::core::{Finding, Severity, Tier};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetrics {
    pub total_lines: usize,
    /// Non-blank, non-comment lines.
    pub lines_of_code: usize,
    pub function_count: usize,
    pub finding_count: usize,
    pub critical_findings: usize,
    pub high_findings: usize,
    pub medium_findings: usize,
    pub low_findings: usize,
    pub info_findings: usize,
    pub deterministic_findings: usize,
    pub heuristic_findings: usize,
    pub semantic_findings: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub analysis_id: String,
    pub timestamp: DateTime<Utc>,
    /// SHA-256 of the analyzed source, hex-encoded.
    pub code_hash: String,
    pub file_path: String,
    pub language: String,
    pub function_count: usize,
    pub functions_analyzed: Vec<String>,
    pub findings: Vec<Finding>,
    pub proven_properties: Vec<String>,
    pub assumptions: Vec<String>,
    pub limitations: Vec<String>,
    pub metrics: ReportMetrics,
}

impl VerificationReport {
    pub fn has_critical_findings(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Critical)
    }

    pub fn findings_by_severity(&self, severity: Severity) -> Vec<&Finding> {
        self.findings.iter().filter(|f| f.severity == severity).collect()
    }
}

pub fn generate_report(
    file_path: &str,
    source_code: &str,
    functions_analyzed: Vec<String>,
    findings: Vec<Finding>,
) -> VerificationReport {
    let code_hash = hex::encode(Sha256::digest(source_code.as_bytes()));
    let metrics = calculate_metrics(source_code, functions_analyzed.len(), &findings);

    VerificationReport {
        analysis_id: Uuid::new_v4().to_string(),
        timestamp: Utc::now(),
        code_hash,
        file_path: file_path.to_string(),
        language: "python".to_string(),
        function_count: functions_analyzed.len(),
        functions_analyzed,
        proven_properties: proven_properties(&findings),
        assumptions: assumptions(),
        limitations: limitations(),
        metrics,
        findings,
    }
}

/// A property counts as proven only in the negative sense: the checks that
/// would have flagged it ran and stayed silent.
fn proven_properties(findings: &[Finding]) -> Vec<String> {
    let mut properties = Vec::new();

    let has_security = findings
        .iter()
        .any(|f| f.category == crate::core::Category::Security);
    if !has_security {
        properties
            .push("No critical security vulnerabilities detected (deterministic and heuristic tiers)".to_string());
    }

    let has_leaks = findings.iter().any(|f| {
        let title = f.title.to_lowercase();
        title.contains("resource leak") || title.contains("file")
    });
    if !has_leaks {
        properties.push("No resource leaks detected (open() without context manager)".to_string());
    }

    let has_mutable = findings
        .iter()
        .any(|f| f.title.to_lowercase().contains("mutable"));
    if !has_mutable {
        properties.push("No mutable default arguments".to_string());
    }

    properties
}

fn assumptions() -> Vec<String> {
    [
        "Static analysis assumes code paths are representative of runtime behavior",
        "Syntax-tree analysis is limited to the provided source file",
        "External dependencies and library calls are not analyzed",
        "Model-assisted checks depend on model accuracy",
        "Cross-validation assumes extracted facts are ground truth",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn limitations() -> Vec<String> {
    [
        "Dynamic code execution (eval, exec) not analyzed",
        "Inter-procedural analysis limited to single file",
        "Type inference based on annotations, not runtime behavior",
        "Model responses may contain false positives or negatives",
        "Star imports from external modules not tracked",
        "Decorator side effects not analyzed",
        "Property/setter/descriptor behavior not fully analyzed",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn calculate_metrics(
    source_code: &str,
    function_count: usize,
    findings: &[Finding],
) -> ReportMetrics {
    let lines: Vec<&str> = source_code.lines().collect();
    let lines_of_code = lines
        .iter()
        .filter(|l| {
            let trimmed = l.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .count();

    let by_severity =
        |severity: Severity| findings.iter().filter(|f| f.severity == severity).count();
    let by_tier = |tier: Tier| findings.iter().filter(|f| f.tier == tier).count();

    ReportMetrics {
        total_lines: lines.len(),
        lines_of_code,
        function_count,
        finding_count: findings.len(),
        critical_findings: by_severity(Severity::Critical),
        high_findings: by_severity(Severity::High),
        medium_findings: by_severity(Severity::Medium),
        low_findings: by_severity(Severity::Low),
        info_findings: by_severity(Severity::Info),
        deterministic_findings: by_tier(Tier::Deterministic),
        heuristic_findings: by_tier(Tier::Heuristic),
        semantic_findings: by_tier(Tier::Semantic),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Category;

    fn finding(severity: Severity, category: Category, title: &str) -> Finding {
        Finding::new("f", "t", severity, category, title, "d").at("f", 1)
    }

    #[test]
    fn clean_source_proves_all_properties() {
        let report = generate_report("a.py", "x = 1\n", vec![], vec![]);
        assert_eq!(report.proven_properties.len(), 3);
        assert_eq!(report.metrics.finding_count, 0);
        assert!(!report.has_critical_findings());
        assert_eq!(report.code_hash.len(), 64);
    }

    #[test]
    fn security_finding_withdraws_the_security_property() {
        let findings = vec![finding(
            Severity::Critical,
            Category::Security,
            "Command injection risk",
        )];
        let report = generate_report("a.py", "x = 1\n", vec!["f".to_string()], findings);
        assert!(!report
            .proven_properties
            .iter()
            .any(|p| p.contains("security")));
        assert!(report.has_critical_findings());
        assert_eq!(report.metrics.critical_findings, 1);
    }

    #[test]
    fn metrics_skip_blank_and_comment_lines() {
        let source = "# header\n\ndef f():\n    return 1\n";
        let report = generate_report("a.py", source, vec!["f".to_string()], vec![]);
        assert_eq!(report.metrics.total_lines, 4);
        assert_eq!(report.metrics.lines_of_code, 2);
    }

    #[test]
    fn json_round_trip() {
        let findings = vec![finding(Severity::Medium, Category::Logic, "Mutable default")];
        let report = generate_report("a.py", "x = 1\n", vec!["f".to_string()], findings);
        let json = serde_json::to_string_pretty(&report).unwrap();
        let back: VerificationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report, back);
    }
}
