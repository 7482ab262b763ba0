//! Report export: JSON, SARIF 2.1.0, console text and HTML.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use serde_json::json;

use crate::core::{Finding, Severity, VerificationReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Sarif,
    Console,
    Html,
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "sarif" => Ok(Self::Sarif),
            "console" => Ok(Self::Console),
            "html" => Ok(Self::Html),
            other => anyhow::bail!("unknown export format: {other}"),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Sarif => write!(f, "sarif"),
            Self::Console => write!(f, "console"),
            Self::Html => write!(f, "html"),
        }
    }
}

pub struct ReportExporter<'a> {
    report: &'a VerificationReport,
}

impl<'a> ReportExporter<'a> {
    pub fn new(report: &'a VerificationReport) -> Self {
        Self { report }
    }

    pub fn export(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Json => self.to_json(),
            ExportFormat::Sarif => self.to_sarif(),
            ExportFormat::Console => Ok(self.to_console()),
            ExportFormat::Html => Ok(self.to_html()),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self.report)?)
    }

    pub fn to_sarif(&self) -> Result<String> {
        let results: Vec<serde_json::Value> = self
            .report
            .findings
            .iter()
            .map(|finding| {
                json!({
                    "ruleId": finding.rule_id(),
                    "level": finding.severity.sarif_level(),
                    "message": { "text": finding.description },
                    "locations": [{
                        "physicalLocation": {
                            "artifactLocation": { "uri": self.report.file_path },
                            "region": { "startLine": finding.line() },
                        },
                    }],
                })
            })
            .collect();

        let sarif = json!({
            "version": "2.1.0",
            "$schema": "https://json.schemastore.org/sarif-2.1.0.json",
            "runs": [{
                "tool": {
                    "driver": {
                        "name": "attest",
                        "version": env!("CARGO_PKG_VERSION"),
                        "rules": [],
                    }
                },
                "results": results,
                "invocations": [{
                    "startTimeUtc": self.report.timestamp.to_rfc3339(),
                    "endTimeUtc": Utc::now().to_rfc3339(),
                }],
            }],
        });

        Ok(serde_json::to_string_pretty(&sarif)?)
    }

    pub fn to_console(&self) -> String {
        let report = self.report;
        let mut lines = vec![
            "=".repeat(70),
            "Verification Report".bold().to_string(),
            "=".repeat(70),
            String::new(),
            format!("File: {}", report.file_path),
            format!("Analysis ID: {}", report.analysis_id),
            format!("Timestamp: {}", report.timestamp.format("%Y-%m-%d %H:%M:%S")),
            format!("Functions Analyzed: {}", report.function_count),
            String::new(),
            format!("Total Findings: {}", report.metrics.finding_count),
            format!("  Critical: {}", report.metrics.critical_findings),
            format!("  High: {}", report.metrics.high_findings),
            format!("  Medium: {}", report.metrics.medium_findings),
            format!("  Low: {}", report.metrics.low_findings),
            String::new(),
        ];

        if report.findings.is_empty() {
            lines.push("No findings.".green().to_string());
            lines.push(String::new());
        } else {
            for severity in [
                Severity::Critical,
                Severity::High,
                Severity::Medium,
                Severity::Low,
                Severity::Info,
            ] {
                let group = report.findings_by_severity(severity);
                if group.is_empty() {
                    continue;
                }
                lines.push(format!(
                    "{} ({}):",
                    severity_label(severity),
                    group.len()
                ));
                for finding in group {
                    lines.push(format!("  - {}", finding.title));
                    lines.push(format!("    Location: {}", finding.location));
                    if let Some(evidence) = finding.evidence.first() {
                        lines.push(format!("    Evidence: {evidence}"));
                    }
                    lines.push(String::new());
                }
            }
        }

        if !report.proven_properties.is_empty() {
            lines.push("Verified Properties".bold().to_string());
            lines.push("-".repeat(70));
            for property in &report.proven_properties {
                lines.push(format!("  {} {property}", "✓".green()));
            }
            lines.push(String::new());
        }

        lines.push("Limitations".bold().to_string());
        lines.push("-".repeat(70));
        for limitation in &report.limitations {
            lines.push(format!("  • {limitation}"));
        }
        lines.push(String::new());
        lines.push("=".repeat(70));

        lines.join("\n")
    }

    pub fn to_html(&self) -> String {
        let report = self.report;
        let mut findings_html = String::new();

        if report.findings.is_empty() {
            findings_html.push_str("<p>No findings.</p>");
        } else {
            for severity in [
                Severity::Critical,
                Severity::High,
                Severity::Medium,
                Severity::Low,
                Severity::Info,
            ] {
                let group = report.findings_by_severity(severity);
                if group.is_empty() {
                    continue;
                }
                findings_html.push_str(&format!("<h2>{} findings</h2>\n", severity));
                for finding in group {
                    findings_html.push_str(&render_finding_html(finding));
                }
            }
        }

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <title>Verification Report</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 20px; }}
        h1 {{ color: #333; }}
        .summary {{ background: #f4f4f4; padding: 15px; border-radius: 5px; }}
        .finding {{ margin: 10px 0; padding: 10px; border-left: 3px solid #ccc; }}
        .finding.critical {{ border-left-color: #d32f2f; }}
        .finding.high {{ border-left-color: #f57c00; }}
        .finding.medium {{ border-left-color: #fbc02d; }}
        .finding.low {{ border-left-color: #388e3c; }}
        .finding-title {{ font-weight: bold; }}
    </style>
</head>
<body>
    <h1>Verification Report</h1>
    <p><strong>File:</strong> {file_path}</p>
    <p><strong>Analysis ID:</strong> {analysis_id}</p>
    <p><strong>Timestamp:</strong> {timestamp}</p>

    <div class="summary">
        <h2>Summary</h2>
        <p><strong>Total Findings:</strong> {total}</p>
        <p><strong>Functions Analyzed:</strong> {functions}</p>
    </div>

    {findings_html}
</body>
</html>
"#,
            file_path = escape_html(&report.file_path),
            analysis_id = report.analysis_id,
            timestamp = report.timestamp.to_rfc3339(),
            total = report.metrics.finding_count,
            functions = report.function_count,
            findings_html = findings_html,
        )
    }
}

fn render_finding_html(finding: &Finding) -> String {
    format!(
        r#"<div class="finding {severity}">
    <div class="finding-title">{title}</div>
    <p><strong>Location:</strong> {location}</p>
    <p>{description}</p>
</div>
"#,
        severity = finding.severity,
        title = escape_html(&finding.title),
        location = escape_html(&finding.location),
        description = escape_html(&finding.description),
    )
}

fn severity_label(severity: Severity) -> String {
    let label = severity.to_string().to_uppercase();
    match severity {
        Severity::Critical | Severity::High => label.red().bold().to_string(),
        Severity::Medium => label.yellow().to_string(),
        Severity::Low => label.green().to_string(),
        Severity::Info => label.blue().to_string(),
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
