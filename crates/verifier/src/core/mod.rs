//! Core result types shared across the pipeline stages.

mod finding;
mod report;
mod severity;

pub use finding::{Finding, LlmCheckMetadata};
pub use report::{generate_report, ReportMetrics, VerificationReport};
pub use severity::{Category, FindingConfidence, Severity, Tier, ValidationResult};
