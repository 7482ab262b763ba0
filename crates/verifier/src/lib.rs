//! attest-verifier - Evidence-Graded Function Verification
//!
//! This crate verifies individual Python functions by extracting deterministic
//! facts from the syntax tree, running a registry of rule checks over them,
//! optionally escalating to a model-assisted semantic check, and
//! cross-validating the model's claim against the facts before it becomes a
//! reportable finding.

pub mod checks;
pub mod complexity;
pub mod config;
pub mod core;
pub mod export;
pub mod facts;
pub mod llm;
pub mod parse;
pub mod pipeline;
pub mod validate;

pub use checks::{Check, CheckRegistry};

pub use config::{LlmSettings, VerifierConfig};

pub use core::{
    generate_report, Category, Finding, FindingConfidence, LlmCheckMetadata, ReportMetrics,
    Severity, Tier, ValidationResult, VerificationReport,
};

pub use export::{ExportFormat, ReportExporter};

pub use facts::{extract_function_facts, FunctionFacts, ParameterInfo};

pub use llm::{
    Completion, CompletionOptions, FailingProvider, HttpProvider, LlmError, LlmProvider,
    SemanticAnswer, StubProvider,
};

pub use parse::{parse_module, FunctionDecl, ParseError, ParsedModule};

pub use pipeline::Pipeline;

pub use validate::cross_validate_null_safety;
