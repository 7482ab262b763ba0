//! Runtime configuration for the verifier.
//!
//! Loadable from a YAML file or environment variables; every field has a
//! default so a bare `VerifierConfig::default()` is a working configuration
//! (with the semantic tier disabled until an API key is supplied).

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    #[serde(default)]
    pub llm: LlmSettings,

    /// Functions longer than this are never escalated to the semantic tier.
    #[serde(default = "default_max_loc_for_semantic_checks")]
    pub max_loc_for_semantic_checks: usize,

    /// Run the rule checks for one function across a thread pool.
    #[serde(default)]
    pub parallel_checks: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub api_key: Option<String>,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_endpoint() -> String {
    "https://api.cerebras.ai/v1/chat/completions".to_string()
}
fn default_model() -> String {
    "llama3.3-70b".to_string()
}
fn default_max_attempts() -> u32 {
    3
}
fn default_timeout_seconds() -> u64 {
    30
}
fn default_max_tokens() -> u32 {
    50
}
fn default_temperature() -> f32 {
    0.0
}
fn default_max_loc_for_semantic_checks() -> usize {
    200
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            max_attempts: default_max_attempts(),
            timeout_seconds: default_timeout_seconds(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            llm: LlmSettings::default(),
            max_loc_for_semantic_checks: default_max_loc_for_semantic_checks(),
            parallel_checks: false,
        }
    }
}

impl VerifierConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(key) = std::env::var("VERIFIER_API_KEY") {
            if !key.is_empty() {
                config.llm.api_key = Some(key);
            }
        }
        if let Ok(model) = std::env::var("VERIFIER_MODEL") {
            config.llm.model = model;
        }
        if let Ok(endpoint) = std::env::var("VERIFIER_ENDPOINT") {
            config.llm.endpoint = endpoint;
        }
        if let Ok(budget) = std::env::var("VERIFIER_MAX_LOC_FOR_SEMANTIC_CHECKS") {
            if let Ok(value) = budget.parse() {
                config.max_loc_for_semantic_checks = value;
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let config = VerifierConfig::default();
        assert_eq!(config.max_loc_for_semantic_checks, 200);
        assert_eq!(config.llm.max_attempts, 3);
        assert_eq!(config.llm.max_tokens, 50);
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let yaml = "max_loc_for_semantic_checks: 80\nllm:\n  model: test-model\n";
        let config: VerifierConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.max_loc_for_semantic_checks, 80);
        assert_eq!(config.llm.model, "test-model");
        assert_eq!(config.llm.timeout_seconds, 30);
    }
}
