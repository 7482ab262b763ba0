//! Parsing of free-text model answers into a closed verdict.
//!
//! The contract is deliberately forgiving: the model was asked for
//! `SAFE`/`UNSAFE`/`UNCLEAR` but real responses bury the verdict in prose.
//! Anything that cannot be classified resolves to `Unclear`, which the
//! cross-validator maps to no-data rather than a finding.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

// UNSAFE must be tested before SAFE: the word SAFE is a substring of UNSAFE.
static UNSAFE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)UNSAFE\s*:?\s*(.+)").unwrap());
static SAFE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)SAFE").unwrap());
static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b[a-z_][a-z0-9_]*\b").unwrap());

/// English words that match the identifier pattern but are never parameter
/// names in practice.
const STOP_WORDS: &[&str] = &[
    "the", "and", "or", "but", "for", "not", "all", "any", "can", "will", "would", "should",
    "could", "might", "must", "may", "calls", "check", "checks", "detected", "crash", "crashes",
    "because", "since", "as", "if", "when", "then", "than", "that", "this", "these", "those",
    "them", "they", "their", "there", "here", "where", "which", "each", "every", "some", "such",
    "same", "used", "use", "using", "without", "with", "from", "into", "to", "in", "on", "at",
    "by", "of", "is", "it", "its", "are", "was", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "no", "yes", "none", "null", "nil", "safe", "unsafe", "unclear",
    "parameters", "parameter", "params", "param", "function", "func", "handled", "handlers",
    "handling", "list", "dict", "set", "str", "int", "float", "bool", "true", "false", "return",
    "returns",
];

const MAX_EXTRACTED_NAMES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SemanticAnswer {
    Safe,
    Unsafe,
    Unclear,
}

impl std::fmt::Display for SemanticAnswer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Safe => write!(f, "SAFE"),
            Self::Unsafe => write!(f, "UNSAFE"),
            Self::Unclear => write!(f, "UNCLEAR"),
        }
    }
}

/// Classify a raw model response and pull out the parameter names an UNSAFE
/// verdict blames. SAFE and UNCLEAR answers never carry names.
pub fn parse_null_safety_response(response: &str) -> (SemanticAnswer, Vec<String>) {
    let response = response.trim();

    if let Some(captures) = UNSAFE_RE.captures(response) {
        let details = captures.get(1).map(|m| m.as_str()).unwrap_or("");
        return (SemanticAnswer::Unsafe, extract_param_names(details));
    }

    if SAFE_RE.is_match(response) {
        return (SemanticAnswer::Safe, Vec::new());
    }

    (SemanticAnswer::Unclear, Vec::new())
}

fn extract_param_names(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut names = Vec::new();
    for m in IDENTIFIER_RE.find_iter(text) {
        let candidate = m.as_str();
        if candidate.len() <= 1 {
            continue;
        }
        // a token right after a dot is a method/attribute name, not a parameter
        if m.start() > 0 && text.as_bytes()[m.start() - 1] == b'.' {
            continue;
        }
        let lowered = candidate.to_lowercase();
        if STOP_WORDS.contains(&lowered.as_str()) {
            continue;
        }
        if seen.insert(candidate.to_string()) {
            names.push(candidate.to_string());
            if names.len() >= MAX_EXTRACTED_NAMES {
                break;
            }
        }
    }
    names
}
