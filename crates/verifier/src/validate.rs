//! Cross-validation of semantic claims against extracted facts.
//!
//! This is the trust step: a model answer only reaches a report after it has
//! been compared with the deterministic fact record. Agreement earns high
//! confidence; disagreement drops confidence to low but the claim is still
//! surfaced for a human to adjudicate, never silently discarded.

use crate::core::{FindingConfidence, ValidationResult};
use crate::facts::FunctionFacts;
use crate::llm::SemanticAnswer;

/// Decision table for the null-safety check.
///
/// 1. UNCLEAR → (inconclusive, no-data)
/// 2. SAFE and every parameter is None-checked → (high, confirmed)
/// 3. SAFE but some parameter lacks a None check → (low, contradicted)
/// 4. UNSAFE and every blamed name lacks a None check → (high, confirmed)
/// 5. UNSAFE but a blamed name has a None check → (low, contradicted)
pub fn cross_validate_null_safety(
    answer: SemanticAnswer,
    blamed_names: &[String],
    facts: &FunctionFacts,
) -> (FindingConfidence, ValidationResult) {
    match answer {
        SemanticAnswer::Unclear => (FindingConfidence::Inconclusive, ValidationResult::NoData),
        SemanticAnswer::Safe => {
            let all_checked = facts
                .param_names()
                .iter()
                .all(|p| facts.none_checked_params.contains(*p));
            if all_checked {
                (FindingConfidence::High, ValidationResult::Confirmed)
            } else {
                (FindingConfidence::Low, ValidationResult::Contradicted)
            }
        }
        SemanticAnswer::Unsafe => {
            let any_checked = blamed_names
                .iter()
                .any(|name| facts.none_checked_params.contains(name));
            if any_checked {
                (FindingConfidence::Low, ValidationResult::Contradicted)
            } else {
                (FindingConfidence::High, ValidationResult::Confirmed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::ParameterInfo;

    fn facts_with(params: &[&str], none_checked: &[&str]) -> FunctionFacts {
        FunctionFacts {
            parameters: params
                .iter()
                .map(|name| ParameterInfo {
                    name: name.to_string(),
                    type_hint: None,
                    has_default: false,
                    default_is_mutable: false,
                })
                .collect(),
            none_checked_params: none_checked.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn unclear_maps_to_no_data() {
        let facts = facts_with(&["data"], &[]);
        assert_eq!(
            cross_validate_null_safety(SemanticAnswer::Unclear, &[], &facts),
            (FindingConfidence::Inconclusive, ValidationResult::NoData)
        );
    }

    #[test]
    fn safe_with_all_params_checked_is_confirmed() {
        let facts = facts_with(&["name"], &["name"]);
        assert_eq!(
            cross_validate_null_safety(SemanticAnswer::Safe, &[], &facts),
            (FindingConfidence::High, ValidationResult::Confirmed)
        );
    }

    #[test]
    fn safe_with_unchecked_params_is_contradicted() {
        let facts = facts_with(&["name", "data"], &["name"]);
        assert_eq!(
            cross_validate_null_safety(SemanticAnswer::Safe, &[], &facts),
            (FindingConfidence::Low, ValidationResult::Contradicted)
        );
    }

    #[test]
    fn unsafe_with_unchecked_names_is_confirmed() {
        let facts = facts_with(&["data"], &[]);
        let blamed = vec!["data".to_string()];
        assert_eq!(
            cross_validate_null_safety(SemanticAnswer::Unsafe, &blamed, &facts),
            (FindingConfidence::High, ValidationResult::Confirmed)
        );
    }

    #[test]
    fn unsafe_blaming_a_checked_name_is_contradicted() {
        let facts = facts_with(&["data"], &["data"]);
        let blamed = vec!["data".to_string()];
        assert_eq!(
            cross_validate_null_safety(SemanticAnswer::Unsafe, &blamed, &facts),
            (FindingConfidence::Low, ValidationResult::Contradicted)
        );
    }

    #[test]
    fn safe_with_no_params_is_trivially_confirmed() {
        let facts = facts_with(&[], &[]);
        assert_eq!(
            cross_validate_null_safety(SemanticAnswer::Safe, &[], &facts),
            (FindingConfidence::High, ValidationResult::Confirmed)
        );
    }
}
