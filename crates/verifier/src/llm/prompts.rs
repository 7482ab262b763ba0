//! Prompt construction for semantic checks.
//!
//! Prompts are few-shot: three worked examples teach the answer format, then
//! the function under analysis is appended together with a digest of its
//! extracted facts so the model reasons against the same evidence the
//! cross-validator will use.

use crate::facts::FunctionFacts;

pub const NULL_SAFETY_TEMPLATE_ID: &str = "null_safety_v1";

/// At most this many called names are listed in the prompt.
const MAX_CALLS_IN_PROMPT: usize = 10;

pub fn build_null_safety_prompt(facts: &FunctionFacts) -> String {
    format!(
        r#"You are checking Python functions for null safety issues.

EXAMPLES:
---
Function: def greet(name): return f"Hello, {{name.upper()}}"
Facts: Parameters=[name: no type hint, no default]. No None checks in body. Calls: str.upper()
Question: Which parameters crash if None?
Answer: UNSAFE: name (calls .upper() on it without None check)
---
Function: def safe_greet(name):
    if name is None: return "Hello, stranger"
    return f"Hello, {{name.upper()}}"
Facts: Parameters=[name: no type hint, no default]. Has None check for 'name'.
Question: Which parameters crash if None?
Answer: SAFE: all parameters handled
---
Function: def process(data, items):
    if data is None: data = []
    return data + items
Facts: Parameters=[data: no type hint, no default; items: no type hint, no default]. Has None check for 'data'. Calls: list addition
Question: Which parameters crash if None?
Answer: UNSAFE: items (used in addition without None check)
---

NOW ANALYZE:
Function:
```python
{function_code}
```
Facts: Parameters=[{param_list}]. {none_check_facts}. Calls: {call_list}
Question: Which parameters crash if passed None?
Answer:"#,
        function_code = facts.source_code,
        param_list = param_digest(facts),
        none_check_facts = none_check_digest(facts),
        call_list = call_digest(facts),
    )
}

fn param_digest(facts: &FunctionFacts) -> String {
    if facts.parameters.is_empty() {
        return "none".to_string();
    }
    facts
        .parameters
        .iter()
        .map(|p| {
            format!(
                "{}: {}, {}",
                p.name,
                p.type_hint.as_deref().unwrap_or("no type hint"),
                if p.has_default { "has default" } else { "no default" },
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn none_check_digest(facts: &FunctionFacts) -> String {
    if facts.none_checked_params.is_empty() {
        return "No None checks detected".to_string();
    }
    let names: Vec<&str> = facts.none_checked_params.iter().map(|s| s.as_str()).collect();
    format!("Has None checks for: {}", names.join(", "))
}

fn call_digest(facts: &FunctionFacts) -> String {
    if facts.calls.is_empty() {
        return "none".to_string();
    }
    let shown: Vec<&str> = facts
        .calls
        .iter()
        .take(MAX_CALLS_IN_PROMPT)
        .map(|s| s.as_str())
        .collect();
    let mut digest = shown.join(", ");
    if facts.calls.len() > MAX_CALLS_IN_PROMPT {
        digest.push_str(&format!(
            " (and {} more)",
            facts.calls.len() - MAX_CALLS_IN_PROMPT
        ));
    }
    digest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::ParameterInfo;

    fn facts() -> FunctionFacts {
        FunctionFacts {
            function_name: "greet".to_string(),
            qualified_name: "greet".to_string(),
            source_code: "def greet(name):\n    return name.upper()".to_string(),
            parameters: vec![ParameterInfo {
                name: "name".to_string(),
                type_hint: Some("str".to_string()),
                has_default: false,
                default_is_mutable: false,
            }],
            calls: vec!["name.upper".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn prompt_embeds_code_and_fact_digest() {
        let prompt = build_null_safety_prompt(&facts());
        assert!(prompt.contains("def greet(name):"));
        assert!(prompt.contains("name: str, no default"));
        assert!(prompt.contains("No None checks detected"));
        assert!(prompt.contains("Calls: name.upper"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn none_checks_are_listed() {
        let mut f = facts();
        f.none_checked_params.insert("name".to_string());
        let prompt = build_null_safety_prompt(&f);
        assert!(prompt.contains("Has None checks for: name"));
    }

    #[test]
    fn call_list_is_capped() {
        let mut f = facts();
        f.calls = (0..13).map(|i| format!("call_{i}")).collect();
        let prompt = build_null_safety_prompt(&f);
        assert!(prompt.contains("call_9"));
        assert!(!prompt.contains("call_10,"));
        assert!(prompt.contains("(and 3 more)"));
    }

    #[test]
    fn empty_lists_render_as_none() {
        let mut f = facts();
        f.parameters.clear();
        f.calls.clear();
        let prompt = build_null_safety_prompt(&f);
        assert!(prompt.contains("Parameters=[none]"));
        assert!(prompt.contains("Calls: none"));
    }
}
