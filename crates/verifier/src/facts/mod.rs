//! Deterministic facts about a single function, derived purely from its
//! syntax tree plus module-level import statements.
//!
//! A [`FunctionFacts`] value is built once by the extractor and read-only
//! afterwards; the check registry and the cross-validator only inspect it.

mod extractor;

pub use extractor::extract_function_facts;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub name: String,
    pub type_hint: Option<String>,
    pub has_default: bool,
    pub default_is_mutable: bool,
}

/// One immutable record per analyzed function.
///
/// Every field is derivable from the function's own subtree (plus the
/// module's import statements for `star_imports_used`) — no whole-program
/// state is consulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionFacts {
    pub function_name: String,
    /// Dotted with the enclosing class name when this is a method.
    pub qualified_name: String,
    pub line_start: usize,
    pub line_end: usize,

    pub is_method: bool,
    pub is_async: bool,
    pub class_name: Option<String>,
    pub decorators: Vec<String>,
    pub parameters: Vec<ParameterInfo>,
    pub return_annotation: Option<String>,
    pub has_docstring: bool,
    pub docstring: Option<String>,

    pub cyclomatic_complexity: u32,
    pub loc: usize,
    /// Verbatim source slice of the function.
    pub source_code: String,

    pub has_bare_except: bool,
    pub has_broad_except: bool,
    pub has_mutable_default_args: bool,
    pub uses_open_without_with: bool,
    /// Identifiers compared against `None` with `is` / `is not`.
    pub none_checked_params: BTreeSet<String>,
    /// Identifiers guarded by an `isinstance(...)` test.
    pub type_checked_params: BTreeSet<String>,
    pub raised_exceptions: BTreeSet<String>,
    pub caught_exceptions: BTreeSet<String>,
    /// Called names in first-seen order, deduplicated.
    pub calls: Vec<String>,
    /// Heuristic: true when any return statement exists anywhere in the body.
    /// This over-approximates actual path coverage; downstream severity
    /// tuning relies on exactly this behavior.
    pub has_return_on_all_paths: bool,
    pub has_unreachable_code: bool,
    pub shadows_builtin: Vec<String>,
    pub star_imports_used: bool,
    pub uses_command_execution: bool,
    pub command_execution_has_fstring: bool,
}

impl FunctionFacts {
    pub fn param_names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn mutable_default_params(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|p| p.default_is_mutable)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Call names that look like shell/process execution, for evidence text.
    pub fn command_execution_calls(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter(|c| c.contains("system") || c.contains("subprocess") || c.contains("popen"))
            .map(|c| c.as_str())
            .collect()
    }
}
