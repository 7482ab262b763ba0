//! The built-in rule checks.
//!
//! Severity and category assignments follow a fixed taxonomy: anything that
//! can execute attacker input is `security`, wrong-result risks are `logic`,
//! the rest is `maintainability`. Checks that read exact structural facts are
//! `Tier::Deterministic`; checks built on an over-approximating fact are
//! `Tier::Heuristic`. Every finding carries `confidence=high` because its
//! evidence is reproducible from the fact record alone.

use anyhow::Result;

use crate::checks::Check;
use crate::core::{Category, Finding, Severity, Tier};
use crate::facts::FunctionFacts;

const LOC_THRESHOLD: usize = 50;
const COMPLEXITY_THRESHOLD: u32 = 10;

pub struct BareExceptCheck;

impl Check for BareExceptCheck {
    fn id(&self) -> &'static str {
        "bare_except"
    }

    fn check(&self, facts: &FunctionFacts) -> Result<Option<Finding>> {
        if !facts.has_bare_except {
            return Ok(None);
        }
        Ok(Some(
            Finding::new(
                &facts.qualified_name,
                self.id(),
                Severity::Medium,
                Category::Maintainability,
                "Bare except clause without exception type",
                format!(
                    "Function {} uses bare 'except:' which catches all exceptions \
                     including SystemExit and KeyboardInterrupt. This can hide \
                     unexpected errors and make debugging difficult.",
                    facts.function_name
                ),
            )
            .at(&facts.function_name, facts.line_start)
            .with_evidence(vec![
                format!(
                    "syntax analysis shows bare except clause at line {}",
                    facts.line_start
                ),
                "bare except catches all exceptions, including system-level exceptions"
                    .to_string(),
            ])
            .with_suggested_fix(
                "Specify the exception type you expect: 'except ValueError:' or \
                 'except Exception:' for broader but still selective catching",
            ),
        ))
    }
}

pub struct MutableDefaultsCheck;

impl Check for MutableDefaultsCheck {
    fn id(&self) -> &'static str {
        "mutable_defaults"
    }

    fn check(&self, facts: &FunctionFacts) -> Result<Option<Finding>> {
        if !facts.has_mutable_default_args {
            return Ok(None);
        }
        let mutable = facts.mutable_default_params().join(", ");
        Ok(Some(
            Finding::new(
                &facts.qualified_name,
                self.id(),
                Severity::Medium,
                Category::Logic,
                "Mutable default argument detected",
                format!(
                    "Function {} has mutable default arguments: {mutable}. Mutable \
                     defaults are evaluated once at function definition time, not \
                     each time the function is called. This can lead to unexpected \
                     behavior when the default is modified.",
                    facts.function_name
                ),
            )
            .at(&facts.function_name, facts.line_start)
            .with_evidence(vec![
                format!("parameters with mutable defaults: {mutable}"),
                "mutable defaults (list, dict, set) are shared across all function calls"
                    .to_string(),
            ])
            .with_suggested_fix(
                "Use None as default and create the mutable object inside the \
                 function: def f(x=None): x = x or []",
            ),
        ))
    }
}

pub struct ResourceLeakCheck;

impl Check for ResourceLeakCheck {
    fn id(&self) -> &'static str {
        "resource_leak"
    }

    fn check(&self, facts: &FunctionFacts) -> Result<Option<Finding>> {
        if !facts.uses_open_without_with {
            return Ok(None);
        }
        Ok(Some(
            Finding::new(
                &facts.qualified_name,
                self.id(),
                Severity::Medium,
                Category::Maintainability,
                "File opened without context manager",
                format!(
                    "Function {} calls open() without using a 'with' statement. If \
                     an exception occurs before the file is explicitly closed, the \
                     file handle may leak.",
                    facts.function_name
                ),
            )
            .at(&facts.function_name, facts.line_start)
            .with_tier(Tier::Heuristic)
            .with_evidence(vec![
                "open() call detected outside any with-item context".to_string(),
                "files without 'with' statement may not be closed on exceptions".to_string(),
            ])
            .with_counterexample(
                "If an exception occurs between open() and close(), the file \
                 remains open until garbage collection.",
            )
            .with_suggested_fix(
                "Use a context manager: 'with open(path) as f: ...' to ensure the \
                 file is properly closed even if exceptions occur.",
            ),
        ))
    }
}

/// Shell execution with interpolated arguments is critical; without, it is
/// still worth flagging at high severity.
pub struct CommandInjectionCheck;

impl Check for CommandInjectionCheck {
    fn id(&self) -> &'static str {
        "command_injection"
    }

    fn check(&self, facts: &FunctionFacts) -> Result<Option<Finding>> {
        if !facts.uses_command_execution {
            return Ok(None);
        }
        let calls = facts.command_execution_calls().join(", ");

        let finding = if facts.command_execution_has_fstring {
            Finding::new(
                &facts.qualified_name,
                self.id(),
                Severity::Critical,
                Category::Security,
                "Command injection risk via f-string in command execution",
                format!(
                    "Function {} executes shell commands using f-string \
                     interpolation. If untrusted input reaches the command string, \
                     attackers can execute arbitrary commands.",
                    facts.function_name
                ),
            )
            .at(&facts.function_name, facts.line_start)
            .with_evidence(vec![
                format!("command execution detected: {calls}"),
                "command arguments include f-string interpolation".to_string(),
            ])
            .with_counterexample(
                "If user_input = \"; rm -rf /\", then os.system(f\"echo \
                 {user_input}\") executes arbitrary commands.",
            )
            .with_suggested_fix(
                "Use subprocess.run with a list of arguments (shell=False) or \
                 properly validate/escape user input.",
            )
        } else {
            Finding::new(
                &facts.qualified_name,
                "command_execution",
                Severity::High,
                Category::Security,
                "Command execution detected",
                format!(
                    "Function {} executes shell commands. Ensure all inputs are \
                     properly validated and sanitized.",
                    facts.function_name
                ),
            )
            .at(&facts.function_name, facts.line_start)
            .with_evidence(vec![format!("command execution detected: {calls}")])
            .with_suggested_fix(
                "Consider alternatives to shell commands. If necessary, use \
                 subprocess.run with shell=False and argument list.",
            )
        };

        Ok(Some(finding))
    }
}

pub struct ImplicitNoneReturnCheck;

impl Check for ImplicitNoneReturnCheck {
    fn id(&self) -> &'static str {
        "implicit_none_return"
    }

    fn check(&self, facts: &FunctionFacts) -> Result<Option<Finding>> {
        let Some(annotation) = &facts.return_annotation else {
            return Ok(None);
        };
        if facts.has_return_on_all_paths {
            return Ok(None);
        }
        Ok(Some(
            Finding::new(
                &facts.qualified_name,
                self.id(),
                Severity::Medium,
                Category::Logic,
                "Possible implicit None return with type annotation",
                format!(
                    "Function {} has return annotation '{annotation}' but may not \
                     return a value on all code paths. Python functions without an \
                     explicit return statement implicitly return None, which \
                     violates the type annotation.",
                    facts.function_name
                ),
            )
            .at(&facts.function_name, facts.line_start)
            .with_tier(Tier::Heuristic)
            .with_evidence(vec![
                format!("return annotation: {annotation}"),
                "control flow analysis suggests not all paths return a value".to_string(),
            ])
            .with_suggested_fix(
                "Ensure all code paths return a value, or change return annotation \
                 to 'Optional[...]' or 'None'.",
            ),
        ))
    }
}

pub struct UnreachableCodeCheck;

impl Check for UnreachableCodeCheck {
    fn id(&self) -> &'static str {
        "unreachable_code"
    }

    fn check(&self, facts: &FunctionFacts) -> Result<Option<Finding>> {
        if !facts.has_unreachable_code {
            return Ok(None);
        }
        Ok(Some(
            Finding::new(
                &facts.qualified_name,
                self.id(),
                Severity::Low,
                Category::Maintainability,
                "Unreachable code detected",
                format!(
                    "Function {} contains code that can never be executed because \
                     it follows an unconditional return or raise statement. This is \
                     dead code that should be removed.",
                    facts.function_name
                ),
            )
            .at(&facts.function_name, facts.line_start)
            .with_tier(Tier::Heuristic)
            .with_evidence(vec![
                "statements detected after unconditional return/raise".to_string()
            ])
            .with_suggested_fix("Remove the unreachable code or adjust control flow."),
        ))
    }
}

pub struct GiantFunctionCheck;

impl Check for GiantFunctionCheck {
    fn id(&self) -> &'static str {
        "giant_function"
    }

    fn check(&self, facts: &FunctionFacts) -> Result<Option<Finding>> {
        let mut reasons = Vec::new();
        if facts.loc > LOC_THRESHOLD {
            reasons.push(format!("{} lines (threshold: {LOC_THRESHOLD})", facts.loc));
        }
        if facts.cyclomatic_complexity > COMPLEXITY_THRESHOLD {
            reasons.push(format!(
                "complexity {} (threshold: {COMPLEXITY_THRESHOLD})",
                facts.cyclomatic_complexity
            ));
        }
        if reasons.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            Finding::new(
                &facts.qualified_name,
                self.id(),
                Severity::Medium,
                Category::Maintainability,
                "Function exceeds size/complexity thresholds",
                format!(
                    "Function {} exceeds recommended thresholds: {}. Large \
                     functions are harder to test, debug, and maintain.",
                    facts.function_name,
                    reasons.join(", ")
                ),
            )
            .at(&facts.function_name, facts.line_start)
            .with_evidence(vec![
                format!("lines of code: {}", facts.loc),
                format!("cyclomatic complexity: {}", facts.cyclomatic_complexity),
            ])
            .with_suggested_fix(
                "Consider splitting the function into smaller helper functions or \
                 reduce nesting levels.",
            ),
        ))
    }
}

pub struct StarImportCheck;

impl Check for StarImportCheck {
    fn id(&self) -> &'static str {
        "star_imports"
    }

    fn check(&self, facts: &FunctionFacts) -> Result<Option<Finding>> {
        if !facts.star_imports_used {
            return Ok(None);
        }
        Ok(Some(
            Finding::new(
                &facts.qualified_name,
                self.id(),
                Severity::Low,
                Category::Maintainability,
                "Star import detected",
                format!(
                    "Function {} is in a module that uses star imports ('from x \
                     import *'). Star imports pollute the namespace, make code \
                     harder to understand, and can accidentally shadow names.",
                    facts.function_name
                ),
            )
            .at(&facts.function_name, facts.line_start)
            .with_evidence(vec![
                "module-level star import statement detected".to_string()
            ])
            .with_suggested_fix(
                "Use explicit imports: 'from module import name1, name2' or \
                 'import module' and reference with module.name.",
            ),
        ))
    }
}

pub struct BroadExceptCheck;

impl Check for BroadExceptCheck {
    fn id(&self) -> &'static str {
        "broad_exception"
    }

    fn check(&self, facts: &FunctionFacts) -> Result<Option<Finding>> {
        if !facts.has_broad_except {
            return Ok(None);
        }
        let broad: Vec<&str> = facts
            .caught_exceptions
            .iter()
            .map(|t| t.as_str())
            .filter(|t| *t == "Exception" || *t == "BaseException")
            .collect();
        let broad = broad.join(", ");
        Ok(Some(
            Finding::new(
                &facts.qualified_name,
                self.id(),
                Severity::Medium,
                Category::Maintainability,
                "Broad exception catch detected",
                format!(
                    "Function {} catches broad exception types: {broad}. This can \
                     hide unexpected errors and make debugging difficult.",
                    facts.function_name
                ),
            )
            .at(&facts.function_name, facts.line_start)
            .with_evidence(vec![format!("caught exception types: {broad}")])
            .with_suggested_fix(
                "Catch specific exception types instead: 'except ValueError:' or \
                 'except (ValueError, TypeError):'. Use 'except Exception:' only at \
                 the top level of a program.",
            ),
        ))
    }
}

pub struct ShadowBuiltinCheck;

impl Check for ShadowBuiltinCheck {
    fn id(&self) -> &'static str {
        "shadow_builtin"
    }

    fn check(&self, facts: &FunctionFacts) -> Result<Option<Finding>> {
        if facts.shadows_builtin.is_empty() {
            return Ok(None);
        }
        let shadowed = facts.shadows_builtin.join(", ");
        Ok(Some(
            Finding::new(
                &facts.qualified_name,
                self.id(),
                Severity::Low,
                Category::Maintainability,
                "Parameter shadows Python builtin",
                format!(
                    "Function {} has parameters that shadow Python builtins: \
                     {shadowed}. This can lead to confusion and bugs when trying to \
                     use the builtin later.",
                    facts.function_name
                ),
            )
            .at(&facts.function_name, facts.line_start)
            .with_evidence(vec![format!("shadowed builtins: {shadowed}")])
            .with_suggested_fix(
                "Rename parameters to avoid shadowing builtins. Use a trailing \
                 underscore if necessary: 'list_' instead of 'list'.",
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::CheckRegistry;
    use crate::core::FindingConfidence;
    use crate::facts::ParameterInfo;

    fn base_facts() -> FunctionFacts {
        FunctionFacts {
            function_name: "f".to_string(),
            qualified_name: "f".to_string(),
            line_start: 1,
            line_end: 3,
            loc: 3,
            cyclomatic_complexity: 1,
            ..Default::default()
        }
    }

    #[test]
    fn clean_facts_produce_no_findings() {
        let registry = CheckRegistry::with_defaults();
        assert!(registry.run_all(&base_facts()).is_empty());
    }

    #[test]
    fn bare_except_flagged_as_maintainability_medium() {
        let facts = FunctionFacts {
            has_bare_except: true,
            ..base_facts()
        };
        let finding = BareExceptCheck.check(&facts).unwrap().unwrap();
        assert_eq!(finding.id, "f:bare_except");
        assert_eq!(finding.severity, Severity::Medium);
        assert_eq!(finding.category, Category::Maintainability);
        assert_eq!(finding.confidence, FindingConfidence::High);
        assert_eq!(finding.tier, Tier::Deterministic);
    }

    #[test]
    fn mutable_defaults_name_the_parameters() {
        let facts = FunctionFacts {
            has_mutable_default_args: true,
            parameters: vec![
                ParameterInfo {
                    name: "items".to_string(),
                    type_hint: None,
                    has_default: true,
                    default_is_mutable: true,
                },
                ParameterInfo {
                    name: "count".to_string(),
                    type_hint: None,
                    has_default: true,
                    default_is_mutable: false,
                },
            ],
            ..base_facts()
        };
        let finding = MutableDefaultsCheck.check(&facts).unwrap().unwrap();
        assert_eq!(finding.category, Category::Logic);
        assert!(finding.description.contains("items"));
        assert!(!finding.evidence[0].contains("count"));
    }

    #[test]
    fn interpolated_shell_call_is_critical() {
        let facts = FunctionFacts {
            uses_command_execution: true,
            command_execution_has_fstring: true,
            calls: vec!["os.system".to_string()],
            ..base_facts()
        };
        let finding = CommandInjectionCheck.check(&facts).unwrap().unwrap();
        assert_eq!(finding.severity, Severity::Critical);
        assert_eq!(finding.category, Category::Security);
        assert_eq!(finding.finding_type, "command_injection");
        assert!(finding.counterexample.is_some());
        assert!(finding.evidence[0].contains("os.system"));
    }

    #[test]
    fn plain_shell_call_is_high() {
        let facts = FunctionFacts {
            uses_command_execution: true,
            calls: vec!["subprocess.run".to_string()],
            ..base_facts()
        };
        let finding = CommandInjectionCheck.check(&facts).unwrap().unwrap();
        assert_eq!(finding.severity, Severity::High);
        assert_eq!(finding.finding_type, "command_execution");
    }

    #[test]
    fn implicit_none_return_needs_annotation() {
        let mut facts = FunctionFacts {
            return_annotation: Some("int".to_string()),
            has_return_on_all_paths: false,
            ..base_facts()
        };
        let finding = ImplicitNoneReturnCheck.check(&facts).unwrap().unwrap();
        assert_eq!(finding.tier, Tier::Heuristic);
        assert!(finding.description.contains("'int'"));

        facts.return_annotation = None;
        assert!(ImplicitNoneReturnCheck.check(&facts).unwrap().is_none());

        facts.return_annotation = Some("int".to_string());
        facts.has_return_on_all_paths = true;
        assert!(ImplicitNoneReturnCheck.check(&facts).unwrap().is_none());
    }

    #[test]
    fn giant_function_reports_both_reasons() {
        let facts = FunctionFacts {
            loc: 80,
            cyclomatic_complexity: 15,
            ..base_facts()
        };
        let finding = GiantFunctionCheck.check(&facts).unwrap().unwrap();
        assert!(finding.description.contains("80 lines"));
        assert!(finding.description.contains("complexity 15"));

        let facts = FunctionFacts {
            loc: 80,
            cyclomatic_complexity: 2,
            ..base_facts()
        };
        let finding = GiantFunctionCheck.check(&facts).unwrap().unwrap();
        assert!(!finding.description.contains("complexity 2"));
    }

    #[test]
    fn broad_except_names_only_broad_types() {
        let facts = FunctionFacts {
            has_broad_except: true,
            caught_exceptions: ["Exception", "ValueError"]
                .into_iter()
                .map(String::from)
                .collect(),
            ..base_facts()
        };
        let finding = BroadExceptCheck.check(&facts).unwrap().unwrap();
        assert!(finding.evidence[0].contains("Exception"));
        assert!(!finding.evidence[0].contains("ValueError"));
    }

    #[test]
    fn registry_order_is_stable() {
        let facts = FunctionFacts {
            has_bare_except: true,
            uses_command_execution: true,
            command_execution_has_fstring: true,
            calls: vec!["os.system".to_string()],
            shadows_builtin: vec!["list".to_string()],
            ..base_facts()
        };
        let registry = CheckRegistry::with_defaults();
        let findings = registry.run_all(&facts);
        let types: Vec<&str> = findings.iter().map(|f| f.finding_type.as_str()).collect();
        assert_eq!(types, vec!["bare_except", "command_injection", "shadow_builtin"]);
    }

    #[test]
    fn parallel_run_matches_sequential_order() {
        let facts = FunctionFacts {
            has_bare_except: true,
            has_unreachable_code: true,
            star_imports_used: true,
            ..base_facts()
        };
        let sequential = CheckRegistry::with_defaults().run_all(&facts);
        let parallel = CheckRegistry::with_defaults()
            .with_parallel(true)
            .run_all(&facts);
        assert_eq!(sequential, parallel);
    }
}
