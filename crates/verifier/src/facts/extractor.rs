use std::collections::BTreeSet;

use tracing::warn;
use tree_sitter::Node;

use crate::complexity;
use crate::facts::{FunctionFacts, ParameterInfo};
use crate::parse::node_text;

/// Python builtin names a parameter can shadow.
const BUILTINS: &[&str] = &[
    "abs", "all", "any", "ascii", "bin", "bool", "bytearray", "bytes", "callable", "chr",
    "classmethod", "compile", "complex", "delattr", "dict", "dir", "divmod", "enumerate", "eval",
    "exec", "filter", "float", "format", "frozenset", "getattr", "globals", "hasattr", "hash",
    "help", "hex", "id", "input", "int", "isinstance", "issubclass", "iter", "len", "list",
    "locals", "map", "max", "memoryview", "min", "next", "object", "oct", "open", "ord", "pow",
    "print", "property", "range", "repr", "reversed", "round", "set", "setattr", "slice",
    "sorted", "staticmethod", "str", "sum", "super", "tuple", "type", "vars", "zip",
];

const COMMAND_EXECUTION_CALLS: &[&str] = &[
    "os.system",
    "os.popen",
    "subprocess.call",
    "subprocess.run",
    "subprocess.Popen",
];

/// Behavioral observations accumulated during the single traversal pass.
/// Each field is written by exactly one node-kind rule; no rule reads
/// another rule's output.
#[derive(Default)]
struct Collected {
    has_bare_except: bool,
    has_broad_except: bool,
    uses_open_without_with: bool,
    none_checked: BTreeSet<String>,
    type_checked: BTreeSet<String>,
    raised: BTreeSet<String>,
    caught: BTreeSet<String>,
    calls: Vec<String>,
    saw_return: bool,
    has_unreachable_code: bool,
    uses_command_execution: bool,
    command_execution_has_fstring: bool,
}

/// Extract all deterministic facts from one function node.
///
/// Never fails on well-formed input; unknown node kinds set no facts. The
/// complexity collaborator is best-effort and degrades to `1` with a logged
/// warning.
pub fn extract_function_facts(
    func_node: Node<'_>,
    source: &str,
    class_name: Option<&str>,
    star_imports_used: bool,
) -> FunctionFacts {
    let function_name = func_node
        .child_by_field_name("name")
        .map(|n| node_text(n, source).to_string())
        .unwrap_or_default();
    let qualified_name = match class_name {
        Some(class) => format!("{class}.{function_name}"),
        None => function_name.clone(),
    };

    let line_start = func_node.start_position().row + 1;
    let line_end = func_node.end_position().row + 1;
    let loc = line_end - line_start + 1;

    let is_async = {
        let mut cursor = func_node.walk();
        let found = func_node.children(&mut cursor).any(|c| c.kind() == "async");
        found
    };

    let decorators = extract_decorators(func_node, source);
    let (parameters, shadows_builtin) = extract_parameters(func_node, source);
    let has_mutable_default_args = parameters.iter().any(|p| p.default_is_mutable);

    let return_annotation = func_node
        .child_by_field_name("return_type")
        .map(|n| node_text(n, source).to_string());

    let docstring = extract_docstring(func_node, source);

    let source_lines: Vec<&str> = source.lines().collect();
    let source_code = source_lines
        .get(line_start - 1..line_end.min(source_lines.len()))
        .unwrap_or(&[])
        .join("\n");

    let cyclomatic_complexity = match complexity::cyclomatic_complexity(&source_code) {
        Ok(value) => value,
        Err(e) => {
            warn!(function = %function_name, error = %e, "complexity calculation failed");
            1
        }
    };

    let mut collected = Collected::default();
    if let Some(body) = func_node.child_by_field_name("body") {
        visit(body, source, false, &mut collected);
    }

    FunctionFacts {
        function_name,
        qualified_name,
        line_start,
        line_end,
        is_method: class_name.is_some(),
        is_async,
        class_name: class_name.map(|c| c.to_string()),
        decorators,
        parameters,
        return_annotation,
        has_docstring: docstring.is_some(),
        docstring,
        cyclomatic_complexity,
        loc,
        source_code,
        has_bare_except: collected.has_bare_except,
        has_broad_except: collected.has_broad_except,
        has_mutable_default_args,
        uses_open_without_with: collected.uses_open_without_with,
        none_checked_params: collected.none_checked,
        type_checked_params: collected.type_checked,
        raised_exceptions: collected.raised,
        caught_exceptions: collected.caught,
        calls: dedup_preserving_order(collected.calls),
        // presence of any return anywhere, a documented over-approximation
        has_return_on_all_paths: collected.saw_return,
        has_unreachable_code: collected.has_unreachable_code,
        shadows_builtin,
        star_imports_used,
        uses_command_execution: collected.uses_command_execution,
        command_execution_has_fstring: collected.command_execution_has_fstring,
    }
}

/// One pass, pre-order. `in_with_item` is true while inside a with-item
/// context expression, so a scoped `open(...)` is not flagged as a leak.
fn visit(node: Node<'_>, source: &str, in_with_item: bool, acc: &mut Collected) {
    match node.kind() {
        "except_clause" => on_except_clause(node, source, acc),
        "raise_statement" => on_raise(node, source, acc),
        "call" => on_call(node, source, in_with_item, acc),
        "comparison_operator" => on_comparison(node, source, acc),
        "if_statement" => on_if(node, source, acc),
        "return_statement" => acc.saw_return = true,
        "block" => on_block(node, acc),
        _ => {}
    }

    let child_in_with_item = in_with_item || node.kind() == "with_item";
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit(child, source, child_in_with_item, acc);
    }
}

fn on_except_clause(node: Node<'_>, source: &str, acc: &mut Collected) {
    let caught = node.named_child(0).filter(|c| c.kind() != "block");
    match caught {
        None => acc.has_bare_except = true,
        Some(mut type_node) => {
            // `except ValueError as e` wraps the type in an as_pattern
            if type_node.kind() == "as_pattern" {
                if let Some(inner) = type_node.named_child(0) {
                    type_node = inner;
                }
            }
            let type_text = node_text(type_node, source).to_string();
            if type_text == "Exception" || type_text == "BaseException" {
                acc.has_broad_except = true;
            }
            acc.caught.insert(type_text);
        }
    }
}

fn on_raise(node: Node<'_>, source: &str, acc: &mut Collected) {
    if let Some(exc) = node.named_child(0) {
        let text = node_text(exc, source);
        let kind = text.split('(').next().unwrap_or(text).trim();
        if !kind.is_empty() {
            acc.raised.insert(kind.to_string());
        }
    }
}

fn on_call(node: Node<'_>, source: &str, in_with_item: bool, acc: &mut Collected) {
    let Some(func) = node.child_by_field_name("function") else {
        return;
    };
    let call_name = node_text(func, source).to_string();

    if call_name == "open" && !in_with_item {
        acc.uses_open_without_with = true;
    }

    if COMMAND_EXECUTION_CALLS.contains(&call_name.as_str()) {
        acc.uses_command_execution = true;
        if let Some(arguments) = node.child_by_field_name("arguments") {
            let mut cursor = arguments.walk();
            for arg in arguments.named_children(&mut cursor) {
                if arg.kind() == "string" && contains_interpolation(arg) {
                    acc.command_execution_has_fstring = true;
                }
            }
        }
    }

    acc.calls.push(call_name);
}

fn contains_interpolation(string_node: Node<'_>) -> bool {
    let mut cursor = string_node.walk();
    let found = string_node
        .children(&mut cursor)
        .any(|c| c.kind() == "interpolation");
    found
}

/// `x is None` / `x is not None` with an identifier on the left.
fn on_comparison(node: Node<'_>, source: &str, acc: &mut Collected) {
    let has_is = {
        let mut cursor = node.walk();
        let found = node.children(&mut cursor).any(|c| c.kind() == "is");
        found
    };
    if !has_is {
        return;
    }
    let Some(left) = node.named_child(0) else {
        return;
    };
    let compares_none = {
        let mut cursor = node.walk();
        let found = node.named_children(&mut cursor).any(|c| c.kind() == "none");
        found
    };
    if compares_none && left.kind() == "identifier" {
        acc.none_checked.insert(node_text(left, source).to_string());
    }
}

/// `if isinstance(x, T):` guards.
fn on_if(node: Node<'_>, source: &str, acc: &mut Collected) {
    let Some(condition) = node.child_by_field_name("condition") else {
        return;
    };
    if condition.kind() != "call" {
        return;
    }
    let is_isinstance = condition
        .child_by_field_name("function")
        .map(|f| node_text(f, source) == "isinstance")
        .unwrap_or(false);
    if !is_isinstance {
        return;
    }
    if let Some(arguments) = condition.child_by_field_name("arguments") {
        if let Some(first) = arguments.named_child(0) {
            if first.kind() == "identifier" {
                acc.type_checked.insert(node_text(first, source).to_string());
            }
        }
    }
}

/// Statements following an unconditional return/raise inside the same block.
/// Comments are named children of a block in this grammar but are not
/// statements, so they neither trigger the rule nor count as followers.
fn on_block(node: Node<'_>, acc: &mut Collected) {
    let mut saw_exit = false;
    let mut cursor = node.walk();
    for stmt in node.named_children(&mut cursor) {
        if stmt.kind() == "comment" {
            continue;
        }
        if saw_exit {
            acc.has_unreachable_code = true;
            return;
        }
        if matches!(stmt.kind(), "return_statement" | "raise_statement") {
            saw_exit = true;
        }
    }
}

fn extract_decorators(func_node: Node<'_>, source: &str) -> Vec<String> {
    let Some(parent) = func_node.parent() else {
        return Vec::new();
    };
    if parent.kind() != "decorated_definition" {
        return Vec::new();
    }
    let mut decorators = Vec::new();
    let mut cursor = parent.walk();
    for child in parent.children(&mut cursor) {
        if child.kind() == "decorator" {
            let text = node_text(child, source).trim_start_matches('@').to_string();
            decorators.push(text);
        }
    }
    decorators
}

fn extract_parameters(func_node: Node<'_>, source: &str) -> (Vec<ParameterInfo>, Vec<String>) {
    let mut parameters = Vec::new();
    let mut shadows = Vec::new();
    let Some(params_node) = func_node.child_by_field_name("parameters") else {
        return (parameters, shadows);
    };

    let mut cursor = params_node.walk();
    for child in params_node.named_children(&mut cursor) {
        let info = match child.kind() {
            "identifier" => Some(ParameterInfo {
                name: node_text(child, source).to_string(),
                type_hint: None,
                has_default: false,
                default_is_mutable: false,
            }),
            "typed_parameter" => child.named_child(0).map(|name| ParameterInfo {
                name: node_text(name, source).to_string(),
                type_hint: child
                    .child_by_field_name("type")
                    .map(|t| node_text(t, source).to_string()),
                has_default: false,
                default_is_mutable: false,
            }),
            "default_parameter" | "typed_default_parameter" => {
                let default = child.child_by_field_name("value");
                child.child_by_field_name("name").map(|name| ParameterInfo {
                    name: node_text(name, source).to_string(),
                    type_hint: child
                        .child_by_field_name("type")
                        .map(|t| node_text(t, source).to_string()),
                    has_default: default.is_some(),
                    default_is_mutable: default
                        .map(|d| matches!(d.kind(), "list" | "dictionary" | "set"))
                        .unwrap_or(false),
                })
            }
            // *args / **kwargs and bare separators carry no null-safety facts
            _ => None,
        };

        if let Some(info) = info {
            if BUILTINS.contains(&info.name.as_str()) {
                shadows.push(info.name.clone());
            }
            parameters.push(info);
        }
    }

    (parameters, shadows)
}

fn extract_docstring(func_node: Node<'_>, source: &str) -> Option<String> {
    let body = func_node.child_by_field_name("body")?;
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let string_node = first.named_child(0)?;
    if string_node.kind() != "string" {
        return None;
    }
    let mut content = String::new();
    let mut cursor = string_node.walk();
    for child in string_node.children(&mut cursor) {
        if child.kind() == "string_content" {
            content.push_str(node_text(child, source));
        }
    }
    Some(content.trim().to_string())
}

fn dedup_preserving_order(calls: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    calls.into_iter().filter(|c| seen.insert(c.clone())).collect()
}
