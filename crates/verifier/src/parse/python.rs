use tracing::debug;
use tree_sitter::{Language, Node, Parser, Tree};

use crate::parse::{node_text, ParseError};

fn python_language() -> Language {
    tree_sitter_python::LANGUAGE.into()
}

/// A parsed Python module plus the module-level observations the per-function
/// extractor cannot see from inside a function subtree.
pub struct ParsedModule {
    tree: Tree,
    source: String,
    star_imports_used: bool,
}

impl std::fmt::Debug for ParsedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedModule")
            .field("source_len", &self.source.len())
            .field("star_imports_used", &self.star_imports_used)
            .finish_non_exhaustive()
    }
}

/// Inventory entry for one top-level function or method.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub class_name: Option<String>,
    pub line_start: usize,
    pub line_end: usize,
}

impl ParsedModule {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn star_imports_used(&self) -> bool {
        self.star_imports_used
    }

    /// Functions and methods in declaration order. Nested functions are not
    /// descended into.
    pub fn functions(&self) -> Vec<FunctionDecl> {
        let mut decls = Vec::new();
        collect_functions(self.tree.root_node(), &self.source, None, &mut decls);
        decls
    }

    /// The syntax node for a declared function, located by its start line.
    pub fn function_node(&self, decl: &FunctionDecl) -> Option<Node<'_>> {
        find_function_node(self.tree.root_node(), decl.line_start, &decl.name, &self.source)
    }
}

/// Parse Python source into a [`ParsedModule`].
///
/// tree-sitter is error-tolerant, so malformed input is detected by walking
/// the tree for the first error node and reporting its position.
pub fn parse_module(source: &str) -> Result<ParsedModule, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(&python_language())
        .map_err(|e| ParseError {
            message: format!("failed to load python grammar: {e}"),
            line: 1,
            column: 0,
        })?;

    let tree = parser.parse(source, None).ok_or_else(|| ParseError {
        message: "parser returned no tree".to_string(),
        line: 1,
        column: 0,
    })?;

    if tree.root_node().has_error() {
        let node = first_error_node(tree.root_node()).unwrap_or_else(|| tree.root_node());
        return Err(ParseError {
            message: "malformed python source".to_string(),
            line: node.start_position().row + 1,
            column: node.start_position().column,
        });
    }

    let star_imports_used = has_star_import(tree.root_node());

    debug!(star_imports = star_imports_used, "module parsed");

    Ok(ParsedModule {
        tree,
        source: source.to_string(),
        star_imports_used,
    })
}

fn first_error_node(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            if let Some(found) = first_error_node(child) {
                return Some(found);
            }
        }
    }
    None
}

fn has_star_import(root: Node<'_>) -> bool {
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if child.kind() == "import_from_statement" {
            let mut inner = child.walk();
            if child
                .children(&mut inner)
                .any(|c| c.kind() == "wildcard_import")
            {
                return true;
            }
        }
    }
    false
}

/// Recursive descent with the enclosing class name threaded as a read-only
/// parameter — no mutable class stack.
fn collect_functions(
    node: Node<'_>,
    source: &str,
    class_name: Option<&str>,
    out: &mut Vec<FunctionDecl>,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_definition" => {
                if let Some(decl) = decl_from_node(child, source, class_name) {
                    out.push(decl);
                }
                // nested defs are out of scope for single-function analysis
            }
            "class_definition" => {
                let name = child
                    .child_by_field_name("name")
                    .map(|n| node_text(n, source).to_string());
                if let Some(body) = child.child_by_field_name("body") {
                    collect_functions(body, source, name.as_deref(), out);
                }
            }
            "decorated_definition" => {
                if let Some(definition) = child.child_by_field_name("definition") {
                    match definition.kind() {
                        "function_definition" => {
                            if let Some(decl) = decl_from_node(definition, source, class_name) {
                                out.push(decl);
                            }
                        }
                        "class_definition" => {
                            let name = definition
                                .child_by_field_name("name")
                                .map(|n| node_text(n, source).to_string());
                            if let Some(body) = definition.child_by_field_name("body") {
                                collect_functions(body, source, name.as_deref(), out);
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
}

fn decl_from_node(node: Node<'_>, source: &str, class_name: Option<&str>) -> Option<FunctionDecl> {
    let name = node_text(node.child_by_field_name("name")?, source).to_string();
    Some(FunctionDecl {
        name,
        class_name: class_name.map(|c| c.to_string()),
        line_start: node.start_position().row + 1,
        line_end: node.end_position().row + 1,
    })
}

fn find_function_node<'t>(
    node: Node<'t>,
    line_start: usize,
    name: &str,
    source: &str,
) -> Option<Node<'t>> {
    if node.kind() == "function_definition"
        && node.start_position().row + 1 == line_start
        && node
            .child_by_field_name("name")
            .map(|n| node_text(n, source) == name)
            .unwrap_or(false)
    {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = find_function_node(child, line_start, name, source) {
            return Some(found);
        }
    }
    None
}
