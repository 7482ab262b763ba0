//! Best-effort complexity metrics over a source slice.
//!
//! This is a collaborator at the boundary of the core: the fact extractor
//! copies the result into the fact record and degrades to `1`/`0` with a
//! logged warning when the slice does not parse on its own. The grammar is
//! indentation-tolerant, so method bodies sliced out of a class still parse
//! and get their real complexity.

use anyhow::{bail, Result};
use tree_sitter::{Node, Parser};

/// Cyclomatic complexity of the first function in `source` (>= 1).
pub fn cyclomatic_complexity(source: &str) -> Result<u32> {
    let tree = parse(source)?;
    Ok(1 + count_decision_points(tree.root_node()))
}

/// Cognitive complexity: decision points weighted by nesting depth.
pub fn cognitive_complexity(source: &str) -> Result<u32> {
    let tree = parse(source)?;
    Ok(cognitive_walk(tree.root_node(), 0))
}

fn parse(source: &str) -> Result<tree_sitter::Tree> {
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_python::LANGUAGE.into())?;
    let Some(tree) = parser.parse(source, None) else {
        bail!("parser returned no tree");
    };
    if tree.root_node().has_error() {
        bail!("source slice does not parse standalone");
    }
    Ok(tree)
}

fn is_decision_point(kind: &str) -> bool {
    matches!(
        kind,
        "if_statement"
            | "elif_clause"
            | "for_statement"
            | "while_statement"
            | "except_clause"
            | "boolean_operator"
            | "conditional_expression"
            | "if_clause"
            | "case_clause"
            | "assert_statement"
    )
}

fn count_decision_points(node: Node<'_>) -> u32 {
    let mut count = u32::from(is_decision_point(node.kind()));
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        count += count_decision_points(child);
    }
    count
}

fn nests(kind: &str) -> bool {
    matches!(
        kind,
        "if_statement" | "for_statement" | "while_statement" | "except_clause" | "match_statement"
    )
}

fn cognitive_walk(node: Node<'_>, depth: u32) -> u32 {
    let mut score = 0;
    if nests(node.kind()) {
        score += 1 + depth;
    } else if matches!(node.kind(), "boolean_operator" | "conditional_expression") {
        score += 1;
    }
    let child_depth = depth + u32::from(nests(node.kind()));
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        score += cognitive_walk(child, child_depth);
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_line_function_is_one() {
        let source = "def f(x):\n    return x\n";
        assert_eq!(cyclomatic_complexity(source).unwrap(), 1);
        assert_eq!(cognitive_complexity(source).unwrap(), 0);
    }

    #[test]
    fn branches_add_up() {
        let source = r#"
def f(x):
    if x > 0 and x < 10:
        return 1
    elif x < 0:
        return -1
    for i in range(x):
        if i % 2:
            return i
    return 0
"#;
        // if + and + elif + for + nested if
        assert_eq!(cyclomatic_complexity(source).unwrap(), 6);
        // outer if (1) + and (1) + for (1) + nested if (1 + depth 1)
        assert_eq!(cognitive_complexity(source).unwrap(), 5);
    }

    #[test]
    fn indented_method_slice_parses() {
        let source = "    def method(self, x):\n        if x:\n            return 1\n        return 0\n";
        assert_eq!(cyclomatic_complexity(source).unwrap(), 2);
    }

    #[test]
    fn malformed_slice_is_an_error() {
        assert!(cyclomatic_complexity("def broken(:\n    pass\n").is_err());
    }
}
