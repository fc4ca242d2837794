//! Tree-sitter parser integration for TypeScript
//!
//! Declarations are parsed with the tree-sitter TypeScript grammar; type
//! spans inside them are classified by [`super::type_span`].

use crate::core::Position;
use tree_sitter::{Language as TsLanguage, Node, Parser, Tree};

fn get_language() -> TsLanguage {
    tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
}

/// Parse TypeScript source into a tree-sitter tree.
///
/// Returns `None` only if the grammar cannot be loaded; syntax errors are
/// represented inside the tree.
pub fn parse_source(content: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    parser.set_language(&get_language()).ok()?;
    parser.parse(content, None)
}

/// Get text for a tree-sitter node
pub fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

/// Get the line number for a tree-sitter node (1-indexed)
pub fn node_line(node: &Node) -> usize {
    node.start_position().row + 1
}

/// Get the column number for a tree-sitter node (1-indexed)
pub fn node_column(node: &Node) -> usize {
    node.start_position().column + 1
}

/// Zero-based start of a node in language service coordinates.
pub fn node_position(node: &Node) -> Position {
    let point = node.start_position();
    Position::new(point.row as u32, point.column as u32)
}
