//! Declaration-level queries over TypeScript source, backed by tree-sitter.

use super::parser::{node_column, node_line, node_position, node_text, parse_source};
use crate::analyzers::analysis::{
    DeclarationKind, DeclarationSpan, TopLevelDeclaration, TypeIdentifier,
};
use crate::core::Position;
use tree_sitter::{Node, Point};

const TYPE_DECLARATION_KINDS: &[&str] = &[
    "type_alias_declaration",
    "interface_declaration",
    "class_declaration",
    "abstract_class_declaration",
    "enum_declaration",
];

const FUNCTION_VALUE_KINDS: &[&str] = &["arrow_function", "function_expression", "function"];

fn is_type_declaration(node: &Node) -> bool {
    TYPE_DECLARATION_KINDS.contains(&node.kind())
}

fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Peel `export` and `declare` wrappers off a statement.
fn unwrap_declaration(node: Node<'_>) -> Node<'_> {
    match node.kind() {
        "export_statement" => node
            .child_by_field_name("declaration")
            .map_or(node, unwrap_declaration),
        "ambient_declaration" => node
            .named_child(0)
            .map_or(node, unwrap_declaration),
        _ => node,
    }
}

/// Pre-order list of every node with the given kind.
fn collect_nodes<'t>(root: Node<'t>, kind: &str) -> Vec<Node<'t>> {
    let mut found = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.kind() == kind {
            found.push(node);
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    found
}

fn strip_annotation(text: &str) -> &str {
    text.trim_start().trim_start_matches(':').trim()
}

pub fn extract_identifiers(declaration_text: &str) -> Vec<TypeIdentifier> {
    let Some(tree) = parse_source(declaration_text) else {
        return Vec::new();
    };
    collect_nodes(tree.root_node(), "type_identifier")
        .into_iter()
        .map(|node| TypeIdentifier {
            name: node_text(&node, declaration_text).to_string(),
            start_offset: node.start_byte(),
            line: node_line(&node),
            column: node_column(&node),
        })
        .collect()
}

fn first_type_declaration<'t>(root: Node<'t>) -> Option<Node<'t>> {
    named_children(root)
        .into_iter()
        .map(unwrap_declaration)
        .find(is_type_declaration)
}

pub fn declaration_name(declaration_text: &str) -> Option<String> {
    let tree = parse_source(declaration_text)?;
    let declaration = first_type_declaration(tree.root_node())?;
    let name = declaration.child_by_field_name("name")?;
    Some(node_text(&name, declaration_text).to_string())
}

/// Right-hand side of `type X = RHS`. Interfaces without an `extends`
/// clause expose their body, which the type-span parser reads as an
/// object type.
pub fn alias_definition(declaration_text: &str) -> Option<String> {
    let tree = parse_source(declaration_text)?;
    let declaration = first_type_declaration(tree.root_node())?;
    match declaration.kind() {
        "type_alias_declaration" => declaration
            .child_by_field_name("value")
            .map(|value| node_text(&value, declaration_text).to_string()),
        "interface_declaration" => {
            let extends = named_children(declaration)
                .iter()
                .any(|child| child.kind() == "extends_type_clause");
            if extends {
                return None;
            }
            declaration
                .child_by_field_name("body")
                .map(|body| node_text(&body, declaration_text).to_string())
        }
        _ => None,
    }
}

pub fn find_enclosing_declaration(source: &str, position: Position) -> Option<DeclarationSpan> {
    let tree = parse_source(source)?;
    let point = Point::new(position.line as usize, position.character as usize);
    let mut node = tree.root_node().descendant_for_point_range(point, point)?;

    loop {
        if is_type_declaration(&node) {
            break;
        }
        if node.kind() == "export_statement" {
            if let Some(inner) = node
                .child_by_field_name("declaration")
                .filter(is_type_declaration)
            {
                node = inner;
                break;
            }
        }
        node = node.parent()?;
    }

    Some(DeclarationSpan {
        text: node_text(&node, source).to_string(),
        start: node_position(&node),
    })
}

/// Render `(a: A, b?: B)` from a `formal_parameters` node.
fn render_parameters(parameters: &Node, source: &str) -> String {
    let rendered: Vec<String> = named_children(*parameters)
        .into_iter()
        .filter(|p| matches!(p.kind(), "required_parameter" | "optional_parameter"))
        .map(|p| {
            let pattern = p
                .child_by_field_name("pattern")
                .map_or("_", |n| node_text(&n, source));
            let optional = if p.kind() == "optional_parameter" { "?" } else { "" };
            let ty = p
                .child_by_field_name("type")
                .map_or("any", |n| strip_annotation(node_text(&n, source)));
            format!("{pattern}{optional}: {ty}")
        })
        .collect();
    format!("({})", rendered.join(", "))
}

/// Function type of a function-like node, when its return type is written.
fn function_subject_type(node: &Node, source: &str) -> Option<String> {
    let return_type = node.child_by_field_name("return_type")?;
    let parameters = match node.child_by_field_name("parameters") {
        Some(parameters) => render_parameters(&parameters, source),
        // single bare arrow parameter, `x => ...`
        None => {
            let parameter = node.child_by_field_name("parameter")?;
            format!("({}: any)", node_text(&parameter, source))
        }
    };
    Some(format!(
        "{} => {}",
        parameters,
        strip_annotation(node_text(&return_type, source))
    ))
}

fn function_declaration(node: &Node, source: &str) -> Option<TopLevelDeclaration> {
    let name = node.child_by_field_name("name")?;
    let header_end = node
        .child_by_field_name("body")
        .map_or(node.end_byte(), |body| body.start_byte());
    let header = source[node.start_byte()..header_end]
        .trim_end()
        .trim_end_matches(';')
        .to_string();

    Some(TopLevelDeclaration {
        kind: DeclarationKind::Function,
        name: node_text(&name, source).to_string(),
        name_position: node_position(&name),
        start: node_position(node),
        header,
        subject_type: function_subject_type(node, source),
    })
}

fn variable_declarations(node: &Node, source: &str) -> Vec<TopLevelDeclaration> {
    let keyword = node
        .child(0)
        .map_or("const", |k| node_text(&k, source));

    named_children(*node)
        .into_iter()
        .filter(|d| d.kind() == "variable_declarator")
        .filter_map(|declarator| {
            let name = declarator.child_by_field_name("name")?;
            let value = declarator.child_by_field_name("value");
            let signature_end = value.map_or(declarator.end_byte(), |v| v.start_byte());
            let signature = source[declarator.start_byte()..signature_end]
                .trim_end()
                .trim_end_matches('=')
                .trim_end();
            let mut header = format!("{keyword} {signature}");

            let annotated = declarator
                .child_by_field_name("type")
                .map(|ty| strip_annotation(node_text(&ty, source)).to_string());
            let subject_type = annotated.or_else(|| {
                let value = value.filter(|v| FUNCTION_VALUE_KINDS.contains(&v.kind()))?;
                let subject = function_subject_type(&value, source)?;
                header = format!("{header}: {subject}");
                Some(subject)
            });

            Some(TopLevelDeclaration {
                kind: DeclarationKind::Variable,
                name: node_text(&name, source).to_string(),
                name_position: node_position(&name),
                start: node_position(&declarator),
                header,
                subject_type,
            })
        })
        .collect()
}

pub fn top_level_declarations(source: &str) -> Vec<TopLevelDeclaration> {
    let Some(tree) = parse_source(source) else {
        return Vec::new();
    };

    named_children(tree.root_node())
        .into_iter()
        .map(unwrap_declaration)
        .flat_map(|node| match node.kind() {
            "function_declaration" | "function_signature" | "generator_function_declaration" => {
                function_declaration(&node, source).into_iter().collect()
            }
            "lexical_declaration" | "variable_declaration" => variable_declarations(&node, source),
            _ => Vec::new(),
        })
        .collect()
}

/// Index of the bracket closing the one at the start of `text`.
fn matching_bracket(text: &str, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut previous = '\0';
    for (index, c) in text.char_indices() {
        if c == open {
            depth += 1;
        } else if c == close && !(close == '>' && previous == '=') {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(index);
            }
        }
        previous = c;
    }
    None
}

/// Type of a symbol from hover text such as `const x: T` or
/// `function f(a: A): B`.
pub fn type_from_hover(hover: &str) -> Option<String> {
    let mut text = hover.trim();
    // `(alias) `, `(property) ` and similar annotations
    while let Some(rest) = text.strip_prefix('(') {
        match rest.split_once(") ") {
            Some((tag, after)) if tag.chars().all(|c| c.is_ascii_alphabetic() || c == ' ') => {
                text = after.trim_start();
            }
            _ => break,
        }
    }

    for keyword in ["const ", "let ", "var "] {
        if let Some(rest) = text.strip_prefix(keyword) {
            let (_, ty) = rest.split_once(':')?;
            return Some(ty.trim().to_string());
        }
    }

    let rest = text
        .strip_prefix("function ")
        .or_else(|| text.strip_prefix("declare function "))?;
    let open = rest.find(['(', '<'])?;
    let mut signature = &rest[open..];
    if signature.starts_with('<') {
        let close = matching_bracket(signature, '<', '>')?;
        signature = &signature[close + 1..];
    }
    let close = matching_bracket(signature, '(', ')')?;
    let parameters = &signature[..=close];
    let return_type = signature[close + 1..].trim_start().strip_prefix(':')?.trim();
    Some(format!("{parameters} => {return_type}"))
}
