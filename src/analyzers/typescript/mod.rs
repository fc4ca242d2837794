//! TypeScript type grammar
//!
//! Type spans are classified by a recursive-descent parser
//! ([`type_span`]); declarations are located with tree-sitter
//! ([`declarations`]).
//!
//! # Example
//!
//! ```ignore
//! use context_extractor::analyzers::{typescript::TypeScriptGrammar, TypeGrammar};
//!
//! let grammar = TypeScriptGrammar;
//! let analysis = grammar.analyze("(a: Apple) => Cherry");
//! assert_eq!(analysis.return_type.unwrap().text, "Cherry");
//! ```

pub mod declarations;
pub mod parser;
pub mod type_span;

use super::analysis::{
    DeclarationKind, DeclarationSpan, Marker, TopLevelDeclaration, TypeAnalysis, TypeIdentifier,
    TypeKind,
};
use super::{Rendered, Shape, TypeGrammar};
use crate::core::{Language, Position};

#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptGrammar;

fn join(parts: &[Rendered], separator: &str) -> String {
    parts
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}

fn needs_parens_as_element(element: &Rendered) -> bool {
    match element.kind {
        TypeKind::Union | TypeKind::Function => true,
        TypeKind::Unknown => element.text.contains(' '),
        _ => false,
    }
}

/// Tuple element or parameter with its `...` or `?` marker.
fn marked(element: &Rendered) -> String {
    match element.marker {
        None => element.text.clone(),
        Some(Marker::Rest) => format!("...{}", element.text),
        Some(Marker::Optional) if needs_parens_as_element(element) => {
            format!("({})?", element.text)
        }
        Some(Marker::Optional) => format!("{}?", element.text),
    }
}

fn join_marked(parts: &[Rendered]) -> String {
    parts.iter().map(marked).collect::<Vec<_>>().join(", ")
}

impl TypeGrammar for TypeScriptGrammar {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn analyze(&self, span: &str) -> TypeAnalysis {
        type_span::analyze(span)
    }

    fn extract_identifiers(&self, declaration_text: &str) -> Vec<TypeIdentifier> {
        declarations::extract_identifiers(declaration_text)
    }

    fn declaration_name(&self, declaration_text: &str) -> Option<String> {
        declarations::declaration_name(declaration_text)
    }

    fn alias_definition(&self, declaration_text: &str) -> Option<String> {
        declarations::alias_definition(declaration_text)
    }

    fn find_enclosing_declaration(
        &self,
        source: &str,
        position: Position,
    ) -> Option<DeclarationSpan> {
        declarations::find_enclosing_declaration(source, position)
    }

    fn top_level_declarations(&self, source: &str) -> Vec<TopLevelDeclaration> {
        declarations::top_level_declarations(source)
    }

    fn statement_terminator(&self) -> &'static str {
        ";"
    }

    fn type_from_hover(&self, hover: &str) -> Option<String> {
        declarations::type_from_hover(hover)
    }

    fn header_with_type(&self, declaration: &TopLevelDeclaration, subject_type: &str) -> String {
        match declaration.kind {
            DeclarationKind::Variable => format!("{}: {}", declaration.header, subject_type),
            DeclarationKind::Function => {
                let analysis = self.analyze(subject_type);
                match analysis.return_type {
                    Some(return_type) => format!("{}: {}", declaration.header, return_type.text),
                    None => declaration.header.clone(),
                }
            }
        }
    }

    fn render(&self, shape: Shape<'_>) -> String {
        match shape {
            Shape::Tuple(elements) => format!("[{}]", join_marked(elements)),
            Shape::Union(members) => members
                .iter()
                .map(|m| format!("({})", m.text))
                .collect::<Vec<_>>()
                .join(" | "),
            Shape::Array(element) if needs_parens_as_element(element) => {
                format!("({})[]", element.text)
            }
            Shape::Array(element) => format!("{}[]", element.text),
            Shape::Object { labels, fields } if fields.is_empty() && labels.is_empty() => {
                "{}".to_string()
            }
            Shape::Object { labels, fields } => {
                let members: Vec<String> = labels
                    .iter()
                    .zip(fields)
                    .map(|(label, field)| format!("{}: {}", label, field.text))
                    .collect();
                format!("{{{}}}", members.join("; "))
            }
            Shape::Function {
                parameters,
                return_type,
            } => format!("({}) => {}", join_marked(parameters), return_type.text),
            Shape::Application { name, arguments } => {
                format!("{}<{}>", name, join(arguments, ", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_shapes() {
        let grammar = TypeScriptGrammar;
        let a = Rendered::new("A", TypeKind::NamedReference);
        let union = Rendered::new("(A) | (B)", TypeKind::Union);

        assert_eq!(
            grammar.render(Shape::Tuple(&[a.clone(), union.clone()])),
            "[A, (A) | (B)]"
        );
        assert_eq!(grammar.render(Shape::Array(&union)), "((A) | (B))[]");
        assert_eq!(grammar.render(Shape::Array(&a)), "A[]");
        assert_eq!(
            grammar.render(Shape::Object {
                labels: &[],
                fields: &[]
            }),
            "{}"
        );
        assert_eq!(
            grammar.render(Shape::Function {
                parameters: &[a.clone()],
                return_type: &a
            }),
            "(A) => A"
        );
    }

    #[test]
    fn test_render_keeps_rest_and_optional_markers() {
        let grammar = TypeScriptGrammar;
        let void = Rendered::new("void", TypeKind::Primitive);
        let rest = Rendered::new("A[]", TypeKind::Array).with_marker(Some(Marker::Rest));
        let optional = Rendered::new("(A) | (B)", TypeKind::Union).with_marker(Some(Marker::Optional));

        assert_eq!(
            grammar.render(Shape::Function {
                parameters: &[rest.clone()],
                return_type: &void
            }),
            "(...A[]) => void"
        );
        assert_eq!(
            grammar.render(Shape::Tuple(&[optional, rest])),
            "[((A) | (B))?, ...A[]]"
        );
    }

    #[test]
    fn test_header_with_type() {
        let grammar = TypeScriptGrammar;
        let declaration = TopLevelDeclaration {
            kind: DeclarationKind::Variable,
            name: "count".into(),
            name_position: Position::new(0, 4),
            start: Position::new(0, 4),
            header: "let count".into(),
            subject_type: None,
        };
        assert_eq!(
            grammar.header_with_type(&declaration, "number"),
            "let count: number"
        );

        let function = TopLevelDeclaration {
            kind: DeclarationKind::Function,
            header: "function reset(model: Model)".into(),
            ..declaration
        };
        assert_eq!(
            grammar.header_with_type(&function, "(model: Model) => Model"),
            "function reset(model: Model): Model"
        );
    }
}
