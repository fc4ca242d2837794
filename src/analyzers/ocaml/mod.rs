//! OCaml type grammar
//!
//! Both type spans and declarations are handled by token scans over the
//! shared lexer; OCaml has no statement terminator to strip.

pub mod declarations;
pub mod type_span;

use super::analysis::{DeclarationSpan, TopLevelDeclaration, TypeAnalysis, TypeIdentifier, TypeKind};
use super::{Rendered, Shape, TypeGrammar};
use crate::core::{Language, Position};

#[derive(Debug, Clone, Copy, Default)]
pub struct OcamlGrammar;

fn parenthesize_if(rendered: &Rendered, wrap: bool) -> String {
    if wrap {
        format!("({})", rendered.text)
    } else {
        rendered.text.clone()
    }
}

fn is_constructor(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase) && !name.contains('.')
}

impl TypeGrammar for OcamlGrammar {
    fn language(&self) -> Language {
        Language::OCaml
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
        ""
    }

    fn type_from_hover(&self, hover: &str) -> Option<String> {
        let trimmed = hover.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    fn header_with_type(&self, declaration: &TopLevelDeclaration, subject_type: &str) -> String {
        format!("let {} : {}", declaration.name, subject_type)
    }

    fn render(&self, shape: Shape<'_>) -> String {
        match shape {
            Shape::Tuple(elements) => elements
                .iter()
                .map(|e| parenthesize_if(e, e.kind.is_composite()))
                .collect::<Vec<_>>()
                .join(" * "),
            Shape::Union(members) => members
                .iter()
                .map(|m| m.text.as_str())
                .collect::<Vec<_>>()
                .join(" | "),
            Shape::Array(element) => {
                format!("{} array", parenthesize_if(element, element.kind.is_composite()))
            }
            Shape::Object { labels, .. } if labels.is_empty() => "{}".to_string(),
            Shape::Object { labels, fields } => {
                let members: Vec<String> = labels
                    .iter()
                    .zip(fields)
                    .map(|(label, field)| format!("{} : {}", label, field.text))
                    .collect();
                format!("{{ {} }}", members.join("; "))
            }
            Shape::Function {
                parameters,
                return_type,
            } => {
                let mut parts: Vec<String> = parameters
                    .iter()
                    .map(|p| {
                        let wrap = matches!(
                            p.kind,
                            TypeKind::Function | TypeKind::Union | TypeKind::Object
                        );
                        parenthesize_if(p, wrap)
                    })
                    .collect();
                let wrap = matches!(return_type.kind, TypeKind::Union | TypeKind::Object);
                parts.push(parenthesize_if(return_type, wrap));
                parts.join(" -> ")
            }
            Shape::Application { name, arguments } if is_constructor(name) => {
                match arguments {
                    [] => name.to_string(),
                    [payload] => {
                        let wrap = matches!(
                            payload.kind,
                            TypeKind::Union | TypeKind::Object | TypeKind::Function
                        );
                        format!("{} of {}", name, parenthesize_if(payload, wrap))
                    }
                    _ => {
                        let payload: Vec<String> = arguments
                            .iter()
                            .map(|a| parenthesize_if(a, a.kind.is_composite()))
                            .collect();
                        format!("{} of {}", name, payload.join(" * "))
                    }
                }
            }
            Shape::Application { name, arguments } => match arguments {
                [] => name.to_string(),
                [argument] => format!(
                    "{} {}",
                    parenthesize_if(argument, argument.kind.is_composite()),
                    name
                ),
                _ => {
                    let arguments: Vec<&str> = arguments.iter().map(|a| a.text.as_str()).collect();
                    format!("({}) {}", arguments.join(", "), name)
                }
            },
        }
    }
}
