//! Structural type equivalence.
//!
//! Two spans are equivalent when their normal forms are equal. A normal
//! form expands every alias known to the run and re-serializes the
//! result through the grammar, so spelling differences (whitespace,
//! labels, parentheses, alias names) disappear.

use super::cache::NormalFormCache;
use crate::analyzers::{Rendered, Shape, TypeAnalysis, TypeGrammar, TypeKind};
use crate::core::RelevantTypes;
use std::collections::HashMap;

pub struct Normalizer<'g, G: TypeGrammar + ?Sized> {
    grammar: &'g G,
    aliases: HashMap<String, String>,
    cache: NormalFormCache,
}

impl<'g, G: TypeGrammar + ?Sized> Normalizer<'g, G> {
    /// Build a normalizer whose alias map holds every relevant type with
    /// an alias definition.
    pub fn new(grammar: &'g G, relevant: &RelevantTypes) -> Self {
        let aliases = relevant
            .iter()
            .filter_map(|entry| {
                grammar
                    .alias_definition(&entry.declaration_text)
                    .map(|definition| (entry.identifier.clone(), definition))
            })
            .collect();
        Self::with_aliases(grammar, aliases)
    }

    /// Build a normalizer from `name -> right-hand side` pairs.
    pub fn with_aliases(grammar: &'g G, aliases: HashMap<String, String>) -> Self {
        Self {
            grammar,
            aliases,
            cache: NormalFormCache::default(),
        }
    }

    pub fn cache(&self) -> &NormalFormCache {
        &self.cache
    }

    pub fn normalize(&mut self, span: &str) -> String {
        if let Some(form) = self.cache.get(span) {
            return form.to_string();
        }
        let analysis = self.grammar.analyze(span);
        let form = self.normalize_analysis(&analysis, &mut Vec::new()).text;
        self.cache.insert(span, form.clone());
        form
    }

    pub fn equivalent(&mut self, left: &str, right: &str) -> bool {
        self.normalize(left) == self.normalize(right)
    }

    /// `expanding` holds the aliases currently being expanded; meeting one
    /// of them again leaves the reference as written.
    fn normalize_analysis(&self, analysis: &TypeAnalysis, expanding: &mut Vec<String>) -> Rendered {
        match analysis.kind {
            TypeKind::Primitive | TypeKind::Unknown => {
                Rendered::new(analysis.text.clone(), analysis.kind)
            }
            TypeKind::NamedReference if analysis.constituents.is_empty() => {
                let name = analysis.name.as_deref().unwrap_or(&analysis.text);
                match self.aliases.get(name) {
                    Some(definition) if !expanding.iter().any(|n| n == name) => {
                        expanding.push(name.to_string());
                        let expanded = self.grammar.analyze(definition);
                        let rendered = self.normalize_analysis(&expanded, expanding);
                        expanding.pop();
                        rendered
                    }
                    _ => Rendered::new(name, TypeKind::NamedReference),
                }
            }
            TypeKind::NamedReference => {
                let arguments = self.normalize_all(&analysis.constituents, expanding);
                let name = analysis.name.as_deref().unwrap_or(&analysis.text);
                let text = self.grammar.render(Shape::Application {
                    name,
                    arguments: &arguments,
                });
                Rendered::new(text, TypeKind::NamedReference)
            }
            TypeKind::Tuple => {
                let elements = self.normalize_all(&analysis.constituents, expanding);
                Rendered::new(self.grammar.render(Shape::Tuple(&elements)), TypeKind::Tuple)
            }
            TypeKind::Union => {
                let members = self.normalize_all(&analysis.constituents, expanding);
                Rendered::new(self.grammar.render(Shape::Union(&members)), TypeKind::Union)
            }
            TypeKind::Object => {
                let fields = self.normalize_all(&analysis.constituents, expanding);
                let text = self.grammar.render(Shape::Object {
                    labels: &analysis.labels,
                    fields: &fields,
                });
                Rendered::new(text, TypeKind::Object)
            }
            TypeKind::Array => match analysis.constituents.first() {
                Some(element) => {
                    let element = self.normalize_analysis(element, expanding);
                    Rendered::new(self.grammar.render(Shape::Array(&element)), TypeKind::Array)
                }
                None => Rendered::new(analysis.text.clone(), TypeKind::Unknown),
            },
            TypeKind::Function => match &analysis.return_type {
                Some(return_type) => {
                    let parameters = self.normalize_all(&analysis.constituents, expanding);
                    let return_type = self.normalize_analysis(return_type, expanding);
                    let text = self.grammar.render(Shape::Function {
                        parameters: &parameters,
                        return_type: &return_type,
                    });
                    Rendered::new(text, TypeKind::Function)
                }
                None => Rendered::new(analysis.text.clone(), TypeKind::Unknown),
            },
        }
    }

    fn normalize_all(&self, analyses: &[TypeAnalysis], expanding: &mut Vec<String>) -> Vec<Rendered> {
        analyses
            .iter()
            .map(|a| self.normalize_analysis(a, expanding).with_marker(a.marker))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::ocaml::OcamlGrammar;
    use crate::analyzers::typescript::TypeScriptGrammar;
    use crate::core::RelevantTypeEntry;
    use pretty_assertions::assert_eq;

    fn typescript(aliases: &[(&str, &str)]) -> Normalizer<'static, TypeScriptGrammar> {
        let aliases = aliases
            .iter()
            .map(|(name, rhs)| (name.to_string(), rhs.to_string()))
            .collect();
        Normalizer::with_aliases(&TypeScriptGrammar, aliases)
    }

    #[test]
    fn test_primitives_and_unknown_are_verbatim() {
        let mut normalizer = typescript(&[]);
        assert_eq!(normalizer.normalize("number"), "number");
        assert_eq!(normalizer.normalize("keyof Model"), "keyof Model");
    }

    #[test]
    fn test_alias_expansion() {
        let mut normalizer = typescript(&[
            ("Model", "[string, Todo[]]"),
            ("Todo", "[string, boolean]"),
        ]);
        assert_eq!(
            normalizer.normalize("Model"),
            "[string, [string, boolean][]]"
        );
        assert!(normalizer.equivalent("Todo[]", "[string,   boolean][]"));
    }

    #[test]
    fn test_unknown_names_are_opaque() {
        let mut normalizer = typescript(&[]);
        assert_eq!(normalizer.normalize("Todo"), "Todo");
        assert!(!normalizer.equivalent("Todo", "Item"));
    }

    #[test]
    fn test_function_labels_do_not_matter() {
        let mut normalizer = typescript(&[("Todo", "[string, boolean]")]);
        assert!(normalizer.equivalent(
            "(index: number, todos: Todo[]) => Todo[]",
            "(i: number, xs: [string, boolean][]) => Todo[]"
        ));
    }

    #[test]
    fn test_rest_and_optional_markers_are_kept() {
        let mut normalizer = typescript(&[("Todos", "Todo[]")]);
        assert_eq!(normalizer.normalize("(...xs: Todos) => void"), "(...Todo[]) => void");
        assert!(!normalizer.equivalent("(...xs: Todo[]) => void", "(xs: Todo[]) => void"));
        assert!(!normalizer.equivalent("(limit?: number) => void", "(limit: number) => void"));
        assert!(normalizer.equivalent("[name: string, done?: boolean]", "[string, boolean?]"));
        assert!(!normalizer.equivalent("[string, boolean?]", "[string, boolean]"));
    }

    #[test]
    fn test_union_members_are_parenthesized_in_order() {
        let mut normalizer = typescript(&[]);
        assert_eq!(normalizer.normalize("A | B"), "(A) | (B)");
        assert!(!normalizer.equivalent("A | B", "B | A"));
    }

    #[test]
    fn test_object_fields_keep_order() {
        let mut normalizer = typescript(&[("Id", "number")]);
        assert_eq!(normalizer.normalize("{ id: Id, name: string }"), "{id: number; name: string}");
        assert_eq!(normalizer.normalize("{}"), "{}");
    }

    #[test]
    fn test_alias_cycle_terminates() {
        let mut normalizer = typescript(&[("A", "B"), ("B", "A")]);
        assert_eq!(normalizer.normalize("A"), "A");
        assert_eq!(normalizer.normalize("B"), "B");

        let mut normalizer = typescript(&[("List", "[number, List]")]);
        assert_eq!(normalizer.normalize("List"), "[number, List]");
    }

    #[test]
    fn test_results_are_memoized_by_span() {
        let mut normalizer = typescript(&[]);
        normalizer.normalize("[A, B]");
        normalizer.normalize("[A, B]");
        assert_eq!(normalizer.cache().len(), 1);
    }

    #[test]
    fn test_new_collects_alias_definitions() {
        let relevant: RelevantTypes = [
            RelevantTypeEntry::new("Todo", "type Todo = [string, boolean]", "/p/prelude.ts"),
            RelevantTypeEntry::new("Shape", "class Shape {}", "/p/prelude.ts"),
        ]
        .into_iter()
        .collect();
        let mut normalizer = Normalizer::new(&TypeScriptGrammar, &relevant);
        assert_eq!(normalizer.normalize("Todo"), "[string, boolean]");
        assert_eq!(normalizer.normalize("Shape"), "Shape");
    }

    #[test]
    fn test_ocaml_normal_forms() {
        let aliases = [
            ("todo".to_string(), "{ title : string; completed : bool }".to_string()),
            ("model".to_string(), "string * todo list".to_string()),
        ]
        .into_iter()
        .collect();
        let mut normalizer = Normalizer::with_aliases(&OcamlGrammar, aliases);
        assert_eq!(
            normalizer.normalize("model"),
            "string * ({ title : string; completed : bool }) list"
        );
        assert!(normalizer.equivalent("int -> model", "int -> (string * todo list)"));
    }
}
