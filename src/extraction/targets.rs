//! Target types: the spans a header has to produce to be relevant.

use crate::analyzers::{TypeGrammar, TypeKind};
use crate::core::RelevantTypes;
use indexmap::IndexSet;
use std::collections::HashSet;
use tracing::debug;

/// Derive the target types of a hole.
///
/// The set holds the hole type itself plus everything reachable from it
/// through return types and tuple elements, looking through aliases
/// declared in `relevant`.
pub fn generate_target_types<G: TypeGrammar + ?Sized>(
    grammar: &G,
    hole_type: &str,
    relevant: &RelevantTypes,
) -> IndexSet<String> {
    let hole_type = hole_type.trim();
    let mut targets = IndexSet::new();
    targets.insert(hole_type.to_string());
    let mut visited = HashSet::new();
    expand(grammar, hole_type, relevant, &mut targets, &mut visited);
    debug!(count = targets.len(), "Generated target types");
    targets
}

fn expand<G: TypeGrammar + ?Sized>(
    grammar: &G,
    span: &str,
    relevant: &RelevantTypes,
    targets: &mut IndexSet<String>,
    visited: &mut HashSet<String>,
) {
    if !visited.insert(span.to_string()) {
        return;
    }
    let analysis = grammar.analyze(span);
    match analysis.kind {
        TypeKind::Function | TypeKind::Tuple => {
            for part in analysis.decomposition() {
                targets.insert(part.text.clone());
                expand(grammar, &part.text, relevant, targets, visited);
            }
        }
        _ => {
            let definition = relevant
                .get(&analysis.text)
                .and_then(|entry| grammar.alias_definition(&entry.declaration_text));
            if let Some(definition) = definition {
                expand(grammar, &definition, relevant, targets, visited);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::ocaml::OcamlGrammar;
    use crate::analyzers::typescript::TypeScriptGrammar;
    use crate::core::RelevantTypeEntry;
    use pretty_assertions::assert_eq;

    fn relevant(entries: &[(&str, &str)]) -> RelevantTypes {
        entries
            .iter()
            .map(|(name, text)| RelevantTypeEntry::new(*name, *text, "/p/prelude.ts"))
            .collect()
    }

    fn sorted(targets: IndexSet<String>) -> Vec<String> {
        let mut targets: Vec<String> = targets.into_iter().collect();
        targets.sort();
        targets
    }

    #[test]
    fn test_function_hole_unwraps_return_and_alias() {
        let types = relevant(&[
            ("Model", "type Model = [string, Todo[]]"),
            ("Todo", "type Todo = [string, boolean]"),
        ]);
        let targets = generate_target_types(
            &TypeScriptGrammar,
            "(model: Model, action: Action) => Model",
            &types,
        );
        assert_eq!(
            sorted(targets),
            vec![
                "(model: Model, action: Action) => Model",
                "Model",
                "Todo[]",
                "string",
            ]
        );
    }

    #[test]
    fn test_non_alias_hole_is_only_target() {
        let targets = generate_target_types(&TypeScriptGrammar, "Todo[]", &RelevantTypes::new());
        assert_eq!(targets.into_iter().collect::<Vec<_>>(), vec!["Todo[]"]);
    }

    #[test]
    fn test_alias_cycle_terminates() {
        let types = relevant(&[("A", "type A = B"), ("B", "type B = A")]);
        let targets = generate_target_types(&TypeScriptGrammar, "A", &types);
        assert_eq!(targets.into_iter().collect::<Vec<_>>(), vec!["A"]);

        let types = relevant(&[("Pair", "type Pair = [number, Pair]")]);
        let targets = generate_target_types(&TypeScriptGrammar, "Pair", &types);
        assert_eq!(sorted(targets), vec!["Pair", "number"]);
    }

    #[test]
    fn test_ocaml_curried_function() {
        let types: RelevantTypes = [RelevantTypeEntry::new(
            "model",
            "type model = string * todo list",
            "/p/prelude.ml",
        )]
        .into_iter()
        .collect();
        let targets = generate_target_types(&OcamlGrammar, "model -> action -> model", &types);
        assert_eq!(
            sorted(targets),
            vec![
                "action -> model",
                "model",
                "model -> action -> model",
                "string",
                "todo list",
            ]
        );
    }
}
