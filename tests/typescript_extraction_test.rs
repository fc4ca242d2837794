mod common;

use common::{Project, StubService};
use context_extractor::analyzers::typescript::TypeScriptGrammar;
use context_extractor::core::{Error, HoleContext, Location, Position, Range, SymbolInfo};
use context_extractor::drivers::typescript::INJECTED_SKETCH;
use context_extractor::drivers::TypeScriptDriver;
use context_extractor::extraction::{
    extract_context, ExtractionOptions, RelevantTypeResolver, SourceCache,
};
use indoc::indoc;
use pretty_assertions::assert_eq;

const PRELUDE: &str = indoc! {r#"
    type Todo = [string, boolean];
    type Model = [string, Todo[]];
    type Action = { kind: "add"; title: string } | { kind: "toggle"; index: number };

    const toggle = (index: number, todos: Todo[]): Todo[] => todos;
    const isEmpty = (title: string): boolean => title.length === 0;
"#};

const SKETCH: &str = "const update = (model: Model, action: Action): Model => _();\n";

fn hole_in(project: &Project, name: &str, declaration: &str) -> HoleContext {
    project.write(name, &format!("{declaration}\n"));
    HoleContext {
        hole_type: String::new(),
        identifier: "_()".to_string(),
        declaration_text: declaration.to_string(),
        declaration_start: Position::new(0, 0),
        source_uri: project.uri(name),
        hole_position: Position::new(0, 0),
        hover_text: String::new(),
    }
}

#[tokio::test]
async fn test_resolves_model_and_todo_without_hole_identifier() {
    let project = Project::new();
    project.write("prelude.ts", PRELUDE);
    let hole = hole_in(&project, "hole.ts", "declare function _(): Model");
    let service = StubService::new(project.root());
    let grammar = TypeScriptGrammar;
    let mut sources = SourceCache::new();

    let types = RelevantTypeResolver::new(&grammar, &service, &mut sources)
        .resolve(&hole)
        .await
        .unwrap();

    let mut identifiers: Vec<&str> = types.identifiers().collect();
    identifiers.sort();
    assert_eq!(identifiers, vec!["Model", "Todo"]);
    assert!(!types.contains("_()"));
    assert_eq!(
        types.get("Model").unwrap().declaration_text,
        "type Model = [string, Todo[]]"
    );
    assert_eq!(types.get("Todo").unwrap().source_file, project.path("prelude.ts"));
}

#[tokio::test]
async fn test_each_identifier_is_queried_once() {
    let project = Project::new();
    project.write(
        "prelude.ts",
        indoc! {"
            type Todo = [string, boolean];
            type Model = [Todo, Todo[]];
        "},
    );
    let hole = hole_in(&project, "hole.ts", "declare function _(): [Model, Model]");
    let service = StubService::new(project.root());
    let grammar = TypeScriptGrammar;
    let mut sources = SourceCache::new();

    let types = RelevantTypeResolver::new(&grammar, &service, &mut sources)
        .resolve(&hole)
        .await
        .unwrap();

    assert_eq!(types.len(), 2);
    assert_eq!(service.queries_for("Model"), 1);
    assert_eq!(service.queries_for("Todo"), 1);
}

#[tokio::test]
async fn test_cyclic_interfaces_terminate() {
    let project = Project::new();
    project.write(
        "nodes.ts",
        indoc! {"
            interface Tree { children: Forest }
            interface Forest { first: Tree; rest: Forest }
        "},
    );
    let hole = hole_in(&project, "hole.ts", "declare function _(): Tree");
    let service = StubService::new(project.root());
    let grammar = TypeScriptGrammar;
    let mut sources = SourceCache::new();

    let types = RelevantTypeResolver::new(&grammar, &service, &mut sources)
        .resolve(&hole)
        .await
        .unwrap();

    let mut identifiers: Vec<&str> = types.identifiers().collect();
    identifiers.sort();
    assert_eq!(identifiers, vec!["Forest", "Tree"]);
}

#[tokio::test]
async fn test_failed_definition_query_is_skipped() {
    let project = Project::new();
    project.write("prelude.ts", PRELUDE);
    let hole = hole_in(&project, "hole.ts", "declare function _(): Model");
    let service = StubService::new(project.root()).failing_definition("Todo");
    let grammar = TypeScriptGrammar;
    let mut sources = SourceCache::new();

    let types = RelevantTypeResolver::new(&grammar, &service, &mut sources)
        .resolve(&hole)
        .await
        .unwrap();

    assert!(types.contains("Model"));
    assert!(!types.contains("Todo"));
}

#[tokio::test]
async fn test_non_file_definition_is_skipped() {
    let project = Project::new();
    project.write("prelude.ts", "type Foo = string;\ntype Bar = number;\n");
    let hole = hole_in(&project, "hole.ts", "declare function _(): [Foo, Bar]");
    let untitled = Location::new(
        "untitled:Untitled-1",
        Range::new(Position::new(0, 0), Position::new(0, 3)),
    );
    let service = StubService::new(project.root()).with_definition("Foo", untitled);
    let grammar = TypeScriptGrammar;
    let mut sources = SourceCache::new();

    let types = RelevantTypeResolver::new(&grammar, &service, &mut sources)
        .resolve(&hole)
        .await
        .unwrap();

    assert!(!types.contains("Foo"));
    assert_eq!(types.get("Bar").unwrap().declaration_text, "type Bar = number");
}

#[tokio::test]
async fn test_symbol_range_inside_multibyte_character_is_skipped() {
    let project = Project::new();
    project.write("prelude.ts", "type Bar = number;\n");
    project.write("strings.ts", "const s = \"éé\";\n");
    let hole = hole_in(&project, "hole.ts", "declare function _(): [Foo, Bar]");
    let strings = project.uri("strings.ts");
    let symbol = SymbolInfo {
        name: "s".to_string(),
        kind: "Constant".to_string(),
        // byte 12 falls inside the first `é`
        location: Location::new(
            strings.as_str(),
            Range::new(Position::new(0, 0), Position::new(0, 12)),
        ),
    };
    let service = StubService::new(project.root())
        .with_definition(
            "Foo",
            Location::new(
                strings.as_str(),
                Range::new(Position::new(0, 0), Position::new(0, 5)),
            ),
        )
        .with_symbols(&strings, vec![symbol]);
    let grammar = TypeScriptGrammar;
    let mut sources = SourceCache::new();

    let types = RelevantTypeResolver::new(&grammar, &service, &mut sources)
        .resolve(&hole)
        .await
        .unwrap();

    let identifiers: Vec<&str> = types.identifiers().collect();
    assert_eq!(identifiers, vec!["Bar"]);
}

#[tokio::test]
async fn test_extract_context_end_to_end() {
    let project = Project::new();
    project.write("prelude.ts", PRELUDE);
    let sketch = project.write("sketch.ts", SKETCH);
    let service =
        StubService::new(project.root()).with_hover("_", "function _<Model>(): Model");

    let result = extract_context(
        &TypeScriptDriver::new(),
        &service,
        &sketch,
        &ExtractionOptions::new(project.root()),
    )
    .await
    .unwrap();

    let prelude = project.path("prelude.ts").display().to_string();
    assert_eq!(result.hole, "Model");
    assert_eq!(result.relevant_types.len(), 1);
    assert_eq!(
        result.relevant_types[&prelude],
        vec![
            "type Model = [string, Todo[]];",
            "type Todo = [string, boolean];"
        ]
    );

    let headers = &result.relevant_headers[&prelude];
    assert!(headers.contains(&"const toggle: (index: number, todos: Todo[]) => Todo[];".to_string()));
    assert!(!headers.iter().any(|h| h.contains("isEmpty")));

    let injected = project.uri(INJECTED_SKETCH);
    assert!(service.opened.borrow().contains(&injected));
    assert_eq!(*service.changed.borrow(), vec![(injected.clone(), 2)]);
    assert_eq!(*service.closed.borrow(), vec![injected]);
    assert!(!result
        .relevant_headers
        .contains_key(&project.path(INJECTED_SKETCH).display().to_string()));
}

#[tokio::test]
async fn test_sketch_without_hole_is_an_error() {
    let project = Project::new();
    let sketch = project.write("sketch.ts", "const x: number = 1;\n");
    let service = StubService::new(project.root());

    let error = extract_context(
        &TypeScriptDriver::new(),
        &service,
        &sketch,
        &ExtractionOptions::new(project.root()),
    )
    .await
    .unwrap_err();

    assert!(matches!(error, Error::HoleNotFound { .. }));
}

#[tokio::test]
async fn test_missing_sketch_is_a_file_system_error() {
    let project = Project::new();
    let service = StubService::new(project.root());

    let error = extract_context(
        &TypeScriptDriver::new(),
        &service,
        &project.path("missing.ts"),
        &ExtractionOptions::new(project.root()),
    )
    .await
    .unwrap_err();

    assert!(matches!(error, Error::FileSystem { .. }));
}
