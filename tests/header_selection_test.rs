mod common;

use common::{Project, StubService};
use context_extractor::analyzers::typescript::TypeScriptGrammar;
use context_extractor::core::{RelevantTypeEntry, RelevantTypes};
use context_extractor::extraction::{generate_target_types, RelevantHeaderSelector, SourceCache};
use indexmap::IndexSet;
use indoc::indoc;
use pretty_assertions::assert_eq;

fn todo_types(project: &Project) -> RelevantTypes {
    let prelude = project.path("prelude.ts");
    [
        RelevantTypeEntry::new("Todo", "type Todo = [string, boolean]", prelude.as_path()),
        RelevantTypeEntry::new("Model", "type Model = [string, Todo[]]", prelude.as_path()),
    ]
    .into_iter()
    .collect()
}

async fn select(
    project: &Project,
    service: &StubService,
    hole_type: &str,
    files: &[&str],
) -> Vec<String> {
    let grammar = TypeScriptGrammar;
    let relevant = todo_types(project);
    let targets = generate_target_types(&grammar, hole_type, &relevant);
    let files: Vec<_> = files.iter().map(|name| project.path(name)).collect();
    let mut sources = SourceCache::new();

    RelevantHeaderSelector::new(&grammar, service, &targets, &relevant)
        .select(&mut sources, &files)
        .await
        .unwrap()
        .into_iter()
        .map(|entry| entry.declaration_text)
        .collect()
}

#[tokio::test]
async fn test_header_returning_target_is_selected() {
    let project = Project::new();
    project.write(
        "todos.ts",
        "const toggle: (index: number, todos: Todo[]) => Todo[] = (i, t) => t;\n",
    );
    let service = StubService::new(project.root());

    let headers = select(&project, &service, "Todo[]", &["todos.ts"]).await;

    assert_eq!(
        headers,
        vec!["const toggle: (index: number, todos: Todo[]) => Todo[]"]
    );
}

#[tokio::test]
async fn test_unrelated_header_is_excluded() {
    let project = Project::new();
    project.write(
        "util.ts",
        indoc! {"
            const shout = (s: string): string => s.toUpperCase();
            function count(xs: number[]): number { return xs.length; }
        "},
    );
    let service = StubService::new(project.root());

    let headers = select(&project, &service, "Todo[]", &["util.ts"]).await;

    assert!(headers.is_empty(), "unexpected headers: {headers:?}");
}

#[tokio::test]
async fn test_alias_spelling_does_not_matter() {
    let project = Project::new();
    project.write(
        "todos.ts",
        indoc! {"
            const fresh = (): [string, boolean][] => [];
            function isDone(todo: Todo): boolean { return todo[1]; }
        "},
    );
    let service = StubService::new(project.root());

    let headers = select(&project, &service, "Model", &["todos.ts"]).await;

    // `Model` unwraps to its `Todo[]` element, which `fresh` returns
    assert_eq!(headers, vec!["const fresh: () => [string, boolean][]"]);
}

#[tokio::test]
async fn test_unannotated_declaration_uses_hover() {
    let project = Project::new();
    project.write("todos.ts", "const empty = makeEmpty();\n");
    let service = StubService::new(project.root()).with_hover("empty", "const empty: Todo[]");

    let headers = select(&project, &service, "Todo[]", &["todos.ts"]).await;

    assert_eq!(headers, vec!["const empty: Todo[]"]);
    assert_eq!(*service.hover_queries.borrow(), vec!["empty".to_string()]);
}

#[tokio::test]
async fn test_empty_source_set_selects_nothing() {
    let project = Project::new();
    let service = StubService::new(project.root());

    let headers = select(&project, &service, "Todo[]", &[]).await;

    assert!(headers.is_empty());
}

#[tokio::test]
async fn test_duplicate_files_yield_one_header() {
    let project = Project::new();
    project.write("todos.ts", "const all: Todo[] = [];\n");
    let service = StubService::new(project.root());

    let headers = select(&project, &service, "Todo[]", &["todos.ts", "todos.ts"]).await;

    assert_eq!(headers, vec!["const all: Todo[]"]);
    let unique: IndexSet<_> = headers.iter().collect();
    assert_eq!(unique.len(), headers.len());
}
