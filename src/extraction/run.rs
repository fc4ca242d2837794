//! One extraction run: hole, relevant types, relevant headers.

use super::cache::SourceCache;
use crate::analyzers::TypeGrammar;
use crate::core::{
    ExtractionResult, HoleContext, RelevantHeaderEntry, RelevantTypes, Result,
};
use crate::drivers::LanguageDriver;
use crate::io::FileWalker;
use crate::lsp::{path_to_uri, LanguageService};
use crate::observability::{set_phase, ExtractionPhase};
use indexmap::{IndexMap, IndexSet};
use std::path::{Path, PathBuf};
use tracing::{debug_span, info, warn, Instrument};

/// Where to look for headers.
#[derive(Debug, Clone)]
pub struct ExtractionOptions {
    pub repo_root: PathBuf,
    pub ignore_patterns: Vec<String>,
    pub include_hidden: bool,
}

impl ExtractionOptions {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            ignore_patterns: Vec::new(),
            include_hidden: true,
        }
    }
}

/// Run the full extraction for `sketch`.
///
/// Per-identifier and per-declaration service failures only shrink the
/// result; a missing hole or an unreadable source file fails the run.
pub async fn extract_context<D, S>(
    driver: &D,
    service: &S,
    sketch: &Path,
    options: &ExtractionOptions,
) -> Result<ExtractionResult>
where
    D: LanguageDriver,
    S: LanguageService,
{
    let mut sources = SourceCache::new();

    let hole = {
        let _phase = set_phase(ExtractionPhase::HoleContext);
        driver
            .get_hole_context(service, sketch, &mut sources)
            .instrument(debug_span!("hole_context"))
            .await?
    };

    let relevant = {
        let _phase = set_phase(ExtractionPhase::RelevantTypes);
        driver
            .extract_relevant_types(service, &hole, &mut sources)
            .instrument(debug_span!("relevant_types"))
            .await?
    };
    info!(count = relevant.len(), "Relevant types resolved");

    let generated = driver.generated_documents(sketch);
    let files = FileWalker::new(options.repo_root.clone())
        .with_languages(vec![driver.language()])
        .with_ignore_patterns(options.ignore_patterns.clone())
        .with_hidden(options.include_hidden)
        .with_excluded(generated.clone())
        .walk()?;

    let headers = driver
        .extract_relevant_headers(service, &hole, &relevant, &files, &mut sources)
        .instrument(debug_span!("relevant_headers", files = files.len()))
        .await?;
    info!(count = headers.len(), "Relevant headers selected");

    for document in generated {
        let uri = path_to_uri(&document)?;
        if let Err(e) = service.did_close(&uri).await {
            warn!(uri = %uri, error = %e, "Failed to close generated document");
        }
    }

    let _phase = set_phase(ExtractionPhase::Output);
    Ok(build_result(
        driver.grammar().statement_terminator(),
        &hole,
        &relevant,
        &headers,
    ))
}

/// Group declarations by source file, re-appending the terminator.
pub fn build_result(
    terminator: &str,
    hole: &HoleContext,
    relevant: &RelevantTypes,
    headers: &IndexSet<RelevantHeaderEntry>,
) -> ExtractionResult {
    let mut relevant_types: IndexMap<String, Vec<String>> = IndexMap::new();
    for entry in relevant.iter() {
        relevant_types
            .entry(entry.source_file.display().to_string())
            .or_default()
            .push(format!("{}{}", entry.declaration_text, terminator));
    }

    let mut relevant_headers: IndexMap<String, Vec<String>> = IndexMap::new();
    for entry in headers {
        relevant_headers
            .entry(entry.source_file.display().to_string())
            .or_default()
            .push(format!("{}{}", entry.declaration_text, terminator));
    }

    ExtractionResult {
        hole: hole.hole_type.clone(),
        relevant_types,
        relevant_headers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Position, RelevantTypeEntry};
    use pretty_assertions::assert_eq;

    fn hole() -> HoleContext {
        HoleContext {
            hole_type: "Todo[]".to_string(),
            identifier: "_()".to_string(),
            declaration_text: "declare function _(): Todo[]".to_string(),
            declaration_start: Position::new(0, 0),
            source_uri: "file:///p/injected_sketch.ts".to_string(),
            hole_position: Position::new(3, 10),
            hover_text: "function _<Todo[]>(): Todo[]".to_string(),
        }
    }

    #[test]
    fn test_build_result_groups_by_file() {
        let relevant: RelevantTypes = [
            RelevantTypeEntry::new("Todo", "type Todo = [string, boolean]", "/p/prelude.ts"),
            RelevantTypeEntry::new("Id", "type Id = number", "/p/ids.ts"),
            RelevantTypeEntry::new("Model", "type Model = [string, Todo[]]", "/p/prelude.ts"),
        ]
        .into_iter()
        .collect();
        let headers: IndexSet<RelevantHeaderEntry> = [RelevantHeaderEntry::new(
            "const toggle: (index: number, todos: Todo[]) => Todo[]",
            "/p/prelude.ts",
        )]
        .into_iter()
        .collect();

        let result = build_result(";", &hole(), &relevant, &headers);

        assert_eq!(result.hole, "Todo[]");
        assert_eq!(
            result.relevant_types.keys().collect::<Vec<_>>(),
            vec!["/p/prelude.ts", "/p/ids.ts"]
        );
        assert_eq!(
            result.relevant_types["/p/prelude.ts"],
            vec![
                "type Todo = [string, boolean];",
                "type Model = [string, Todo[]];"
            ]
        );
        assert_eq!(
            result.relevant_headers["/p/prelude.ts"],
            vec!["const toggle: (index: number, todos: Todo[]) => Todo[];"]
        );
    }

    #[test]
    fn test_empty_result_is_not_an_error() {
        let result = build_result("", &hole(), &RelevantTypes::new(), &IndexSet::new());
        assert!(result.relevant_types.is_empty());
        assert!(result.relevant_headers.is_empty());
    }
}
