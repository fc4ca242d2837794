//! TypeScript driver.
//!
//! The hole is the first `_()` call in the sketch. To read its type, the
//! sketch is copied into an in-memory `injected_sketch.ts` whose first
//! line declares `_` as generic in its return type; the language service
//! then reports the inferred instantiation on hover. The declaration is
//! rewritten to the concrete type and becomes the seed of the type
//! traversal.

use super::{open_directory, LanguageDriver};
use crate::analyzers::lexer::line_column;
use crate::analyzers::typescript::TypeScriptGrammar;
use crate::core::{Error, HoleContext, Language, Position, Result};
use crate::extraction::SourceCache;
use crate::lsp::{path_to_uri, LanguageService};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const INJECTED_SKETCH: &str = "injected_sketch.ts";
pub const HOLE_IDENTIFIER: &str = "_()";

const GENERIC_HOLE_DECLARATION: &str = "declare function _<T>(): T";

static HOLE_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"_\(\)").expect("valid regex"));

static HOLE_HOVER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(function _)(<.+>)(\(\): )(.+)").expect("valid regex"));

#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptDriver {
    grammar: TypeScriptGrammar,
}

impl TypeScriptDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

fn injected_path(sketch: &Path) -> PathBuf {
    sketch.with_file_name(INJECTED_SKETCH)
}

/// Position of the first `_()` in `source`.
pub fn find_hole(source: &str) -> Option<Position> {
    let found = HOLE_CALL.find(source)?;
    let (line, column) = line_column(source, found.start());
    Some(Position::new(line as u32, column as u32))
}

/// Hole type from hover text like `function _<T>(): T`.
pub fn hole_type_from_hover(hover: &str) -> Option<String> {
    HOLE_HOVER
        .captures(hover)
        .and_then(|captures| captures.get(4))
        .map(|m| m.as_str().trim().to_string())
        .filter(|ty| !ty.is_empty())
}

impl LanguageDriver for TypeScriptDriver {
    type Grammar = TypeScriptGrammar;

    fn grammar(&self) -> &TypeScriptGrammar {
        &self.grammar
    }

    fn generated_documents(&self, sketch: &Path) -> Vec<PathBuf> {
        vec![injected_path(sketch)]
    }

    async fn get_hole_context<S: LanguageService>(
        &self,
        service: &S,
        sketch: &Path,
        sources: &mut SourceCache,
    ) -> Result<HoleContext> {
        let contents = sources.read(sketch)?;
        let injected = format!("{GENERIC_HOLE_DECLARATION}\n{contents}");
        let hole_position = find_hole(&injected)
            .ok_or_else(|| Error::hole_not_found(sketch, "no `_()` hole in sketch"))?;

        let injected_path = injected_path(sketch);
        let injected_uri = path_to_uri(&injected_path)?;
        let dir = sketch
            .parent()
            .ok_or_else(|| Error::file_system("sketch has no parent directory", sketch))?;

        open_directory(
            service,
            dir,
            Language::TypeScript,
            std::slice::from_ref(&injected_path),
            sources,
        )
        .await?;
        service
            .did_open(&injected_uri, Language::TypeScript.language_id(), &injected)
            .await?;

        let hover_text = service
            .hover(&injected_uri, hole_position)
            .await?
            .ok_or_else(|| Error::language_service("textDocument/hover", "no type at the hole"))?;
        let hole_type = hole_type_from_hover(&hover_text).ok_or_else(|| {
            Error::language_service(
                "textDocument/hover",
                format!("unexpected hover text at the hole: {hover_text}"),
            )
        })?;
        info!(hole_type = %hole_type, "Found TypeScript hole");

        let declaration_text = format!("declare function _(): {hole_type}");
        let rewritten = format!("{declaration_text}\n{contents}");
        service.did_change(&injected_uri, 2, &rewritten).await?;
        sources.insert(injected_path, rewritten);
        debug!(declaration = %declaration_text, "Rewrote hole declaration");

        Ok(HoleContext {
            hole_type,
            identifier: HOLE_IDENTIFIER.to_string(),
            declaration_text,
            declaration_start: Position::new(0, 0),
            source_uri: injected_uri,
            hole_position,
            hover_text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_hole_skips_generic_declaration() {
        let injected = "declare function _<T>(): T\nconst update = (m: Model): Model => _();\n";
        assert_eq!(find_hole(injected), Some(Position::new(1, 36)));
        assert_eq!(find_hole("const x = 1;"), None);
    }

    #[test]
    fn test_hole_type_from_hover() {
        assert_eq!(
            hole_type_from_hover(
                "function _<(model: Model, action: Action) => Model>(): (model: Model, action: Action) => Model"
            )
            .as_deref(),
            Some("(model: Model, action: Action) => Model")
        );
        assert_eq!(
            hole_type_from_hover("function _<Todo[]>(): Todo[]").as_deref(),
            Some("Todo[]")
        );
        assert_eq!(hole_type_from_hover("const x: number"), None);
    }

    #[test]
    fn test_injected_document_sits_next_to_sketch() {
        let driver = TypeScriptDriver::new();
        assert_eq!(
            driver.generated_documents(Path::new("/p/todo/sketch.ts")),
            vec![PathBuf::from("/p/todo/injected_sketch.ts")]
        );
        assert_eq!(driver.language(), Language::TypeScript);
    }
}
