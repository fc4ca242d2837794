//! OCaml driver.
//!
//! The hole is the first `_` used as an expression. Its type comes from
//! hover, and the top-level `let` binding around it seeds the type
//! traversal.

use super::{open_directory, LanguageDriver};
use crate::analyzers::ocaml::declarations::{enclosing_binding, find_hole};
use crate::analyzers::ocaml::OcamlGrammar;
use crate::analyzers::TypeGrammar;
use crate::core::{Error, HoleContext, Language, Result};
use crate::extraction::SourceCache;
use crate::lsp::{path_to_uri, LanguageService};
use std::path::Path;
use tracing::info;

pub const HOLE_IDENTIFIER: &str = "_";

#[derive(Debug, Clone, Copy, Default)]
pub struct OcamlDriver {
    grammar: OcamlGrammar,
}

impl OcamlDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LanguageDriver for OcamlDriver {
    type Grammar = OcamlGrammar;

    fn grammar(&self) -> &OcamlGrammar {
        &self.grammar
    }

    async fn get_hole_context<S: LanguageService>(
        &self,
        service: &S,
        sketch: &Path,
        sources: &mut SourceCache,
    ) -> Result<HoleContext> {
        let contents = sources.read(sketch)?;
        let hole_position = find_hole(&contents)
            .ok_or_else(|| Error::hole_not_found(sketch, "no `_` hole expression in sketch"))?;
        let binding = enclosing_binding(&contents, hole_position).ok_or_else(|| {
            Error::hole_not_found(sketch, "hole is not inside a top-level let binding")
        })?;

        let dir = sketch
            .parent()
            .ok_or_else(|| Error::file_system("sketch has no parent directory", sketch))?;
        open_directory(service, dir, Language::OCaml, &[], sources).await?;

        let uri = path_to_uri(sketch)?;
        let hover_text = service
            .hover(&uri, hole_position)
            .await?
            .ok_or_else(|| Error::language_service("textDocument/hover", "no type at the hole"))?;
        let hole_type = self.grammar.type_from_hover(&hover_text).ok_or_else(|| {
            Error::language_service("textDocument/hover", "empty hover text at the hole")
        })?;
        info!(hole_type = %hole_type, "Found OCaml hole");

        Ok(HoleContext {
            hole_type,
            identifier: HOLE_IDENTIFIER.to_string(),
            declaration_text: binding.text,
            declaration_start: binding.start,
            source_uri: uri,
            hole_position,
            hover_text,
        })
    }
}
