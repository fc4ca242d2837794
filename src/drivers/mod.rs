//! Language drivers.
//!
//! A driver knows how to find the hole of a sketch in its language and
//! supplies the [`TypeGrammar`] the shared extraction algorithms run on.

pub mod ocaml;
pub mod typescript;

use crate::analyzers::TypeGrammar;
use crate::core::{HoleContext, Language, RelevantHeaderEntry, RelevantTypes, Result};
use crate::extraction::{generate_target_types, RelevantHeaderSelector, RelevantTypeResolver, SourceCache};
use crate::lsp::{path_to_uri, LanguageService};
use crate::observability::{set_phase, ExtractionPhase};
use indexmap::IndexSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub use ocaml::OcamlDriver;
pub use typescript::TypeScriptDriver;

#[allow(async_fn_in_trait)]
pub trait LanguageDriver {
    type Grammar: TypeGrammar;

    fn grammar(&self) -> &Self::Grammar;

    fn language(&self) -> Language {
        self.grammar().language()
    }

    /// Documents the driver synthesizes next to the sketch. They are
    /// never scanned for headers.
    fn generated_documents(&self, _sketch: &Path) -> Vec<PathBuf> {
        Vec::new()
    }

    /// Locate the hole in `sketch` and read its type from the service.
    async fn get_hole_context<S: LanguageService>(
        &self,
        service: &S,
        sketch: &Path,
        sources: &mut SourceCache,
    ) -> Result<HoleContext>;

    async fn extract_relevant_types<S: LanguageService>(
        &self,
        service: &S,
        hole: &HoleContext,
        sources: &mut SourceCache,
    ) -> Result<RelevantTypes> {
        RelevantTypeResolver::new(self.grammar(), service, sources)
            .resolve(hole)
            .await
    }

    async fn extract_relevant_headers<S: LanguageService>(
        &self,
        service: &S,
        hole: &HoleContext,
        relevant: &RelevantTypes,
        files: &[PathBuf],
        sources: &mut SourceCache,
    ) -> Result<IndexSet<RelevantHeaderEntry>> {
        let targets = {
            let _phase = set_phase(ExtractionPhase::TargetTypes);
            generate_target_types(self.grammar(), &hole.hole_type, relevant)
        };
        let _phase = set_phase(ExtractionPhase::RelevantHeaders);
        RelevantHeaderSelector::new(self.grammar(), service, &targets, relevant)
            .select(sources, files)
            .await
    }
}

/// Open every file of `language` in `dir` (not recursive), except `skip`.
///
/// Failures on individual files are logged; the service may still answer
/// queries for files it discovers on its own.
pub(crate) async fn open_directory<S: LanguageService>(
    service: &S,
    dir: &Path,
    language: Language,
    skip: &[PathBuf],
    sources: &mut SourceCache,
) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| crate::core::Error::read_failed(dir, e))?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && Language::from_path(path) == Some(language))
        .filter(|path| !skip.contains(path))
        .collect();
    paths.sort();

    for path in paths {
        let contents = sources.read(&path)?;
        let uri = path_to_uri(&path)?;
        if let Err(e) = service.did_open(&uri, language.language_id(), &contents).await {
            warn!(file = %path.display(), error = %e, "Failed to open document");
            continue;
        }
        debug!(file = %path.display(), "Opened document");
    }
    Ok(())
}
