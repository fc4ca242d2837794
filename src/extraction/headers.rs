//! Relevant-header selection.
//!
//! A top-level declaration is relevant when its subject type, or any
//! return type or tuple element reachable from it, is equivalent to one
//! of the target types.

use super::cache::{AnalysisCache, SourceCache};
use super::normalize::Normalizer;
use crate::analyzers::{TopLevelDeclaration, TypeGrammar};
use crate::core::{Position, RelevantHeaderEntry, RelevantTypes, Result};
use crate::lsp::{path_to_uri, LanguageService};
use crate::observability::{increment_processed, set_current_file, set_progress};
use indexmap::IndexSet;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct RelevantHeaderSelector<'a, G: TypeGrammar + ?Sized, S: LanguageService + ?Sized> {
    grammar: &'a G,
    service: &'a S,
    normalizer: Normalizer<'a, G>,
    analyses: AnalysisCache,
    targets: HashSet<String>,
    seen: HashSet<(String, PathBuf, Position)>,
}

impl<'a, G, S> RelevantHeaderSelector<'a, G, S>
where
    G: TypeGrammar + ?Sized,
    S: LanguageService + ?Sized,
{
    pub fn new(
        grammar: &'a G,
        service: &'a S,
        target_types: &IndexSet<String>,
        relevant: &RelevantTypes,
    ) -> Self {
        let mut normalizer = Normalizer::new(grammar, relevant);
        let targets = target_types
            .iter()
            .map(|target| normalizer.normalize(target))
            .collect();
        Self {
            grammar,
            service,
            normalizer,
            analyses: AnalysisCache::default(),
            targets,
            seen: HashSet::new(),
        }
    }

    /// Scan `files` and return the relevant headers in discovery order.
    pub async fn select(
        &mut self,
        sources: &mut SourceCache,
        files: &[PathBuf],
    ) -> Result<IndexSet<RelevantHeaderEntry>> {
        let mut headers = IndexSet::new();
        set_progress(0, files.len());
        for file in files {
            let _file = set_current_file(file.as_path());
            let source = sources.read(file)?;
            let uri = path_to_uri(file)?;
            for declaration in self.grammar.top_level_declarations(&source) {
                let key = (declaration.header.clone(), file.clone(), declaration.start);
                if !self.seen.insert(key) {
                    continue;
                }
                let Some((subject, header)) = self.subject(&uri, &declaration).await else {
                    continue;
                };
                if self.matches(file, &subject) {
                    debug!(header = %header, file = %file.display(), "Relevant header");
                    headers.insert(RelevantHeaderEntry::new(header, file.as_path()));
                }
            }
            increment_processed();
        }
        Ok(headers)
    }

    /// Subject type and header text, asking the language service when the
    /// source does not spell the type out.
    async fn subject(
        &self,
        uri: &str,
        declaration: &TopLevelDeclaration,
    ) -> Option<(String, String)> {
        if let Some(subject) = &declaration.subject_type {
            return Some((subject.clone(), declaration.header.clone()));
        }
        let hover = match self.service.hover(uri, declaration.name_position).await {
            Ok(hover) => hover?,
            Err(e) => {
                warn!(name = %declaration.name, error = %e, "Hover failed, skipping declaration");
                return None;
            }
        };
        let subject = self.grammar.type_from_hover(&hover)?;
        let header = self.grammar.header_with_type(declaration, &subject);
        Some((subject, header))
    }

    fn matches(&mut self, file: &Path, span: &str) -> bool {
        let grammar = self.grammar;
        let analysis = self
            .analyses
            .get_or_insert_with(file, span, |s| grammar.analyze(s))
            .clone();
        if self.targets.contains(&self.normalizer.normalize(&analysis.text)) {
            return true;
        }
        analysis
            .decomposition()
            .into_iter()
            .any(|part| self.matches(file, &part.text))
    }
}
