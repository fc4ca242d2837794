//! Per-run caches.
//!
//! Every cache here is owned by one extraction run and dropped with it.

use crate::analyzers::TypeAnalysis;
use crate::core::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File contents read during a run, keyed by path.
///
/// In-memory documents (such as an injected sketch) can be registered
/// with [`SourceCache::insert`] so lookups see the edited text.
#[derive(Debug, Default)]
pub struct SourceCache {
    contents: HashMap<PathBuf, Arc<str>>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: impl Into<Arc<str>>) {
        self.contents.insert(path.into(), contents.into());
    }

    /// Contents of `path`, reading the file on first access.
    pub fn read(&mut self, path: &Path) -> Result<Arc<str>> {
        if let Some(contents) = self.contents.get(path) {
            return Ok(Arc::clone(contents));
        }
        let contents: Arc<str> = std::fs::read_to_string(path)
            .map_err(|e| Error::read_failed(path, e))?
            .into();
        self.contents.insert(path.to_path_buf(), Arc::clone(&contents));
        Ok(contents)
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

/// Normal forms keyed by the literal span text.
#[derive(Debug, Default)]
pub struct NormalFormCache {
    forms: HashMap<String, String>,
}

impl NormalFormCache {
    pub fn get(&self, span: &str) -> Option<&str> {
        self.forms.get(span).map(String::as_str)
    }

    pub fn insert(&mut self, span: impl Into<String>, normal_form: impl Into<String>) {
        self.forms.insert(span.into(), normal_form.into());
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

/// Type analyses keyed by source file and span.
#[derive(Debug, Default)]
pub struct AnalysisCache {
    analyses: HashMap<(PathBuf, String), TypeAnalysis>,
}

impl AnalysisCache {
    /// The cached analysis of `span`, computing it with `analyze` on a miss.
    pub fn get_or_insert_with(
        &mut self,
        file: &Path,
        span: &str,
        analyze: impl FnOnce(&str) -> TypeAnalysis,
    ) -> &TypeAnalysis {
        self.analyses
            .entry((file.to_path_buf(), span.to_string()))
            .or_insert_with(|| analyze(span))
    }

    pub fn len(&self) -> usize {
        self.analyses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyses.is_empty()
    }
}
