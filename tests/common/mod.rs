// Shared fixtures for context-extractor integration tests
#![allow(dead_code)]

use context_extractor::core::{Error, Location, Position, Range, Result, SymbolInfo};
use context_extractor::lsp::{path_to_uri, uri_to_path, LanguageService};
use regex::Regex;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway project directory.
pub struct Project {
    dir: TempDir,
    root: PathBuf,
}

impl Project {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let root = dir.path().canonicalize().expect("canonical temp dir");
        Self { dir, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(&path, contents).expect("write fixture");
        path
    }

    pub fn uri(&self, name: &str) -> String {
        path_to_uri(&self.path(name)).expect("absolute fixture path")
    }
}

/// In-process language service.
///
/// Type definitions are answered by looking up the word under the cursor
/// among the `type`/`interface`/`class` declarations of the project's
/// files. Hovers are answered from a word-keyed table.
#[derive(Default)]
pub struct StubService {
    root: PathBuf,
    hovers: HashMap<String, String>,
    failing: HashSet<String>,
    definitions: HashMap<String, Location>,
    symbols: HashMap<String, Vec<SymbolInfo>>,
    documents: RefCell<HashMap<String, String>>,
    pub definition_queries: RefCell<Vec<String>>,
    pub hover_queries: RefCell<Vec<String>>,
    pub opened: RefCell<Vec<String>>,
    pub changed: RefCell<Vec<(String, i32)>>,
    pub closed: RefCell<Vec<String>>,
}

impl StubService {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            ..Self::default()
        }
    }

    pub fn with_hover(mut self, word: &str, text: &str) -> Self {
        self.hovers.insert(word.to_string(), text.to_string());
        self
    }

    /// Make type-definition queries for `word` fail.
    pub fn failing_definition(mut self, word: &str) -> Self {
        self.failing.insert(word.to_string());
        self
    }

    /// Answer type-definition queries for `word` with `location`.
    pub fn with_definition(mut self, word: &str, location: Location) -> Self {
        self.definitions.insert(word.to_string(), location);
        self
    }

    pub fn with_symbols(mut self, uri: &str, symbols: Vec<SymbolInfo>) -> Self {
        self.symbols.insert(uri.to_string(), symbols);
        self
    }

    pub fn queries_for(&self, word: &str) -> usize {
        self.definition_queries
            .borrow()
            .iter()
            .filter(|w| *w == word)
            .count()
    }

    fn text(&self, uri: &str) -> Result<String> {
        if let Some(text) = self.documents.borrow().get(uri) {
            return Ok(text.clone());
        }
        let path = uri_to_path(uri)?;
        fs::read_to_string(&path).map_err(|e| Error::read_failed(&path, e))
    }

    fn word_at(&self, uri: &str, position: Position) -> Result<String> {
        let text = self.text(uri)?;
        let line = text.lines().nth(position.line as usize).unwrap_or("");
        let chars: Vec<char> = line.chars().collect();
        let is_word = |c: &char| c.is_alphanumeric() || *c == '_';
        let at = (position.character as usize).min(chars.len());
        let start = chars[..at]
            .iter()
            .rposition(|c| !is_word(c))
            .map_or(0, |i| i + 1);
        let end = chars[at..]
            .iter()
            .position(|c| !is_word(c))
            .map_or(chars.len(), |i| at + i);
        Ok(chars[start..end].iter().collect())
    }

    fn definition_of(&self, word: &str) -> Option<Location> {
        let pattern = Regex::new(&format!(
            r"(?m)^(?:export\s+)?(?:declare\s+)?(?:type|interface|class|and)\s+(?:'\w+\s+)?({})\b",
            regex::escape(word)
        ))
        .ok()?;
        let mut files: Vec<PathBuf> = fs::read_dir(&self.root)
            .ok()?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        files.iter().find_map(|path| {
            let text = fs::read_to_string(path).ok()?;
            let name = pattern.captures(&text)?.get(1)?;
            let before = &text[..name.start()];
            let line = before.matches('\n').count() as u32;
            let column = before.rfind('\n').map_or(before.len(), |i| before.len() - i - 1) as u32;
            let start = Position::new(line, column);
            let end = Position::new(line, column + word.len() as u32);
            Some(Location::new(
                path_to_uri(path).ok()?,
                Range { start, end },
            ))
        })
    }
}

impl LanguageService for StubService {
    async fn hover(&self, uri: &str, position: Position) -> Result<Option<String>> {
        let word = self.word_at(uri, position)?;
        self.hover_queries.borrow_mut().push(word.clone());
        Ok(self.hovers.get(&word).cloned())
    }

    async fn type_definition(&self, uri: &str, position: Position) -> Result<Vec<Location>> {
        let word = self.word_at(uri, position)?;
        self.definition_queries.borrow_mut().push(word.clone());
        if self.failing.contains(&word) {
            return Err(Error::language_service(
                "textDocument/typeDefinition",
                format!("no definition for {word}"),
            ));
        }
        if let Some(location) = self.definitions.get(&word) {
            return Ok(vec![location.clone()]);
        }
        Ok(self.definition_of(&word).into_iter().collect())
    }

    async fn document_symbols(&self, uri: &str) -> Result<Vec<SymbolInfo>> {
        Ok(self.symbols.get(uri).cloned().unwrap_or_default())
    }

    async fn did_open(&self, uri: &str, _language_id: &str, text: &str) -> Result<()> {
        self.opened.borrow_mut().push(uri.to_string());
        self.documents
            .borrow_mut()
            .insert(uri.to_string(), text.to_string());
        Ok(())
    }

    async fn did_change(&self, uri: &str, version: i32, text: &str) -> Result<()> {
        self.changed.borrow_mut().push((uri.to_string(), version));
        self.documents
            .borrow_mut()
            .insert(uri.to_string(), text.to_string());
        Ok(())
    }

    async fn did_close(&self, uri: &str) -> Result<()> {
        self.closed.borrow_mut().push(uri.to_string());
        self.documents.borrow_mut().remove(uri);
        Ok(())
    }
}
