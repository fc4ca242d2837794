//! Data model shared by the extraction algorithms and the drivers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Zero-based position. Columns are byte offsets into the line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Inclusive containment check on both ends.
    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }

    /// Number of lines spanned, used to prefer the widest symbol on a line.
    pub fn line_span(&self) -> u32 {
        self.end.line.saturating_sub(self.start.line)
    }
}

/// A declaration span as reported by the language service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub uri: String,
    pub range: Range,
}

impl Location {
    pub fn new(uri: impl Into<String>, range: Range) -> Self {
        Self {
            uri: uri.into(),
            range,
        }
    }
}

/// One entry of a `documentSymbol` response, flattened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub name: String,
    pub kind: String,
    pub location: Location,
}

/// A type declaration reachable from the hole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevantTypeEntry {
    pub identifier: String,
    pub declaration_text: String,
    pub source_file: PathBuf,
}

impl RelevantTypeEntry {
    pub fn new(
        identifier: impl Into<String>,
        declaration_text: impl Into<String>,
        source_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            declaration_text: declaration_text.into(),
            source_file: source_file.into(),
        }
    }
}

/// Identifier-keyed closure of type declarations, in discovery order.
///
/// At most one entry per identifier: the first declaration inserted wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelevantTypes {
    entries: IndexMap<String, RelevantTypeEntry>,
}

impl RelevantTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    pub fn get(&self, identifier: &str) -> Option<&RelevantTypeEntry> {
        self.entries.get(identifier)
    }

    /// Insert unless the identifier is already known. Returns whether the
    /// entry was inserted.
    pub fn insert_if_absent(&mut self, entry: RelevantTypeEntry) -> bool {
        if self.entries.contains_key(&entry.identifier) {
            return false;
        }
        self.entries.insert(entry.identifier.clone(), entry);
        true
    }

    pub fn remove(&mut self, identifier: &str) -> Option<RelevantTypeEntry> {
        self.entries.shift_remove(identifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RelevantTypeEntry> {
        self.entries.values()
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut RelevantTypeEntry> {
        self.entries.values_mut()
    }
}

impl FromIterator<RelevantTypeEntry> for RelevantTypes {
    fn from_iter<I: IntoIterator<Item = RelevantTypeEntry>>(iter: I) -> Self {
        let mut types = RelevantTypes::new();
        for entry in iter {
            types.insert_if_absent(entry);
        }
        types
    }
}

/// A top-level function or variable judged relevant to the hole.
///
/// Compared by value; the pair has no identity of its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevantHeaderEntry {
    pub declaration_text: String,
    pub source_file: PathBuf,
}

impl RelevantHeaderEntry {
    pub fn new(declaration_text: impl Into<String>, source_file: impl Into<PathBuf>) -> Self {
        Self {
            declaration_text: declaration_text.into(),
            source_file: source_file.into(),
        }
    }
}

/// What the driver learned about the hole before any type traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoleContext {
    /// Inferred type of the hole, e.g. `(m: Model, a: Action) => Model`.
    pub hole_type: String,
    /// Synthetic identifier of the hole declaration, dropped from results.
    pub identifier: String,
    /// Declaration text the relevant-type traversal starts from.
    pub declaration_text: String,
    /// Absolute start of `declaration_text` inside `source_uri`.
    pub declaration_start: Position,
    pub source_uri: String,
    pub hole_position: Position,
    /// Flattened hover text the hole type was read from.
    pub hover_text: String,
}

/// Output of one extraction run, grouped by source file for presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub hole: String,
    pub relevant_types: IndexMap<String, Vec<String>>,
    pub relevant_headers: IndexMap<String, Vec<String>>,
}
