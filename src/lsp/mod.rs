//! Language-service collaborator.
//!
//! The extraction algorithms only see [`LanguageService`]; [`client::LspClient`]
//! implements it over a language server's stdio.

pub mod client;
pub mod encoding;
pub mod transport;

use crate::core::{Error, Location, Position, Range, Result, SymbolInfo};
use lsp_types::Url;
use std::path::{Path, PathBuf};

pub use client::{spawn, LspClient, StdioLspClient};
pub use encoding::PositionEncoding;

/// Queries the extraction needs from a language service.
///
/// Positions are zero-based with byte columns, in both directions.
/// Every call may suspend; callers issue them one at a time.
#[allow(async_fn_in_trait)]
pub trait LanguageService {
    /// Hover text at `position`, flattened to a single line.
    async fn hover(&self, uri: &str, position: Position) -> Result<Option<String>>;

    async fn type_definition(&self, uri: &str, position: Position) -> Result<Vec<Location>>;

    async fn document_symbols(&self, uri: &str) -> Result<Vec<SymbolInfo>>;

    async fn did_open(&self, uri: &str, language_id: &str, text: &str) -> Result<()>;

    async fn did_change(&self, uri: &str, version: i32, text: &str) -> Result<()>;

    async fn did_close(&self, uri: &str) -> Result<()>;
}

pub fn path_to_uri(path: &Path) -> Result<String> {
    Url::from_file_path(path)
        .map(|url| url.to_string())
        .map_err(|()| Error::file_system("path is not absolute", path))
}

pub fn uri_to_path(uri: &str) -> Result<PathBuf> {
    let url = Url::parse(uri).map_err(|e| Error::Protocol(format!("invalid uri {uri}: {e}")))?;
    url.to_file_path()
        .map_err(|()| Error::Protocol(format!("not a file uri: {uri}")))
}

/// Collapse hover markup into one line: code fences and blank lines are
/// dropped and the remaining lines joined with single spaces.
pub fn flatten_hover(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("```"))
        .collect::<Vec<_>>()
        .join(" ")
}

impl From<lsp_types::Position> for Position {
    fn from(position: lsp_types::Position) -> Self {
        Position::new(position.line, position.character)
    }
}

impl From<Position> for lsp_types::Position {
    fn from(position: Position) -> Self {
        lsp_types::Position::new(position.line, position.character)
    }
}

impl From<lsp_types::Range> for Range {
    fn from(range: lsp_types::Range) -> Self {
        Range::new(range.start.into(), range.end.into())
    }
}

impl From<lsp_types::Location> for Location {
    fn from(location: lsp_types::Location) -> Self {
        Location::new(location.uri.to_string(), location.range.into())
    }
}
