//! Relevant-type resolution.
//!
//! Starting from the hole's declaration, every type-position identifier is
//! sent to the language service's type-definition query, the enclosing
//! declaration is read from the target file, and the walk recurses into
//! it. Identifiers already resolved are never queried again, which bounds
//! the walk by the number of distinct type names.

use super::cache::SourceCache;
use crate::analyzers::lexer::offset_of;
use crate::analyzers::{strip_terminator, DeclarationSpan, TypeGrammar};
use crate::core::{HoleContext, Location, RelevantTypeEntry, RelevantTypes, Result, SymbolInfo};
use crate::lsp::{uri_to_path, LanguageService};
use crate::observability::set_current_identifier;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, warn};

pub struct RelevantTypeResolver<'a, G: TypeGrammar + ?Sized, S: LanguageService + ?Sized> {
    grammar: &'a G,
    service: &'a S,
    sources: &'a mut SourceCache,
    symbols: HashMap<String, Vec<SymbolInfo>>,
    types: RelevantTypes,
}

impl<'a, G, S> RelevantTypeResolver<'a, G, S>
where
    G: TypeGrammar + ?Sized,
    S: LanguageService + ?Sized,
{
    pub fn new(grammar: &'a G, service: &'a S, sources: &'a mut SourceCache) -> Self {
        Self {
            grammar,
            service,
            sources,
            symbols: HashMap::new(),
            types: RelevantTypes::new(),
        }
    }

    /// Resolve every type reachable from the hole declaration.
    ///
    /// The hole's own entry is dropped from the result and stored
    /// declarations lose their trailing statement terminator.
    pub async fn resolve(mut self, hole: &HoleContext) -> Result<RelevantTypes> {
        let file = uri_to_path(&hole.source_uri)?;
        let declaration = DeclarationSpan {
            text: hole.declaration_text.clone(),
            start: hole.declaration_start,
        };
        self.visit(declaration, hole.identifier.clone(), hole.source_uri.clone(), file)
            .await?;

        let mut types = self.types;
        types.remove(&hole.identifier);
        types.remove("");
        let terminator = self.grammar.statement_terminator();
        for entry in types.values_mut() {
            let stripped = strip_terminator(&entry.declaration_text, terminator);
            if stripped.len() != entry.declaration_text.len() {
                entry.declaration_text = stripped.to_string();
            }
        }
        debug!(count = types.len(), "Resolved relevant types");
        Ok(types)
    }

    async fn visit(
        &mut self,
        declaration: DeclarationSpan,
        identifier: String,
        uri: String,
        file: PathBuf,
    ) -> Result<()> {
        if self.types.contains(&identifier) {
            return Ok(());
        }
        let identifiers = self.grammar.extract_identifiers(&declaration.text);
        self.types.insert_if_absent(RelevantTypeEntry::new(
            identifier.as_str(),
            declaration.text.as_str(),
            file,
        ));

        for candidate in identifiers {
            if self.types.contains(&candidate.name) {
                continue;
            }
            let _identifier = set_current_identifier(candidate.name.as_str());
            let position = candidate.absolute_position(declaration.start);
            let locations = match self.service.type_definition(&uri, position).await {
                Ok(locations) => locations,
                Err(e) => {
                    warn!(identifier = %candidate.name, error = %e, "Type definition query failed, skipping");
                    continue;
                }
            };
            let Some(location) = locations.into_iter().next() else {
                debug!(identifier = %candidate.name, "No type definition");
                continue;
            };
            let (target, target_file) = match self.locate_declaration(&location).await {
                Ok(Some(found)) => found,
                Ok(None) => {
                    debug!(identifier = %candidate.name, uri = %location.uri, "No enclosing type declaration");
                    continue;
                }
                Err(e) => {
                    warn!(identifier = %candidate.name, uri = %location.uri, error = %e, "Unreadable type definition, skipping");
                    continue;
                }
            };
            let Some(name) = self.grammar.declaration_name(&target.text) else {
                continue;
            };
            Box::pin(self.visit(target, name, location.uri, target_file)).await?;
        }
        Ok(())
    }

    /// The type declaration around `location`, found structurally and
    /// falling back to the document symbol starting on the same line.
    async fn locate_declaration(
        &mut self,
        location: &Location,
    ) -> Result<Option<(DeclarationSpan, PathBuf)>> {
        let file = uri_to_path(&location.uri)?;
        let source = self.sources.read(&file)?;

        if let Some(span) = self
            .grammar
            .find_enclosing_declaration(&source, location.range.start)
        {
            return Ok(Some((span, file)));
        }

        let Some(symbol) = self.symbol_on_line(&location.uri, location.range.start.line).await else {
            return Ok(None);
        };
        let range = symbol.location.range;
        let start = offset_of(&source, range.start.line as usize, range.start.character as usize);
        let end = offset_of(&source, range.end.line as usize, range.end.character as usize);
        let text = match (start, end) {
            (Some(start), Some(end)) if start < end => source.get(start..end),
            _ => None,
        };
        let Some(text) = text else {
            return Ok(None);
        };
        let span = DeclarationSpan {
            text: text.to_string(),
            start: range.start,
        };
        if self.grammar.declaration_name(&span.text).is_none() {
            return Ok(None);
        }
        Ok(Some((span, file)))
    }

    /// Widest symbol starting on `line`.
    async fn symbol_on_line(&mut self, uri: &str, line: u32) -> Option<SymbolInfo> {
        if !self.symbols.contains_key(uri) {
            let symbols = match self.service.document_symbols(uri).await {
                Ok(symbols) => symbols,
                Err(e) => {
                    warn!(uri, error = %e, "Document symbol query failed");
                    Vec::new()
                }
            };
            self.symbols.insert(uri.to_string(), symbols);
        }
        self.symbols
            .get(uri)?
            .iter()
            .filter(|s| s.location.range.start.line == line)
            .max_by_key(|s| s.location.range.line_span())
            .cloned()
    }
}
