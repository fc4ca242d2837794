//! JSON-RPC client for a language server.
//!
//! Requests are issued one at a time. While waiting for a response the
//! client answers server-to-client requests with `null` and drops
//! notifications. Columns are converted to and from the encoding the
//! server settled on during `initialize`.

use super::encoding::PositionEncoding;
use super::transport::{read_message, write_message};
use super::{flatten_hover, uri_to_path, LanguageService};
use crate::core::{Error, Location, Position, Result, SymbolInfo};
use lsp_types::notification::{
    DidChangeTextDocument, DidCloseTextDocument, DidOpenTextDocument, Exit, Initialized,
    Notification,
};
use lsp_types::request::{
    DocumentSymbolRequest, GotoTypeDefinition, GotoTypeDefinitionResponse, HoverRequest,
    Initialize, Request, Shutdown,
};
use lsp_types::{
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DocumentSymbol, DocumentSymbolParams, DocumentSymbolResponse, GotoDefinitionParams, Hover,
    HoverContents, HoverParams, MarkedString, TextDocumentContentChangeEvent,
    TextDocumentIdentifier, TextDocumentItem, TextDocumentPositionParams, Url,
    VersionedTextDocumentIdentifier,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, trace};

pub struct LspClient<R, W> {
    reader: Mutex<BufReader<R>>,
    writer: Mutex<W>,
    next_id: AtomicI64,
    encoding: OnceLock<PositionEncoding>,
    documents: Mutex<HashMap<String, Arc<str>>>,
}

pub type StdioLspClient = LspClient<ChildStdout, ChildStdin>;

/// Start `command` (program and whitespace-separated arguments) in `root`
/// and connect to its stdio. The child is killed when dropped.
pub fn spawn(command: &str, root: &Path) -> Result<(StdioLspClient, Child)> {
    let mut parts = command.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| Error::Configuration("empty language server command".to_string()))?;

    let mut child = Command::new(program)
        .args(parts)
        .current_dir(root)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::language_service("spawn", format!("failed to start `{command}`: {e}")))?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| Error::language_service("spawn", "server stdin unavailable"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| Error::language_service("spawn", "server stdout unavailable"))?;

    debug!(command, root = %root.display(), "Started language server");
    Ok((LspClient::new(stdout, stdin), child))
}

fn text_document(uri: &str) -> Result<TextDocumentIdentifier> {
    Ok(TextDocumentIdentifier::new(parse_uri(uri)?))
}

fn parse_uri(uri: &str) -> Result<Url> {
    Url::parse(uri).map_err(|e| Error::Protocol(format!("invalid uri {uri}: {e}")))
}

fn position_params(uri: &str, position: Position) -> Result<TextDocumentPositionParams> {
    Ok(TextDocumentPositionParams::new(
        text_document(uri)?,
        position.into(),
    ))
}

fn hover_text(hover: Hover) -> String {
    let marked = |m: MarkedString| match m {
        MarkedString::String(s) => s,
        MarkedString::LanguageString(ls) => ls.value,
    };
    let raw = match hover.contents {
        HoverContents::Scalar(m) => marked(m),
        HoverContents::Array(items) => items.into_iter().map(marked).collect::<Vec<_>>().join("\n"),
        HoverContents::Markup(content) => content.value,
    };
    flatten_hover(&raw)
}

fn definition_locations(response: GotoTypeDefinitionResponse) -> Vec<Location> {
    match response {
        GotoTypeDefinitionResponse::Scalar(location) => vec![location.into()],
        GotoTypeDefinitionResponse::Array(locations) => {
            locations.into_iter().map(Location::from).collect()
        }
        GotoTypeDefinitionResponse::Link(links) => links
            .into_iter()
            .map(|link| Location::new(link.target_uri.to_string(), link.target_range.into()))
            .collect(),
    }
}

fn flatten_symbols(uri: &str, symbols: Vec<DocumentSymbol>, out: &mut Vec<SymbolInfo>) {
    for symbol in symbols {
        out.push(SymbolInfo {
            name: symbol.name,
            kind: format!("{:?}", symbol.kind),
            location: Location::new(uri, symbol.range.into()),
        });
        if let Some(children) = symbol.children {
            flatten_symbols(uri, children, out);
        }
    }
}

impl<R, W> LspClient<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: Mutex::new(BufReader::new(reader)),
            writer: Mutex::new(writer),
            next_id: AtomicI64::new(1),
            encoding: OnceLock::new(),
            documents: Mutex::new(HashMap::new()),
        }
    }

    /// Encoding agreed in `initialize`, the protocol default before that.
    pub fn position_encoding(&self) -> PositionEncoding {
        self.encoding.get().copied().unwrap_or_default()
    }

    /// Text the server sees for `uri`: the synced copy, else the file on disk.
    async fn document_text(&self, uri: &str) -> Option<Arc<str>> {
        let mut documents = self.documents.lock().await;
        if let Some(text) = documents.get(uri) {
            return Some(Arc::clone(text));
        }
        let path = uri_to_path(uri).ok()?;
        let text: Arc<str> = std::fs::read_to_string(&path).ok()?.into();
        documents.insert(uri.to_string(), Arc::clone(&text));
        Some(text)
    }

    async fn encode_position(&self, uri: &str, position: Position) -> Position {
        let encoding = self.position_encoding();
        if encoding == PositionEncoding::Utf8 {
            return position;
        }
        match self.document_text(uri).await {
            Some(text) => encoding.encode(&text, position),
            None => position,
        }
    }

    async fn decode_location(&self, location: Location) -> Location {
        let encoding = self.position_encoding();
        if encoding == PositionEncoding::Utf8 {
            return location;
        }
        match self.document_text(&location.uri).await {
            Some(text) => {
                let range = encoding.decode_range(&text, location.range);
                Location { range, ..location }
            }
            None => location,
        }
    }

    async fn send(&self, message: Value) -> Result<()> {
        let mut writer = self.writer.lock().await;
        write_message(&mut *writer, &message).await
    }

    pub async fn notify<P: Serialize>(&self, method: &str, params: P) -> Result<()> {
        trace!(method, "Sending notification");
        self.send(json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": serde_json::to_value(params)?,
        }))
        .await
    }

    /// Send a request and wait for the response carrying its id.
    pub async fn request<P: Serialize>(&self, method: &str, params: P) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        trace!(method, id, "Sending request");
        self.send(json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": serde_json::to_value(params)?,
        }))
        .await?;

        let mut reader = self.reader.lock().await;
        loop {
            let Some(message) = read_message(&mut *reader).await? else {
                return Err(Error::language_service(method, "server closed the connection"));
            };

            if message.get("method").is_some() {
                // server-to-client request
                if let Some(request_id) = message.get("id") {
                    self.send(json!({"jsonrpc": "2.0", "id": request_id, "result": null}))
                        .await?;
                }
                continue;
            }

            if message.get("id").and_then(Value::as_i64) != Some(id) {
                debug!(method, "Dropping response to another request");
                continue;
            }

            if let Some(error) = message.get("error") {
                let text = error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error");
                return Err(Error::language_service(method, text));
            }
            return Ok(message.get("result").cloned().unwrap_or(Value::Null));
        }
    }

    /// `initialize` handshake rooted at `root`.
    pub async fn initialize(&self, root: &Path) -> Result<Value> {
        let root_uri = super::path_to_uri(root)?;
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let params = json!({
            "processId": std::process::id(),
            "rootUri": root_uri,
            "capabilities": {
                "general": {
                    "positionEncodings": [
                        PositionEncoding::Utf8.as_str(),
                        PositionEncoding::Utf16.as_str(),
                    ],
                },
                "textDocument": {
                    "hover": { "contentFormat": ["markdown", "plaintext"] },
                    "typeDefinition": { "linkSupport": true },
                    "documentSymbol": { "hierarchicalDocumentSymbolSupport": true },
                },
            },
            "workspaceFolders": [{ "uri": root_uri, "name": name }],
        });
        let result = self.request(Initialize::METHOD, params).await?;
        let encoding = PositionEncoding::from_initialize_result(&result);
        if self.encoding.set(encoding).is_err() {
            return Err(Error::Protocol("initialize sent twice".to_string()));
        }
        self.notify(Initialized::METHOD, json!({})).await?;
        debug!(root = %root.display(), encoding = encoding.as_str(), "Language server initialized");
        Ok(result)
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.request(Shutdown::METHOD, Value::Null).await?;
        self.notify(Exit::METHOD, Value::Null).await
    }
}

impl<R, W> LanguageService for LspClient<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    async fn hover(&self, uri: &str, position: Position) -> Result<Option<String>> {
        let position = self.encode_position(uri, position).await;
        let params = HoverParams {
            text_document_position_params: position_params(uri, position)?,
            work_done_progress_params: Default::default(),
        };
        let result = self.request(HoverRequest::METHOD, params).await?;
        let hover: Option<Hover> = serde_json::from_value(result)?;
        Ok(hover.map(hover_text).filter(|text| !text.is_empty()))
    }

    async fn type_definition(&self, uri: &str, position: Position) -> Result<Vec<Location>> {
        let position = self.encode_position(uri, position).await;
        let params = GotoDefinitionParams {
            text_document_position_params: position_params(uri, position)?,
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
        };
        let result = self.request(GotoTypeDefinition::METHOD, params).await?;
        let response: Option<GotoTypeDefinitionResponse> = serde_json::from_value(result)?;
        let mut locations = Vec::new();
        for location in response.map(definition_locations).unwrap_or_default() {
            locations.push(self.decode_location(location).await);
        }
        Ok(locations)
    }

    async fn document_symbols(&self, uri: &str) -> Result<Vec<SymbolInfo>> {
        let params = DocumentSymbolParams {
            text_document: text_document(uri)?,
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
        };
        let result = self.request(DocumentSymbolRequest::METHOD, params).await?;
        let response: Option<DocumentSymbolResponse> = serde_json::from_value(result)?;
        let symbols = match response {
            None => Vec::new(),
            Some(DocumentSymbolResponse::Flat(symbols)) => symbols
                .into_iter()
                .map(|symbol| SymbolInfo {
                    name: symbol.name,
                    kind: format!("{:?}", symbol.kind),
                    location: symbol.location.into(),
                })
                .collect(),
            Some(DocumentSymbolResponse::Nested(symbols)) => {
                let mut out = Vec::new();
                flatten_symbols(uri, symbols, &mut out);
                out
            }
        };
        let mut decoded = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let location = self.decode_location(symbol.location).await;
            decoded.push(SymbolInfo { location, ..symbol });
        }
        Ok(decoded)
    }

    async fn did_open(&self, uri: &str, language_id: &str, text: &str) -> Result<()> {
        let params = DidOpenTextDocumentParams {
            text_document: TextDocumentItem::new(
                parse_uri(uri)?,
                language_id.to_string(),
                1,
                text.to_string(),
            ),
        };
        self.documents.lock().await.insert(uri.to_string(), text.into());
        self.notify(DidOpenTextDocument::METHOD, params).await
    }

    async fn did_change(&self, uri: &str, version: i32, text: &str) -> Result<()> {
        let params = DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier::new(parse_uri(uri)?, version),
            content_changes: vec![TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text: text.to_string(),
            }],
        };
        self.documents.lock().await.insert(uri.to_string(), text.into());
        self.notify(DidChangeTextDocument::METHOD, params).await
    }

    async fn did_close(&self, uri: &str) -> Result<()> {
        let params = DidCloseTextDocumentParams {
            text_document: text_document(uri)?,
        };
        self.documents.lock().await.remove(uri);
        self.notify(DidCloseTextDocument::METHOD, params).await
    }
}
