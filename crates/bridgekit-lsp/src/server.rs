//! The bridgekit language server
//!
//! Thin tower-lsp wiring around the rename engine: document lifecycle,
//! capability negotiation, and the rename/prepare-rename request handlers.

use std::path::PathBuf;
use std::sync::Arc;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

pub mod backend;
pub mod document;
pub mod edits;
pub mod index;
pub mod pieces;
pub mod position;
pub mod rename;
pub mod services;
pub mod syntactic;
pub mod translation;
pub mod workspace;

use backend::{ClangBackend, SwiftBackend};
use document::Language;
use index::{FileIndex, SymbolIndex};
use rename::RenameEngine;

/// The external collaborators the server is wired to at startup
pub struct ServerConnections {
    pub swift: Arc<dyn SwiftBackend>,
    pub clang: Arc<dyn ClangBackend>,
    pub index: Option<Arc<dyn SymbolIndex>>,
}

pub struct BridgeLanguageServer {
    client: Client,
    engine: Arc<RenameEngine>,
}

impl BridgeLanguageServer {
    pub fn new(client: Client, connections: ServerConnections) -> Self {
        Self {
            client,
            engine: Arc::new(RenameEngine::new(
                connections.swift,
                connections.clang,
                connections.index,
            )),
        }
    }

    fn open_document(&self, uri: Url, language_id: &str, text: String) {
        let language = Language::from_identifier(language_id).or_else(|| {
            uri.to_file_path()
                .ok()
                .and_then(|path| Language::from_path(&path))
        });
        match language {
            Some(language) => self.engine.documents().insert(uri, language, text),
            None => eprintln!("Ignoring document with unsupported language: {uri}"),
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for BridgeLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        eprintln!("Initializing bridgekit language server");

        if let Some(folders) = &params.workspace_folders {
            for folder in folders {
                self.engine.workspace().add_root(folder.uri.clone());
            }
        }
        if let Some(root_uri) = params.root_uri.clone() {
            self.engine.workspace().add_root(root_uri);
        }

        // Initialization options can point at an index dump, overriding the
        // command line.
        if let Some(options) = params.initialization_options {
            if let Some(index_path) = options.get("indexPath").and_then(|value| value.as_str()) {
                match FileIndex::load(&PathBuf::from(index_path)) {
                    Ok(index) => self.engine.set_index(Some(Arc::new(index))),
                    Err(error) => eprintln!("Failed to load index {index_path}: {error:#}"),
                }
            }
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                rename_provider: Some(OneOf::Right(RenameOptions {
                    prepare_provider: Some(true),
                    work_done_progress_options: WorkDoneProgressOptions::default(),
                })),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "bridgekit-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        eprintln!("bridgekit language server initialized");
        self.client
            .log_message(MessageType::INFO, "bridgekit language server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        eprintln!("Shutting down bridgekit language server");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let document = params.text_document;
        self.open_document(document.uri, &document.language_id, document.text);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // Full sync: a single change carrying the whole text
        if let Some(change) = params.content_changes.into_iter().next() {
            self.engine
                .documents()
                .update(&params.text_document.uri, change.text);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.engine.documents().remove(&params.text_document.uri);
    }

    async fn prepare_rename(
        &self,
        params: TextDocumentPositionParams,
    ) -> Result<Option<PrepareRenameResponse>> {
        let uri = params.text_document.uri;
        eprintln!("Prepare rename request at {:?} in {uri}", params.position);

        self.engine
            .prepare_rename(&uri, params.position)
            .await
            .map_err(|error| error.into_jsonrpc())
    }

    async fn rename(&self, params: RenameParams) -> Result<Option<WorkspaceEdit>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        eprintln!("Rename request at {position:?} in {uri} to {}", params.new_name);

        self.engine
            .rename(&uri, position, &params.new_name)
            .await
            .map_err(|error| error.into_jsonrpc())
    }
}

#[cfg(test)]
#[path = "tests/server_tests.rs"]
mod server_tests;
