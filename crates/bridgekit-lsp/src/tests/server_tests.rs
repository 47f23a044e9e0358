use super::*;
use super::backend::{
    BackendError, ClangSymbolInfoRequest, IndexedRenameRequest, NameTranslationRequest,
    NameTranslationResponse, PreparedRenameResponse, RelatedIdentifiersRequest,
    RelatedIdentifiersResponse, SwiftSymbolInfoRequest, SymbolDetail,
    SyntacticRenameRangesRequest, SyntacticRenameRangesResponse,
};
use tower_lsp::async_trait;

struct NullSwift;

#[async_trait]
impl SwiftBackend for NullSwift {
    async fn translate_name(
        &self,
        _request: NameTranslationRequest,
    ) -> std::result::Result<NameTranslationResponse, BackendError> {
        Err(BackendError::Remote("backend not connected".to_string()))
    }

    async fn syntactic_rename_ranges(
        &self,
        _request: SyntacticRenameRangesRequest,
    ) -> std::result::Result<SyntacticRenameRangesResponse, BackendError> {
        Err(BackendError::Remote("backend not connected".to_string()))
    }

    async fn related_identifiers(
        &self,
        _request: RelatedIdentifiersRequest,
    ) -> std::result::Result<RelatedIdentifiersResponse, BackendError> {
        Err(BackendError::Remote("backend not connected".to_string()))
    }

    async fn symbol_info(
        &self,
        _request: SwiftSymbolInfoRequest,
    ) -> std::result::Result<Vec<SymbolDetail>, BackendError> {
        Ok(vec![])
    }
}

struct NullClang;

#[async_trait]
impl ClangBackend for NullClang {
    async fn indexed_rename(
        &self,
        _request: IndexedRenameRequest,
    ) -> std::result::Result<Option<WorkspaceEdit>, BackendError> {
        Ok(None)
    }

    async fn prepare_rename(
        &self,
        _request: ClangSymbolInfoRequest,
    ) -> std::result::Result<Option<PreparedRenameResponse>, BackendError> {
        Ok(None)
    }

    async fn symbol_info(
        &self,
        _request: ClangSymbolInfoRequest,
    ) -> std::result::Result<Vec<SymbolDetail>, BackendError> {
        Ok(vec![])
    }
}

fn connections() -> ServerConnections {
    ServerConnections {
        swift: Arc::new(NullSwift),
        clang: Arc::new(NullClang),
        index: None,
    }
}

#[test]
fn test_lsp_service_creation() {
    let (service, _socket) =
        tower_lsp::LspService::new(|client| BridgeLanguageServer::new(client, connections()));
    drop(service);
}

#[test]
fn test_server_tracks_documents() {
    let (_service, _socket) = tower_lsp::LspService::new(|client| {
        let server = BridgeLanguageServer::new(client, connections());

        let uri = Url::parse("file:///proj/A.swift").unwrap();
        server.open_document(uri.clone(), "swift", "func foo() {}\n".to_string());
        assert!(server.engine.documents().contains(&uri));

        // Unknown language ids fall back to the file extension
        let objc = Url::parse("file:///proj/B.m").unwrap();
        server.open_document(objc.clone(), "unknown-id", "@interface B\n".to_string());
        assert!(server.engine.documents().contains(&objc));

        // Documents the bridge cannot type are ignored
        let other = Url::parse("file:///proj/C.rs").unwrap();
        server.open_document(other.clone(), "rust", "fn main() {}\n".to_string());
        assert!(!server.engine.documents().contains(&other));

        server
    });
}
