//! Backend contracts and the subprocess transport
//!
//! The engine talks to two opaque services: a Swift backend that understands
//! compound names and syntactic rename ranges, and a clang backend that
//! performs indexed renames over C-family sources. Both are modeled as async
//! traits; production wiring spawns each backend as a child process speaking
//! one JSON object per line over stdin/stdout, tests substitute in-process
//! mocks.

use std::process::Stdio;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tower_lsp::async_trait;
use tower_lsp::lsp_types::{Position, Range, Url, WorkspaceEdit};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("backend protocol error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend reported a failure for this request
    #[error("backend error: {0}")]
    Remote(String),

    #[error("backend closed its output stream")]
    Closed,
}

/// Whether a name-translation request starts from the Swift or the
/// Objective-C spelling
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NameKind {
    Swift,
    Objc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameTranslationRequest {
    pub sourcefile: String,
    pub compilerargs: Vec<String>,
    /// Byte offset of the position anchoring the translation
    pub offset: usize,
    pub name_kind: NameKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arg_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector_pieces: Option<Vec<String>>,
}

/// Union of the two translation directions' results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameTranslationResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arg_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_zero_arg_selector: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector_pieces: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntacticRenameRangesRequest {
    pub sourcefile: String,
    /// The request is purely syntactic: the text travels with it
    pub sourcetext: String,
    pub rename_locations: Vec<RenameLocationsGroup>,
}

/// All locations of one name within the file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameLocationsGroup {
    pub locations: Vec<RawRenameLocation>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRenameLocation {
    /// 1-based line
    pub line: u32,
    /// 1-based UTF-8 column
    pub column: u32,
    pub name_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntacticRenameRangesResponse {
    pub categorized_ranges: Vec<RawCategorizedRanges>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCategorizedRanges {
    pub category: String,
    pub ranges: Vec<RawPieceRange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPieceRange {
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arg_index: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedIdentifiersRequest {
    pub sourcefile: String,
    pub offset: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedIdentifiersResponse {
    /// The symbol's compound name
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usr: Option<String>,
    pub locations: Vec<RelatedIdentifier>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedIdentifier {
    /// 1-based line
    pub line: u32,
    /// 1-based UTF-8 column of the identifier start
    pub column: u32,
    /// 1-based UTF-8 column one past the identifier end
    pub end_column: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwiftSymbolInfoRequest {
    pub sourcefile: String,
    pub offset: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolDetail {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usr: Option<String>,
}

#[async_trait]
pub trait SwiftBackend: Send + Sync {
    async fn translate_name(
        &self,
        request: NameTranslationRequest,
    ) -> Result<NameTranslationResponse, BackendError>;

    async fn syntactic_rename_ranges(
        &self,
        request: SyntacticRenameRangesRequest,
    ) -> Result<SyntacticRenameRangesResponse, BackendError>;

    async fn related_identifiers(
        &self,
        request: RelatedIdentifiersRequest,
    ) -> Result<RelatedIdentifiersResponse, BackendError>;

    async fn symbol_info(
        &self,
        request: SwiftSymbolInfoRequest,
    ) -> Result<Vec<SymbolDetail>, BackendError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClangSymbolInfoRequest {
    pub text_document: Url,
    pub position: Position,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedRenameRequest {
    pub text_document: Url,
    pub old_name: String,
    pub new_name: String,
    /// Known occurrences, grouped by file
    pub positions: std::collections::HashMap<Url, Vec<Position>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedRenameResponse {
    pub range: Range,
    pub placeholder: String,
}

#[async_trait]
pub trait ClangBackend: Send + Sync {
    async fn indexed_rename(
        &self,
        request: IndexedRenameRequest,
    ) -> Result<Option<WorkspaceEdit>, BackendError>;

    async fn prepare_rename(
        &self,
        request: ClangSymbolInfoRequest,
    ) -> Result<Option<PreparedRenameResponse>, BackendError>;

    async fn symbol_info(
        &self,
        request: ClangSymbolInfoRequest,
    ) -> Result<Vec<SymbolDetail>, BackendError>;
}

#[derive(Serialize)]
struct RequestEnvelope<'a, P: Serialize> {
    method: &'a str,
    params: &'a P,
}

#[derive(Deserialize)]
struct ResponseEnvelope {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

/// A backend spawned as a child process, one JSON object per line in each
/// direction. Requests are serialized; the protocol has no interleaving.
pub struct SubprocessBackend {
    io: Mutex<SubprocessIo>,
}

struct SubprocessIo {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    _child: Child,
}

impl SubprocessBackend {
    pub fn spawn(command: &str, args: &[String]) -> std::io::Result<SubprocessBackend> {
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| std::io::Error::other("child stdin was not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("child stdout was not captured"))?;
        let stdout = BufReader::new(stdout);
        Ok(SubprocessBackend {
            io: Mutex::new(SubprocessIo {
                stdin,
                stdout,
                _child: child,
            }),
        })
    }

    async fn request<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<R, BackendError> {
        let payload = serde_json::to_string(&RequestEnvelope { method, params })?;

        let mut io = self.io.lock().await;
        io.stdin.write_all(payload.as_bytes()).await?;
        io.stdin.write_all(b"\n").await?;
        io.stdin.flush().await?;

        let mut line = String::new();
        if io.stdout.read_line(&mut line).await? == 0 {
            return Err(BackendError::Closed);
        }
        drop(io);

        let envelope: ResponseEnvelope = serde_json::from_str(&line)?;
        if let Some(message) = envelope.error {
            return Err(BackendError::Remote(message));
        }
        let result = envelope
            .result
            .ok_or_else(|| BackendError::Remote("response carried no result".to_string()))?;
        Ok(serde_json::from_value(result)?)
    }
}

#[async_trait]
impl SwiftBackend for SubprocessBackend {
    async fn translate_name(
        &self,
        request: NameTranslationRequest,
    ) -> Result<NameTranslationResponse, BackendError> {
        self.request("nameTranslation", &request).await
    }

    async fn syntactic_rename_ranges(
        &self,
        request: SyntacticRenameRangesRequest,
    ) -> Result<SyntacticRenameRangesResponse, BackendError> {
        self.request("syntacticRenameRanges", &request).await
    }

    async fn related_identifiers(
        &self,
        request: RelatedIdentifiersRequest,
    ) -> Result<RelatedIdentifiersResponse, BackendError> {
        self.request("relatedIdentifiers", &request).await
    }

    async fn symbol_info(
        &self,
        request: SwiftSymbolInfoRequest,
    ) -> Result<Vec<SymbolDetail>, BackendError> {
        self.request("symbolInfo", &request).await
    }
}

#[async_trait]
impl ClangBackend for SubprocessBackend {
    async fn indexed_rename(
        &self,
        request: IndexedRenameRequest,
    ) -> Result<Option<WorkspaceEdit>, BackendError> {
        self.request("indexedRename", &request).await
    }

    async fn prepare_rename(
        &self,
        request: ClangSymbolInfoRequest,
    ) -> Result<Option<PreparedRenameResponse>, BackendError> {
        self.request("prepareRename", &request).await
    }

    async fn symbol_info(
        &self,
        request: ClangSymbolInfoRequest,
    ) -> Result<Vec<SymbolDetail>, BackendError> {
        self.request("clangSymbolInfo", &request).await
    }
}
