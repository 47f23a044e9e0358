//! Error taxonomy of the rename engine
//!
//! Hard failures surface to the client; per-file failures during the
//! workspace fan-out are logged and the file is skipped instead.

use thiserror::Error;
use tower_lsp::lsp_types::{Position, Url};

use crate::server::backend::BackendError;

#[derive(Debug, Error)]
pub enum RenameError {
    #[error("no workspace is open for {0}")]
    WorkspaceNotOpen(Url),

    /// The symbol is defined in a language neither half of the bridge handles
    #[error("symbol is defined in an unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The snapshot and the position disagree; indicates stale state
    #[error("cannot compute offset for {}:{}", .0.line, .0.character)]
    CannotComputeOffset(Position),

    #[error("malformed {direction} translation response: {payload}")]
    MalformedTranslationResponse {
        direction: &'static str,
        payload: String,
    },

    /// A backend replied successfully but without the required fields
    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl RenameError {
    /// Map onto a JSON-RPC error at the server boundary
    pub fn into_jsonrpc(self) -> tower_lsp::jsonrpc::Error {
        let mut error = tower_lsp::jsonrpc::Error::internal_error();
        error.message = self.to_string().into();
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RenameError::CannotComputeOffset(Position { line: 3, character: 7 });
        assert_eq!(err.to_string(), "cannot compute offset for 3:7");

        let err = RenameError::WorkspaceNotOpen(Url::parse("file:///a.swift").unwrap());
        assert!(err.to_string().contains("file:///a.swift"));
    }
}
