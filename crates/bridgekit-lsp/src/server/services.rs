//! The two language services behind the rename orchestrator
//!
//! Each service answers the same four questions for its half of the bridge:
//! rename locally within one file, compute edits for known locations in one
//! file, prepare a rename dialog, and identify the symbol at a position. The
//! Swift side runs the syntactic piece machinery; the clang side forwards to
//! its backend's indexed rename.

use std::sync::Arc;

use bridgekit_names::CompoundName;
use log::warn;
use tower_lsp::async_trait;
use tower_lsp::lsp_types::{Position, Range, TextEdit};

use crate::error::RenameError;
use super::backend::{
    ClangBackend, ClangSymbolInfoRequest, IndexedRenameRequest, PreparedRenameResponse,
    RelatedIdentifiersRequest, SwiftBackend, SwiftSymbolInfoRequest, SymbolDetail,
};
use super::document::DocumentSnapshot;
use super::edits::edits_for_occurrence;
use super::index::{RenameLocation, RenameUsage};
use super::syntactic::syntactic_ranges;
use super::translation::TranslatableName;

/// Result of a single-file rename: the edits plus the symbol's USR when the
/// service could determine one
pub struct LocalRename {
    pub edits: Vec<TextEdit>,
    pub usr: Option<String>,
}

#[async_trait]
pub trait LanguageService: Send + Sync {
    /// Rename every occurrence within the given file
    async fn local_rename(
        &self,
        snapshot: &DocumentSnapshot,
        position: Position,
        new_name: &str,
    ) -> Result<LocalRename, RenameError>;

    /// Compute the edits for already-discovered occurrences in one file
    async fn edits_to_rename(
        &self,
        locations: &[RenameLocation],
        snapshot: &DocumentSnapshot,
        old_name: &TranslatableName,
        new_name: &TranslatableName,
    ) -> Result<Vec<TextEdit>, RenameError>;

    /// The range and placeholder for the client's rename dialog
    async fn prepare_rename(
        &self,
        snapshot: &DocumentSnapshot,
        position: Position,
    ) -> Result<Option<PreparedRenameResponse>, RenameError>;

    /// Details of the symbol at a position
    async fn symbol_info(
        &self,
        snapshot: &DocumentSnapshot,
        position: Position,
    ) -> Result<Vec<SymbolDetail>, RenameError>;
}

pub struct SwiftLanguageService {
    backend: Arc<dyn SwiftBackend>,
}

impl SwiftLanguageService {
    pub fn new(backend: Arc<dyn SwiftBackend>) -> Self {
        Self { backend }
    }

    /// The edits for known occurrences of a name already spelled in Swift
    async fn compound_name_edits(
        &self,
        locations: &[RenameLocation],
        old_name: &str,
        new_name: &str,
        snapshot: &DocumentSnapshot,
    ) -> Result<Vec<TextEdit>, RenameError> {
        let old_name_parsed = CompoundName::parse(old_name);
        let new_name_parsed = CompoundName::parse(new_name);

        let occurrences =
            syntactic_ranges(self.backend.as_ref(), locations, old_name, snapshot).await?;
        Ok(occurrences
            .iter()
            .flat_map(|occurrence| {
                edits_for_occurrence(occurrence, &old_name_parsed, &new_name_parsed, snapshot)
            })
            .collect())
    }
}

#[async_trait]
impl LanguageService for SwiftLanguageService {
    async fn local_rename(
        &self,
        snapshot: &DocumentSnapshot,
        position: Position,
        new_name: &str,
    ) -> Result<LocalRename, RenameError> {
        let offset = snapshot
            .offset(position)
            .ok_or(RenameError::CannotComputeOffset(position))?;
        let related = self
            .backend
            .related_identifiers(RelatedIdentifiersRequest {
                sourcefile: snapshot.sourcefile(),
                offset,
            })
            .await?;

        let locations: Vec<RenameLocation> = related
            .locations
            .iter()
            .map(|identifier| RenameLocation {
                line: identifier.line,
                utf8_column: identifier.column,
                usage: RenameUsage::Reference,
            })
            .collect();

        let edits = self
            .compound_name_edits(&locations, &related.name, new_name, snapshot)
            .await?;
        Ok(LocalRename {
            edits,
            usr: related.usr,
        })
    }

    async fn edits_to_rename(
        &self,
        locations: &[RenameLocation],
        snapshot: &DocumentSnapshot,
        old_name: &TranslatableName,
        new_name: &TranslatableName,
    ) -> Result<Vec<TextEdit>, RenameError> {
        let Some(first) = locations.first() else {
            return Ok(Vec::new());
        };
        // Any occurrence anchors the translation; they all share a definition.
        let position = snapshot
            .position_from_utf8(first.line, first.utf8_column)
            .ok_or(RenameError::CannotComputeOffset(Position {
                line: first.line.saturating_sub(1),
                character: first.utf8_column.saturating_sub(1),
            }))?;

        let old_spelling = old_name
            .swift_name(self.backend.as_ref(), position, snapshot)
            .await?;
        let new_spelling = new_name
            .swift_name(self.backend.as_ref(), position, snapshot)
            .await?;

        self.compound_name_edits(locations, &old_spelling, &new_spelling, snapshot)
            .await
    }

    async fn prepare_rename(
        &self,
        snapshot: &DocumentSnapshot,
        position: Position,
    ) -> Result<Option<PreparedRenameResponse>, RenameError> {
        let offset = snapshot
            .offset(position)
            .ok_or(RenameError::CannotComputeOffset(position))?;
        let related = self
            .backend
            .related_identifiers(RelatedIdentifiersRequest {
                sourcefile: snapshot.sourcefile(),
                offset,
            })
            .await?;

        let Some(cursor_column) = snapshot.utf8_column(position) else {
            return Ok(None);
        };
        let line = position.line + 1;

        for identifier in &related.locations {
            if identifier.line != line
                || cursor_column < identifier.column
                || cursor_column > identifier.end_column
            {
                continue;
            }
            let (Some(start), Some(end)) = (
                snapshot.position_from_utf8(identifier.line, identifier.column),
                snapshot.position_from_utf8(identifier.line, identifier.end_column),
            ) else {
                continue;
            };
            return Ok(Some(PreparedRenameResponse {
                range: Range { start, end },
                placeholder: related.name.clone(),
            }));
        }
        Ok(None)
    }

    async fn symbol_info(
        &self,
        snapshot: &DocumentSnapshot,
        position: Position,
    ) -> Result<Vec<SymbolDetail>, RenameError> {
        let offset = snapshot
            .offset(position)
            .ok_or(RenameError::CannotComputeOffset(position))?;
        Ok(self
            .backend
            .symbol_info(SwiftSymbolInfoRequest {
                sourcefile: snapshot.sourcefile(),
                offset,
            })
            .await?)
    }
}

pub struct ClangLanguageService {
    backend: Arc<dyn ClangBackend>,
    /// Needed to translate Swift-defined names into clang spelling
    swift_backend: Arc<dyn SwiftBackend>,
}

impl ClangLanguageService {
    pub fn new(backend: Arc<dyn ClangBackend>, swift_backend: Arc<dyn SwiftBackend>) -> Self {
        Self {
            backend,
            swift_backend,
        }
    }

    /// Extract this file's edits from an indexed-rename workspace edit
    fn edits_for_uri(
        response: Option<tower_lsp::lsp_types::WorkspaceEdit>,
        snapshot: &DocumentSnapshot,
    ) -> Vec<TextEdit> {
        response
            .and_then(|edit| edit.changes)
            .and_then(|mut changes| changes.remove(snapshot.uri()))
            .unwrap_or_default()
    }
}

#[async_trait]
impl LanguageService for ClangLanguageService {
    async fn local_rename(
        &self,
        snapshot: &DocumentSnapshot,
        position: Position,
        new_name: &str,
    ) -> Result<LocalRename, RenameError> {
        let details = self
            .backend
            .symbol_info(ClangSymbolInfoRequest {
                text_document: snapshot.uri().clone(),
                position,
            })
            .await?;
        let Some(detail) = details.into_iter().next() else {
            return Ok(LocalRename {
                edits: Vec::new(),
                usr: None,
            });
        };

        let response = self
            .backend
            .indexed_rename(IndexedRenameRequest {
                text_document: snapshot.uri().clone(),
                old_name: detail.name,
                new_name: new_name.to_string(),
                positions: [(snapshot.uri().clone(), vec![position])].into(),
            })
            .await?;

        Ok(LocalRename {
            edits: Self::edits_for_uri(response, snapshot),
            usr: detail.usr,
        })
    }

    async fn edits_to_rename(
        &self,
        locations: &[RenameLocation],
        snapshot: &DocumentSnapshot,
        old_name: &TranslatableName,
        new_name: &TranslatableName,
    ) -> Result<Vec<TextEdit>, RenameError> {
        let old_spelling = old_name.clang_name(self.swift_backend.as_ref()).await?;
        let new_spelling = new_name.clang_name(self.swift_backend.as_ref()).await?;

        let positions: Vec<Position> = locations
            .iter()
            .filter_map(|location| {
                snapshot.position_from_utf8(location.line, location.utf8_column)
            })
            .collect();

        let request = IndexedRenameRequest {
            text_document: snapshot.uri().clone(),
            old_name: old_spelling,
            new_name: new_spelling,
            positions: [(snapshot.uri().clone(), positions)].into(),
        };
        match self.backend.indexed_rename(request).await {
            Ok(response) => Ok(Self::edits_for_uri(response, snapshot)),
            Err(error) => {
                warn!("indexed rename failed for {}: {error}", snapshot.uri());
                Ok(Vec::new())
            }
        }
    }

    async fn prepare_rename(
        &self,
        snapshot: &DocumentSnapshot,
        position: Position,
    ) -> Result<Option<PreparedRenameResponse>, RenameError> {
        Ok(self
            .backend
            .prepare_rename(ClangSymbolInfoRequest {
                text_document: snapshot.uri().clone(),
                position,
            })
            .await?)
    }

    async fn symbol_info(
        &self,
        snapshot: &DocumentSnapshot,
        position: Position,
    ) -> Result<Vec<SymbolDetail>, RenameError> {
        Ok(self
            .backend
            .symbol_info(ClangSymbolInfoRequest {
                text_document: snapshot.uri().clone(),
                position,
            })
            .await?)
    }
}
