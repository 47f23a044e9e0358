//! The rename orchestrator
//!
//! Drives a rename end to end: local rename through the primary file's
//! language service, definition lookup through the index, concurrent per-file
//! edit computation across the workspace, and the final merge into one
//! workspace edit. Per-file failures degrade to skipping that file; the
//! primary file's rename either succeeds or fails the whole request.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, RwLock};

use futures::future::join_all;
use log::warn;
use tower_lsp::lsp_types::{
    Position, PrepareRenameResponse, TextEdit, Url, WorkspaceEdit,
};

use crate::error::RenameError;
use super::backend::{ClangBackend, SwiftBackend};
use super::document::{DocumentStore, Language, LanguageFamily};
use super::index::{
    RenameLocation, RenameUsage, SymbolIndex, SymbolOccurrence, SymbolProvider, SymbolRoles,
};
use super::services::{ClangLanguageService, LanguageService, SwiftLanguageService};
use super::translation::TranslatableName;
use super::workspace::Workspace;

pub struct RenameEngine {
    documents: DocumentStore,
    workspace: Workspace,
    index: RwLock<Option<Arc<dyn SymbolIndex>>>,
    swift_service: Arc<dyn LanguageService>,
    clang_service: Arc<dyn LanguageService>,
}

impl RenameEngine {
    pub fn new(
        swift_backend: Arc<dyn SwiftBackend>,
        clang_backend: Arc<dyn ClangBackend>,
        index: Option<Arc<dyn SymbolIndex>>,
    ) -> Self {
        let swift_service = Arc::new(SwiftLanguageService::new(Arc::clone(&swift_backend)));
        let clang_service = Arc::new(ClangLanguageService::new(clang_backend, swift_backend));
        Self {
            documents: DocumentStore::new(),
            workspace: Workspace::new(),
            index: RwLock::new(index),
            swift_service,
            clang_service,
        }
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn set_index(&self, index: Option<Arc<dyn SymbolIndex>>) {
        *self.index.write().unwrap() = index;
    }

    fn index(&self) -> Option<Arc<dyn SymbolIndex>> {
        self.index.read().unwrap().clone()
    }

    fn service_for_family(&self, family: LanguageFamily) -> &Arc<dyn LanguageService> {
        match family {
            LanguageFamily::Swift => &self.swift_service,
            LanguageFamily::Clang => &self.clang_service,
        }
    }

    fn service_for_provider(&self, provider: SymbolProvider) -> &Arc<dyn LanguageService> {
        match provider {
            SymbolProvider::Swift => &self.swift_service,
            SymbolProvider::Clang => &self.clang_service,
        }
    }

    /// Rename the symbol at `position` across the workspace.
    pub async fn rename(
        &self,
        uri: &Url,
        position: Position,
        new_name: &str,
    ) -> Result<Option<WorkspaceEdit>, RenameError> {
        if !self.workspace.contains(uri) {
            return Err(RenameError::WorkspaceNotOpen(uri.clone()));
        }
        let Some(snapshot) = self.documents.get(uri) else {
            return Ok(None);
        };
        let service = self.service_for_family(snapshot.language().family());

        // The primary file's rename must succeed; everything past this point
        // degrades to returning these local edits.
        let local = service.local_rename(&snapshot, position, new_name).await?;

        let (Some(usr), Some(index)) = (local.usr.clone(), self.index()) else {
            return Ok(Some(workspace_edit_for(uri, local.edits)));
        };

        let Some(old_name) = self.translatable_name(&usr, index.as_ref()).await? else {
            return Ok(Some(workspace_edit_for(uri, local.edits)));
        };
        let new_name = old_name.with_definition_name(new_name.to_string());

        // Local edits are only usable when they are spelled in the defining
        // language; otherwise the primary file is recomputed like any other.
        let mut changes: HashMap<Url, Vec<TextEdit>> = HashMap::new();
        if old_name.definition_language().family() == snapshot.language().family()
            && !local.edits.is_empty()
        {
            changes.insert(uri.clone(), sorted(local.edits));
        }

        let occurrences = index.occurrences(&usr, SymbolRoles::all());
        let mut by_file: BTreeMap<&Path, Vec<&SymbolOccurrence>> = BTreeMap::new();
        for occurrence in &occurrences {
            by_file
                .entry(occurrence.location.path.as_path())
                .or_default()
                .push(occurrence);
        }

        let tasks: Vec<_> = by_file
            .iter()
            .filter_map(|(path, occurrences)| {
                let Ok(file_uri) = Url::from_file_path(path) else {
                    warn!("skipping unaddressable path {}", path.display());
                    return None;
                };
                if changes.contains_key(&file_uri) {
                    return None;
                }
                Some(self.file_edits(file_uri, path, occurrences, index.as_ref(), &old_name, &new_name))
            })
            .collect();

        for result in join_all(tasks).await.into_iter().flatten() {
            let (file_uri, edits) = result;
            if edits.is_empty() {
                continue;
            }
            let previous = changes.insert(file_uri, edits);
            debug_assert!(previous.is_none(), "per-file edits computed twice");
        }

        Ok(Some(WorkspaceEdit {
            changes: Some(changes),
            document_changes: None,
            change_annotations: None,
        }))
    }

    /// Compute one file's edits. Any failure is logged and skips the file.
    async fn file_edits(
        &self,
        uri: Url,
        path: &Path,
        occurrences: &[&SymbolOccurrence],
        index: &dyn SymbolIndex,
        old_name: &TranslatableName,
        new_name: &TranslatableName,
    ) -> Option<(Url, Vec<TextEdit>)> {
        let Some(provider) = index.symbol_provider(path) else {
            warn!("no symbol provider for {}; skipping", path.display());
            return None;
        };
        let service = self.service_for_provider(provider);

        let Some(snapshot) = self.documents.snapshot_or_disk(&uri).await else {
            warn!("cannot load {}; skipping", uri);
            return None;
        };

        let locations: Vec<RenameLocation> = occurrences
            .iter()
            .map(|occurrence| RenameLocation {
                line: occurrence.location.line,
                utf8_column: occurrence.location.utf8_column,
                usage: RenameUsage::from_roles(occurrence.roles),
            })
            .collect();

        match service
            .edits_to_rename(&locations, &snapshot, old_name, new_name)
            .await
        {
            Ok(edits) => Some((uri, sorted(edits))),
            Err(error) => {
                warn!("rename failed in {}: {error}; skipping", uri);
                None
            }
        }
    }

    /// Build the definition-site identity of the USR being renamed.
    ///
    /// Returns `None` (after logging) when the index has no unique
    /// definition or the defining file cannot be loaded; the caller falls
    /// back to local-only edits.
    async fn translatable_name(
        &self,
        usr: &str,
        index: &dyn SymbolIndex,
    ) -> Result<Option<TranslatableName>, RenameError> {
        let mut definitions = index.occurrences(usr, SymbolRoles::DEFINITION);
        if definitions.is_empty() {
            definitions = index.occurrences(usr, SymbolRoles::DECLARATION);
        }
        if definitions.len() != 1 {
            warn!(
                "found {} definitions of {usr}; performing local rename only",
                definitions.len()
            );
            return Ok(None);
        }
        let definition = definitions.remove(0);

        let language = Language::from_identifier(&definition.symbol.language).ok_or_else(|| {
            RenameError::UnsupportedLanguage(definition.symbol.language.clone())
        })?;
        let is_objc_selector = language == Language::ObjC && definition.symbol.kind.is_method();

        let Ok(definition_uri) = Url::from_file_path(&definition.location.path) else {
            warn!(
                "definition of {usr} at unaddressable path {}",
                definition.location.path.display()
            );
            return Ok(None);
        };
        let Some(snapshot) = self.documents.snapshot_or_disk(&definition_uri).await else {
            warn!("cannot load defining file {definition_uri}; performing local rename only");
            return Ok(None);
        };

        let position = snapshot
            .position_from_utf8(definition.location.line, definition.location.utf8_column)
            .ok_or(RenameError::CannotComputeOffset(Position {
                line: definition.location.line.saturating_sub(1),
                character: definition.location.utf8_column.saturating_sub(1),
            }))?;

        Ok(Some(TranslatableName::new(
            definition.symbol.name,
            language,
            snapshot,
            position,
            is_objc_selector,
        )))
    }

    /// Resolve the rename dialog's range and placeholder.
    ///
    /// When the symbol is defined in the other language, the placeholder is
    /// swapped for the definition-site spelling: that is the name the user
    /// must type.
    pub async fn prepare_rename(
        &self,
        uri: &Url,
        position: Position,
    ) -> Result<Option<PrepareRenameResponse>, RenameError> {
        let Some(snapshot) = self.documents.get(uri) else {
            return Ok(None);
        };
        let service = self.service_for_family(snapshot.language().family());

        let Some(mut prepared) = service.prepare_rename(&snapshot, position).await? else {
            return Ok(None);
        };

        if let Some(index) = self.index() {
            match service.symbol_info(&snapshot, position).await {
                Ok(details) => {
                    let usr = details.into_iter().find_map(|detail| detail.usr);
                    if let Some(usr) = usr {
                        match self.translatable_name(&usr, index.as_ref()).await {
                            Ok(Some(name)) => {
                                prepared.placeholder = name.definition_name().to_string();
                            }
                            Ok(None) => {}
                            Err(error) => {
                                warn!("keeping local placeholder for {usr}: {error}");
                            }
                        }
                    }
                }
                Err(error) => warn!("symbol info failed for {uri}: {error}"),
            }
        }

        Ok(Some(PrepareRenameResponse::RangeWithPlaceholder {
            range: prepared.range,
            placeholder: prepared.placeholder,
        }))
    }
}

fn workspace_edit_for(uri: &Url, edits: Vec<TextEdit>) -> WorkspaceEdit {
    let mut changes = HashMap::new();
    if !edits.is_empty() {
        changes.insert(uri.clone(), sorted(edits));
    }
    WorkspaceEdit {
        changes: Some(changes),
        document_changes: None,
        change_annotations: None,
    }
}

fn sorted(mut edits: Vec<TextEdit>) -> Vec<TextEdit> {
    edits.sort_by_key(|edit| (edit.range.start.line, edit.range.start.character));
    edits
}
