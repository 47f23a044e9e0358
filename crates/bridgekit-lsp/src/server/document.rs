//! Document snapshots and thread-safe document storage
//!
//! Open documents are held as immutable snapshots keyed by URI. Closed files
//! referenced by the index are read from disk into ephemeral snapshots with
//! the same shape, so the rename engine never cares which kind it holds.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tower_lsp::lsp_types::{Position, Range, Url};

use super::position::LineIndex;

/// Source language of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Swift,
    C,
    Cpp,
    ObjC,
    ObjCpp,
}

/// Which half of the bridge a language belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageFamily {
    Swift,
    Clang,
}

impl Language {
    pub fn family(self) -> LanguageFamily {
        match self {
            Language::Swift => LanguageFamily::Swift,
            Language::C | Language::Cpp | Language::ObjC | Language::ObjCpp => {
                LanguageFamily::Clang
            }
        }
    }

    /// From an LSP `language_id` or an index symbol language
    pub fn from_identifier(identifier: &str) -> Option<Language> {
        match identifier {
            "swift" => Some(Language::Swift),
            "c" => Some(Language::C),
            "cpp" | "c++" => Some(Language::Cpp),
            "objective-c" | "objc" => Some(Language::ObjC),
            "objective-cpp" | "objective-c++" => Some(Language::ObjCpp),
            _ => None,
        }
    }

    /// From a file extension, for documents read from disk
    pub fn from_path(path: &Path) -> Option<Language> {
        match path.extension()?.to_str()? {
            "swift" => Some(Language::Swift),
            "c" | "h" => Some(Language::C),
            "cpp" | "cc" | "cxx" | "hpp" => Some(Language::Cpp),
            "m" => Some(Language::ObjC),
            "mm" => Some(Language::ObjCpp),
            _ => None,
        }
    }
}

/// An immutable view of one file: its text plus a line table
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    uri: Url,
    language: Language,
    text: String,
    line_index: LineIndex,
}

impl DocumentSnapshot {
    pub fn new(uri: Url, language: Language, text: String) -> Self {
        let line_index = LineIndex::new(&text);
        Self {
            uri,
            language,
            text,
            line_index,
        }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    pub fn offset(&self, position: Position) -> Option<usize> {
        self.line_index.offset(&self.text, position)
    }

    pub fn position_from_utf8(&self, line: u32, utf8_column: u32) -> Option<Position> {
        self.line_index.position_from_utf8(&self.text, line, utf8_column)
    }

    pub fn utf8_column(&self, position: Position) -> Option<u32> {
        self.line_index.utf8_column(&self.text, position)
    }

    /// The text covered by an LSP range, if the range exists in the document
    pub fn slice(&self, range: Range) -> Option<&str> {
        let start = self.offset(range.start)?;
        let end = self.offset(range.end)?;
        self.text.get(start..end)
    }

    /// The file path this snapshot was taken from, as the backends expect it
    pub fn sourcefile(&self) -> String {
        match self.uri.to_file_path() {
            Ok(path) => path.display().to_string(),
            Err(()) => self.uri.to_string(),
        }
    }
}

/// Thread-safe storage for open document snapshots
#[derive(Clone, Default)]
pub struct DocumentStore {
    documents: Arc<RwLock<HashMap<Url, Arc<DocumentSnapshot>>>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document
    pub fn insert(&self, uri: Url, language: Language, text: String) {
        let snapshot = Arc::new(DocumentSnapshot::new(uri.clone(), language, text));
        let mut docs = self.documents.write().unwrap();
        docs.insert(uri, snapshot);
    }

    /// Replace a document's text, keeping its language
    pub fn update(&self, uri: &Url, text: String) {
        let mut docs = self.documents.write().unwrap();
        if let Some(existing) = docs.get(uri) {
            let language = existing.language();
            docs.insert(
                uri.clone(),
                Arc::new(DocumentSnapshot::new(uri.clone(), language, text)),
            );
        }
    }

    pub fn remove(&self, uri: &Url) {
        let mut docs = self.documents.write().unwrap();
        docs.remove(uri);
    }

    /// The latest snapshot of an open document
    pub fn get(&self, uri: &Url) -> Option<Arc<DocumentSnapshot>> {
        let docs = self.documents.read().unwrap();
        docs.get(uri).cloned()
    }

    pub fn contains(&self, uri: &Url) -> bool {
        let docs = self.documents.read().unwrap();
        docs.contains_key(uri)
    }

    /// The open snapshot if any, otherwise an ephemeral snapshot read from
    /// disk. Returns `None` when the file cannot be read or its language
    /// cannot be determined from the path.
    pub async fn snapshot_or_disk(&self, uri: &Url) -> Option<Arc<DocumentSnapshot>> {
        if let Some(snapshot) = self.get(uri) {
            return Some(snapshot);
        }
        let path = uri.to_file_path().ok()?;
        let language = Language::from_path(&path)?;
        let text = tokio::fs::read_to_string(&path).await.ok()?;
        Some(Arc::new(DocumentSnapshot::new(uri.clone(), language, text)))
    }
}
