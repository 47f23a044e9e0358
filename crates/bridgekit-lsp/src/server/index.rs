//! Symbol index interface and the JSON-backed implementation
//!
//! The index answers two questions for the rename engine: where does a USR
//! occur across the workspace, and which language service owns a given file.
//! The shipped `FileIndex` loads a prebuilt index dump from disk; tests and
//! embedders can substitute anything that implements `SymbolIndex`.

use std::collections::HashMap;
use std::ops::BitOr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Bit mask of the roles an occurrence plays at its location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SymbolRoles(u32);

impl SymbolRoles {
    pub const DECLARATION: SymbolRoles = SymbolRoles(1 << 0);
    pub const DEFINITION: SymbolRoles = SymbolRoles(1 << 1);
    pub const REFERENCE: SymbolRoles = SymbolRoles(1 << 2);
    pub const CALL: SymbolRoles = SymbolRoles(1 << 3);

    pub fn all() -> SymbolRoles {
        Self::DECLARATION | Self::DEFINITION | Self::REFERENCE | Self::CALL
    }

    /// Whether any of `other`'s roles are present
    pub fn contains(self, other: SymbolRoles) -> bool {
        self.0 & other.0 != 0
    }

    pub fn from_names(names: &[String]) -> SymbolRoles {
        names
            .iter()
            .filter_map(|name| match name.as_str() {
                "declaration" => Some(Self::DECLARATION),
                "definition" => Some(Self::DEFINITION),
                "reference" => Some(Self::REFERENCE),
                "call" => Some(Self::CALL),
                _ => None,
            })
            .fold(SymbolRoles::default(), BitOr::bitor)
    }
}

impl BitOr for SymbolRoles {
    type Output = SymbolRoles;

    fn bitor(self, rhs: SymbolRoles) -> SymbolRoles {
        SymbolRoles(self.0 | rhs.0)
    }
}

/// Kind of an indexed symbol, as far as the rename engine cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexSymbolKind {
    InstanceMethod,
    ClassMethod,
    Function,
    Variable,
    Class,
    #[serde(other)]
    Other,
}

impl IndexSymbolKind {
    /// Methods are spelled as selectors on the Objective-C side
    pub fn is_method(self) -> bool {
        matches!(self, IndexSymbolKind::InstanceMethod | IndexSymbolKind::ClassMethod)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexedSymbol {
    /// The symbol's name spelled in its defining language
    pub name: String,
    /// Language identifier, e.g. `swift` or `objective-c`
    pub language: String,
    pub kind: IndexSymbolKind,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexLocation {
    pub path: PathBuf,
    /// 1-based line
    pub line: u32,
    /// 1-based UTF-8 column
    pub utf8_column: u32,
}

#[derive(Debug, Clone)]
pub struct SymbolOccurrence {
    pub symbol: IndexedSymbol,
    pub location: IndexLocation,
    pub roles: SymbolRoles,
}

/// Which language service is responsible for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolProvider {
    Clang,
    Swift,
}

/// How one occurrence of the renamed symbol is used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameUsage {
    Definition,
    Call,
    Reference,
}

impl RenameUsage {
    pub fn from_roles(roles: SymbolRoles) -> RenameUsage {
        if roles.contains(SymbolRoles::DEFINITION | SymbolRoles::DECLARATION) {
            RenameUsage::Definition
        } else if roles.contains(SymbolRoles::CALL) {
            RenameUsage::Call
        } else {
            RenameUsage::Reference
        }
    }

    /// The identifier the syntactic backend expects
    pub fn name_type(self) -> &'static str {
        match self {
            RenameUsage::Definition => "definition",
            RenameUsage::Call => "call",
            RenameUsage::Reference => "reference",
        }
    }
}

/// One occurrence to rename inside a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenameLocation {
    /// 1-based line
    pub line: u32,
    /// 1-based UTF-8 column
    pub utf8_column: u32,
    pub usage: RenameUsage,
}

/// Workspace-wide symbol occurrence queries
pub trait SymbolIndex: Send + Sync {
    /// All occurrences of the USR playing any of the given roles
    fn occurrences(&self, usr: &str, roles: SymbolRoles) -> Vec<SymbolOccurrence>;

    /// Which language service indexed the file, if any
    fn symbol_provider(&self, path: &Path) -> Option<SymbolProvider>;
}

/// Index implementation backed by a prebuilt JSON dump
pub struct FileIndex {
    occurrences: Vec<(String, SymbolOccurrence)>,
    providers: HashMap<PathBuf, SymbolProvider>,
}

#[derive(Deserialize)]
struct RawIndexFile {
    occurrences: Vec<RawOccurrence>,
    #[serde(default)]
    providers: HashMap<PathBuf, String>,
}

#[derive(Deserialize)]
struct RawOccurrence {
    usr: String,
    symbol: IndexedSymbol,
    location: IndexLocation,
    roles: Vec<String>,
}

impl FileIndex {
    pub fn load(path: &Path) -> anyhow::Result<FileIndex> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read index file {}", path.display()))?;
        let raw: RawIndexFile = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse index file {}", path.display()))?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawIndexFile) -> FileIndex {
        let occurrences = raw
            .occurrences
            .into_iter()
            .map(|occurrence| {
                let roles = SymbolRoles::from_names(&occurrence.roles);
                (
                    occurrence.usr,
                    SymbolOccurrence {
                        symbol: occurrence.symbol,
                        location: occurrence.location,
                        roles,
                    },
                )
            })
            .collect();
        let providers = raw
            .providers
            .into_iter()
            .filter_map(|(path, provider)| {
                let provider = match provider.as_str() {
                    "clang" => SymbolProvider::Clang,
                    "swift" => SymbolProvider::Swift,
                    _ => return None,
                };
                Some((path, provider))
            })
            .collect();
        FileIndex {
            occurrences,
            providers,
        }
    }
}

impl SymbolIndex for FileIndex {
    fn occurrences(&self, usr: &str, roles: SymbolRoles) -> Vec<SymbolOccurrence> {
        self.occurrences
            .iter()
            .filter(|(occurrence_usr, occurrence)| {
                occurrence_usr == usr && occurrence.roles.contains(roles)
            })
            .map(|(_, occurrence)| occurrence.clone())
            .collect()
    }

    fn symbol_provider(&self, path: &Path) -> Option<SymbolProvider> {
        if let Some(provider) = self.providers.get(path) {
            return Some(*provider);
        }
        // Fall back to the file extension for paths the dump does not list
        match path.extension()?.to_str()? {
            "swift" => Some(SymbolProvider::Swift),
            "c" | "h" | "cpp" | "cc" | "cxx" | "hpp" | "m" | "mm" => Some(SymbolProvider::Clang),
            _ => None,
        }
    }
}
