//! The closed taxonomy of rename pieces
//!
//! Each occurrence of a compound name decomposes into pieces: the base name,
//! external labels, internal names, call-site colons, and insertion anchors.
//! The composer's case analysis depends on these being tagged variants, so
//! backend identifiers are classified here, at the edge, and nothing
//! downstream ever sees a raw string.

use tower_lsp::lsp_types::Range;

use super::backend::RawPieceRange;
use super::document::DocumentSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    BaseName,
    /// A base name that is a language keyword (`init`, `subscript`); never
    /// renamed, though its labels still are
    KeywordBaseName,
    /// Internal parameter name at a declaration
    ParameterName,
    /// Internal parameter name that must not collapse with its label
    NonCollapsibleParameterName,
    /// External label at a declaration
    DeclArgumentLabel,
    /// External label at a call site
    CallArgumentLabel,
    /// The `:` and following space after a call-site label
    CallArgumentColon,
    /// Empty range at an unnamed call argument, anchoring label insertion
    CallArgumentCombined,
    /// Label inside a `#selector`-style compound reference
    SelectorArgumentLabel,
}

impl PieceKind {
    pub fn from_identifier(identifier: &str) -> Option<PieceKind> {
        match identifier {
            "basename" => Some(PieceKind::BaseName),
            "keyword-basename" => Some(PieceKind::KeywordBaseName),
            "param-name" => Some(PieceKind::ParameterName),
            "noncollapsible-param-name" => Some(PieceKind::NonCollapsibleParameterName),
            "decl-arg-label" => Some(PieceKind::DeclArgumentLabel),
            "call-arg-label" => Some(PieceKind::CallArgumentLabel),
            "call-arg-colon" => Some(PieceKind::CallArgumentColon),
            "call-arg-combined" => Some(PieceKind::CallArgumentCombined),
            "selector-arg-label" => Some(PieceKind::SelectorArgumentLabel),
            _ => None,
        }
    }
}

/// The syntactic context an occurrence was matched in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameContext {
    Unmatched,
    Mismatch,
    ActiveCode,
    InactiveCode,
    StringLiteral,
    Selector,
    Comment,
}

impl NameContext {
    pub fn from_identifier(identifier: &str) -> Option<NameContext> {
        match identifier {
            "unmatched" => Some(NameContext::Unmatched),
            "mismatch" => Some(NameContext::Mismatch),
            "active" => Some(NameContext::ActiveCode),
            "inactive" => Some(NameContext::InactiveCode),
            "string" => Some(NameContext::StringLiteral),
            "selector" => Some(NameContext::Selector),
            "comment" => Some(NameContext::Comment),
            _ => None,
        }
    }

    /// Occurrences in strings and comments are matched but never edited
    pub fn is_renamed(self) -> bool {
        matches!(
            self,
            NameContext::ActiveCode | NameContext::InactiveCode | NameContext::Selector
        )
    }
}

/// One contiguous range at one occurrence, classified by its role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub range: Range,
    pub kind: PieceKind,
    /// Zero-based position in the parameter list; absent for base names
    pub parameter_index: Option<usize>,
}

impl Piece {
    pub fn is_empty_range(&self) -> bool {
        self.range.start == self.range.end
    }
}

/// One occurrence: its pieces plus the context they were matched in
#[derive(Debug, Clone, PartialEq)]
pub struct CategorizedName {
    pub context: NameContext,
    pub pieces: Vec<Piece>,
}

/// Convert one backend-reported range into a `Piece`.
///
/// Returns `None` when the kind identifier is outside the closed set or the
/// coordinates cannot be located in the snapshot.
pub fn classify_piece(raw: &RawPieceRange, snapshot: &DocumentSnapshot) -> Option<Piece> {
    let kind = PieceKind::from_identifier(&raw.kind)?;
    let start = snapshot.position_from_utf8(raw.line, raw.column)?;
    let end = snapshot.position_from_utf8(raw.end_line, raw.end_column)?;
    Some(Piece {
        range: Range { start, end },
        kind,
        parameter_index: raw.arg_index,
    })
}
