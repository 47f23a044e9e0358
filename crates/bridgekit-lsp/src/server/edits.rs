//! Text-edit composition for one occurrence of a compound name
//!
//! Given the pieces of one occurrence and the old and new compound names,
//! each piece maps to at most one edit. The interesting cases are the
//! named/unnamed label transitions: they add or delete whitespace, colons,
//! and internal names rather than replacing text in place.

use bridgekit_names::{CompoundName, Parameter};
use tower_lsp::lsp_types::{Range, TextEdit};

use super::document::DocumentSnapshot;
use super::pieces::{CategorizedName, Piece, PieceKind};

/// Compute the edits for one occurrence. Occurrences matched in strings,
/// comments, or with a mismatched shape produce nothing.
pub fn edits_for_occurrence(
    occurrence: &CategorizedName,
    old_name: &CompoundName,
    new_name: &CompoundName,
    snapshot: &DocumentSnapshot,
) -> Vec<TextEdit> {
    if !occurrence.context.is_renamed() {
        return Vec::new();
    }

    let mut edits = Vec::new();
    for piece in &occurrence.pieces {
        if let Some(edit) = edit_for_piece(piece, old_name, new_name, snapshot) {
            edits.push(edit);
        }
    }

    // An edit that reproduces the existing text is dropped, so renaming a
    // symbol to itself yields nothing.
    edits.retain(|edit| snapshot.slice(edit.range) != Some(edit.new_text.as_str()));
    edits
}

fn edit_for_piece(
    piece: &Piece,
    old_name: &CompoundName,
    new_name: &CompoundName,
    snapshot: &DocumentSnapshot,
) -> Option<TextEdit> {
    match piece.kind {
        PieceKind::BaseName => Some(replace(piece.range, new_name.base_name().to_string())),
        // Keyword bases (`init`, `subscript`) keep their spelling
        PieceKind::KeywordBaseName => None,
        PieceKind::NonCollapsibleParameterName => None,
        _ => {
            let index = piece.parameter_index?;
            let old_parameter = old_name.parameter(index)?;
            let new_parameter = new_name.parameter(index)?;
            labeled_piece_edit(piece, old_parameter, new_parameter, snapshot)
        }
    }
}

fn labeled_piece_edit(
    piece: &Piece,
    old_parameter: &Parameter,
    new_parameter: &Parameter,
    snapshot: &DocumentSnapshot,
) -> Option<TextEdit> {
    match piece.kind {
        PieceKind::ParameterName => {
            if new_parameter.is_wildcard() && piece.is_empty_range() {
                // The external label is about to disappear; keep the old
                // label alive as the internal name.
                let label = old_parameter.label()?;
                Some(replace(piece.range, format!(" {label}")))
            } else if let Some(new_label) = new_parameter.label() {
                let existing = snapshot.slice(piece.range)?;
                if existing.trim() == new_label.trim() {
                    // The internal name now matches the external label
                    Some(replace(piece.range, String::new()))
                } else {
                    None
                }
            } else {
                None
            }
        }
        PieceKind::DeclArgumentLabel => {
            if piece.is_empty_range() {
                // A new external label in front of an existing internal name
                Some(replace(
                    piece.range,
                    format!("{} ", new_parameter.label_or_underscore()),
                ))
            } else {
                Some(replace(
                    piece.range,
                    new_parameter.label_or_underscore().to_string(),
                ))
            }
        }
        PieceKind::CallArgumentLabel => Some(replace(
            piece.range,
            new_parameter.label_or_empty().to_string(),
        )),
        PieceKind::CallArgumentColon => {
            if new_parameter.is_wildcard() {
                Some(replace(piece.range, String::new()))
            } else {
                None
            }
        }
        PieceKind::CallArgumentCombined => {
            let label = new_parameter.label()?;
            Some(replace(piece.range, format!("{label}: ")))
        }
        PieceKind::SelectorArgumentLabel => Some(replace(
            piece.range,
            new_parameter.label_or_underscore().to_string(),
        )),
        PieceKind::BaseName
        | PieceKind::KeywordBaseName
        | PieceKind::NonCollapsibleParameterName => None,
    }
}

fn replace(range: Range, new_text: String) -> TextEdit {
    TextEdit { range, new_text }
}
