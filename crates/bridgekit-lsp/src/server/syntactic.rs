//! Syntactic rename-range extraction through the Swift backend
//!
//! For a list of known occurrences of a name, the backend reports each
//! occurrence's pieces with their syntactic category. The request carries the
//! source text itself: it is answered purely syntactically, without
//! consulting whatever document version the backend has open.

use log::warn;

use crate::error::RenameError;
use super::backend::{
    RawRenameLocation, RenameLocationsGroup, SwiftBackend, SyntacticRenameRangesRequest,
};
use super::document::DocumentSnapshot;
use super::index::RenameLocation;
use super::pieces::{classify_piece, CategorizedName, NameContext};

/// Ask the backend for the categorized pieces of every occurrence, in
/// occurrence order.
pub async fn syntactic_ranges(
    backend: &dyn SwiftBackend,
    locations: &[RenameLocation],
    old_name: &str,
    snapshot: &DocumentSnapshot,
) -> Result<Vec<CategorizedName>, RenameError> {
    let raw_locations = locations
        .iter()
        .map(|location| RawRenameLocation {
            line: location.line,
            column: location.utf8_column,
            name_type: location.usage.name_type().to_string(),
        })
        .collect();

    let request = SyntacticRenameRangesRequest {
        sourcefile: snapshot.sourcefile(),
        sourcetext: snapshot.text().to_string(),
        rename_locations: vec![RenameLocationsGroup {
            locations: raw_locations,
            name: old_name.to_string(),
        }],
    };
    let response = backend.syntactic_rename_ranges(request).await?;

    let mut occurrences = Vec::with_capacity(response.categorized_ranges.len());
    for categorized in response.categorized_ranges {
        let context = NameContext::from_identifier(&categorized.category).ok_or_else(|| {
            RenameError::Internal(format!(
                "unknown rename range category: {}",
                categorized.category
            ))
        })?;

        let mut pieces = Vec::with_capacity(categorized.ranges.len());
        for raw in categorized.ranges {
            match classify_piece(&raw, snapshot) {
                Some(piece) => pieces.push(piece),
                None => {
                    // A piece the snapshot cannot locate is dropped; the rest
                    // of the occurrence still renames.
                    warn!(
                        "dropping rename piece {}:{} ({}) in {}",
                        raw.line,
                        raw.column,
                        raw.kind,
                        snapshot.uri()
                    );
                }
            }
        }
        occurrences.push(CategorizedName { context, pieces });
    }
    Ok(occurrences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::backend::{
        BackendError, NameTranslationRequest, NameTranslationResponse, RawCategorizedRanges,
        RawPieceRange, RelatedIdentifiersRequest, RelatedIdentifiersResponse,
        SwiftSymbolInfoRequest, SymbolDetail, SyntacticRenameRangesResponse,
    };
    use crate::server::document::Language;
    use crate::server::index::RenameUsage;
    use crate::server::pieces::PieceKind;
    use tower_lsp::async_trait;
    use tower_lsp::lsp_types::{Position, Url};

    struct FixedRanges {
        response: SyntacticRenameRangesResponse,
    }

    #[async_trait]
    impl SwiftBackend for FixedRanges {
        async fn translate_name(
            &self,
            _request: NameTranslationRequest,
        ) -> Result<NameTranslationResponse, BackendError> {
            unimplemented!("not used by syntactic tests")
        }

        async fn syntactic_rename_ranges(
            &self,
            _request: SyntacticRenameRangesRequest,
        ) -> Result<SyntacticRenameRangesResponse, BackendError> {
            Ok(self.response.clone())
        }

        async fn related_identifiers(
            &self,
            _request: RelatedIdentifiersRequest,
        ) -> Result<RelatedIdentifiersResponse, BackendError> {
            unimplemented!("not used by syntactic tests")
        }

        async fn symbol_info(
            &self,
            _request: SwiftSymbolInfoRequest,
        ) -> Result<Vec<SymbolDetail>, BackendError> {
            unimplemented!("not used by syntactic tests")
        }
    }

    fn snapshot() -> DocumentSnapshot {
        DocumentSnapshot::new(
            Url::parse("file:///test.swift").unwrap(),
            Language::Swift,
            "func foo(a: Int) {}\nfoo(a: 1)\n".to_string(),
        )
    }

    fn raw(line: u32, column: u32, end_column: u32, kind: &str) -> RawPieceRange {
        RawPieceRange {
            line,
            column,
            end_line: line,
            end_column,
            kind: kind.to_string(),
            arg_index: None,
        }
    }

    fn locations() -> Vec<RenameLocation> {
        vec![
            RenameLocation { line: 1, utf8_column: 6, usage: RenameUsage::Definition },
            RenameLocation { line: 2, utf8_column: 1, usage: RenameUsage::Call },
        ]
    }

    #[tokio::test]
    async fn test_occurrences_preserve_order_and_context() {
        let backend = FixedRanges {
            response: SyntacticRenameRangesResponse {
                categorized_ranges: vec![
                    RawCategorizedRanges {
                        category: "active".to_string(),
                        ranges: vec![raw(1, 6, 9, "basename")],
                    },
                    RawCategorizedRanges {
                        category: "comment".to_string(),
                        ranges: vec![raw(2, 1, 4, "basename")],
                    },
                ],
            },
        };

        let occurrences = syntactic_ranges(&backend, &locations(), "foo(a:)", &snapshot())
            .await
            .unwrap();
        assert_eq!(occurrences.len(), 2);
        assert_eq!(occurrences[0].context, NameContext::ActiveCode);
        assert_eq!(occurrences[0].pieces.len(), 1);
        assert_eq!(occurrences[0].pieces[0].kind, PieceKind::BaseName);
        assert_eq!(
            occurrences[0].pieces[0].range.start,
            Position { line: 0, character: 5 }
        );
        assert_eq!(occurrences[1].context, NameContext::Comment);
    }

    #[tokio::test]
    async fn test_unlocatable_pieces_are_dropped() {
        let backend = FixedRanges {
            response: SyntacticRenameRangesResponse {
                categorized_ranges: vec![RawCategorizedRanges {
                    category: "active".to_string(),
                    ranges: vec![raw(1, 6, 9, "basename"), raw(99, 1, 2, "basename")],
                }],
            },
        };

        let occurrences = syntactic_ranges(&backend, &locations(), "foo(a:)", &snapshot())
            .await
            .unwrap();
        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].pieces.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_category_fails() {
        let backend = FixedRanges {
            response: SyntacticRenameRangesResponse {
                categorized_ranges: vec![RawCategorizedRanges {
                    category: "nonsense".to_string(),
                    ranges: vec![],
                }],
            },
        };

        let result = syntactic_ranges(&backend, &locations(), "foo(a:)", &snapshot()).await;
        assert!(matches!(result, Err(RenameError::Internal(_))));
    }
}
