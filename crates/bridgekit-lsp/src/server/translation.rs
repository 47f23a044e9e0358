//! Cross-language name translation
//!
//! A renamed symbol is identified by its definition site: the name spelled in
//! the defining language, where that definition lives, and whether it is an
//! Objective-C selector. Both translated spellings are computed lazily
//! through the Swift backend and memoized, so any number of per-file tasks
//! asking for the same spelling trigger exactly one backend request.

use std::sync::Arc;

use bridgekit_names::{selector_pieces, CompoundName};
use tokio::sync::OnceCell;
use tower_lsp::lsp_types::{Position, Url};

use crate::error::RenameError;
use super::backend::{NameKind, NameTranslationRequest, SwiftBackend};
use super::document::{DocumentSnapshot, Language, LanguageFamily};

/// Whether a name is written as a Swift compound name (`base(a:b:)`)
fn spelled_as_compound(name: &str) -> bool {
    name.contains('(')
}

/// Whether a name is written as a clang-side selector (`doThing:with:`)
fn spelled_as_selector(name: &str) -> bool {
    !name.contains('(') && name.contains(':')
}

/// The definition-site identity of the symbol being renamed, with lazily
/// computed spellings for both halves of the bridge.
///
/// All fields refer to the declaring site regardless of where the rename was
/// invoked. The new name of a rename is represented the same way: a clone of
/// the old identity with the definition name swapped and fresh caches.
pub struct TranslatableName {
    definition_name: String,
    definition_language: Language,
    definition_snapshot: Arc<DocumentSnapshot>,
    definition_position: Position,
    is_objc_selector: bool,
    clang_spelling: OnceCell<String>,
    swift_spelling: OnceCell<String>,
}

impl TranslatableName {
    pub fn new(
        definition_name: String,
        definition_language: Language,
        definition_snapshot: Arc<DocumentSnapshot>,
        definition_position: Position,
        is_objc_selector: bool,
    ) -> Self {
        Self {
            definition_name,
            definition_language,
            definition_snapshot,
            definition_position,
            is_objc_selector,
            clang_spelling: OnceCell::new(),
            swift_spelling: OnceCell::new(),
        }
    }

    /// The same identity under a different name, with empty caches
    pub fn with_definition_name(&self, definition_name: String) -> Self {
        Self::new(
            definition_name,
            self.definition_language,
            Arc::clone(&self.definition_snapshot),
            self.definition_position,
            self.is_objc_selector,
        )
    }

    pub fn definition_name(&self) -> &str {
        &self.definition_name
    }

    pub fn definition_language(&self) -> Language {
        self.definition_language
    }

    pub fn definition_uri(&self) -> &Url {
        self.definition_snapshot.uri()
    }

    /// The symbol's clang-side spelling.
    ///
    /// Selector- and plain-spelled names of clang definitions are already in
    /// clang form; Swift-spelled names go through the backend's name
    /// translation, anchored at the definition.
    pub async fn clang_name(&self, swift: &dyn SwiftBackend) -> Result<String, RenameError> {
        let needs_translation = match self.definition_language.family() {
            LanguageFamily::Clang => spelled_as_compound(&self.definition_name),
            LanguageFamily::Swift => !spelled_as_selector(&self.definition_name),
        };
        if !needs_translation {
            return Ok(self.definition_name.clone());
        }

        let spelling = self
            .clang_spelling
            .get_or_try_init(|| self.translate_swift_to_clang(swift))
            .await?;
        Ok(spelling.clone())
    }

    /// The symbol's Swift-side spelling.
    ///
    /// Translating a selector requires a Swift-side anchor, so the caller
    /// passes a position inside a Swift snapshot that references the symbol.
    pub async fn swift_name(
        &self,
        swift: &dyn SwiftBackend,
        position: Position,
        snapshot: &DocumentSnapshot,
    ) -> Result<String, RenameError> {
        let needs_translation = match self.definition_language.family() {
            LanguageFamily::Swift => spelled_as_selector(&self.definition_name),
            LanguageFamily::Clang => !spelled_as_compound(&self.definition_name),
        };
        if !needs_translation {
            return Ok(self.definition_name.clone());
        }

        let spelling = self
            .swift_spelling
            .get_or_try_init(|| self.translate_clang_to_swift(swift, position, snapshot))
            .await?;
        Ok(spelling.clone())
    }

    async fn translate_swift_to_clang(
        &self,
        swift: &dyn SwiftBackend,
    ) -> Result<String, RenameError> {
        let offset = self
            .definition_snapshot
            .offset(self.definition_position)
            .ok_or(RenameError::CannotComputeOffset(self.definition_position))?;

        let name = CompoundName::parse(&self.definition_name);
        let request = NameTranslationRequest {
            sourcefile: self.definition_snapshot.sourcefile(),
            compilerargs: Vec::new(),
            offset,
            name_kind: NameKind::Swift,
            base_name: Some(name.base_name().to_string()),
            arg_names: Some(
                name.parameters()
                    .iter()
                    .map(|parameter| parameter.label_or_underscore().to_string())
                    .collect(),
            ),
            selector_pieces: None,
        };
        let response = swift.translate_name(request).await?;

        let (Some(is_zero_arg), Some(pieces)) =
            (response.is_zero_arg_selector, response.selector_pieces.clone())
        else {
            return Err(RenameError::MalformedTranslationResponse {
                direction: "Swift to Clang",
                payload: format!("{response:?}"),
            });
        };

        if is_zero_arg {
            Ok(pieces.concat())
        } else {
            Ok(pieces
                .into_iter()
                .map(|piece| format!("{piece}:"))
                .collect())
        }
    }

    async fn translate_clang_to_swift(
        &self,
        swift: &dyn SwiftBackend,
        position: Position,
        snapshot: &DocumentSnapshot,
    ) -> Result<String, RenameError> {
        let offset = snapshot
            .offset(position)
            .ok_or(RenameError::CannotComputeOffset(position))?;

        let mut request = NameTranslationRequest {
            sourcefile: snapshot.sourcefile(),
            compilerargs: Vec::new(),
            offset,
            name_kind: NameKind::Objc,
            base_name: None,
            arg_names: None,
            selector_pieces: None,
        };
        if self.is_objc_selector {
            request.selector_pieces = Some(
                selector_pieces(&self.definition_name)
                    .into_iter()
                    .map(|piece| format!("{piece}:"))
                    .collect(),
            );
        } else {
            request.base_name = Some(self.definition_name.clone());
        }
        let response = swift.translate_name(request).await?;

        let Some(base_name) = response.base_name.clone() else {
            return Err(RenameError::MalformedTranslationResponse {
                direction: "Objective-C to Swift",
                payload: format!("{response:?}"),
            });
        };
        let arg_names = response.arg_names.unwrap_or_default();

        if arg_names.is_empty() {
            return Ok(base_name);
        }
        let mut spelling = base_name;
        spelling.push('(');
        for arg_name in &arg_names {
            if arg_name.is_empty() {
                spelling.push_str("_:");
            } else {
                spelling.push_str(arg_name);
                spelling.push(':');
            }
        }
        spelling.push(')');
        Ok(spelling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::backend::{
        BackendError, NameTranslationResponse, RelatedIdentifiersRequest,
        RelatedIdentifiersResponse, SwiftSymbolInfoRequest, SymbolDetail,
        SyntacticRenameRangesRequest, SyntacticRenameRangesResponse,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower_lsp::async_trait;

    struct FixedTranslator {
        response: NameTranslationResponse,
        calls: AtomicUsize,
        last_request: std::sync::Mutex<Option<NameTranslationRequest>>,
    }

    impl FixedTranslator {
        fn new(response: NameTranslationResponse) -> Self {
            Self {
                response,
                calls: AtomicUsize::new(0),
                last_request: std::sync::Mutex::new(None),
            }
        }

        fn last_request(&self) -> NameTranslationRequest {
            self.last_request.lock().unwrap().clone().unwrap()
        }
    }

    #[async_trait]
    impl SwiftBackend for FixedTranslator {
        async fn translate_name(
            &self,
            request: NameTranslationRequest,
        ) -> Result<NameTranslationResponse, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request);
            Ok(self.response.clone())
        }

        async fn syntactic_rename_ranges(
            &self,
            _request: SyntacticRenameRangesRequest,
        ) -> Result<SyntacticRenameRangesResponse, BackendError> {
            unimplemented!("not used by translation tests")
        }

        async fn related_identifiers(
            &self,
            _request: RelatedIdentifiersRequest,
        ) -> Result<RelatedIdentifiersResponse, BackendError> {
            unimplemented!("not used by translation tests")
        }

        async fn symbol_info(
            &self,
            _request: SwiftSymbolInfoRequest,
        ) -> Result<Vec<SymbolDetail>, BackendError> {
            unimplemented!("not used by translation tests")
        }
    }

    fn objc_snapshot() -> Arc<DocumentSnapshot> {
        Arc::new(DocumentSnapshot::new(
            Url::parse("file:///Thing.m").unwrap(),
            Language::ObjC,
            "- (void)performAction:(int)a with:(int)b;\n".to_string(),
        ))
    }

    fn swift_snapshot() -> Arc<DocumentSnapshot> {
        Arc::new(DocumentSnapshot::new(
            Url::parse("file:///Thing.swift").unwrap(),
            Language::Swift,
            "func foo(a: Int) {}\nfoo(a: 1)\n".to_string(),
        ))
    }

    fn origin() -> Position {
        Position { line: 0, character: 0 }
    }

    #[tokio::test]
    async fn test_clang_definition_clang_name_is_verbatim() {
        let name = TranslatableName::new(
            "performAction:with:".to_string(),
            Language::ObjC,
            objc_snapshot(),
            origin(),
            true,
        );
        let backend = FixedTranslator::new(NameTranslationResponse::default());

        let spelling = name.clang_name(&backend).await.unwrap();
        assert_eq!(spelling, "performAction:with:");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_clang_definition_swift_name_translates_once() {
        let name = TranslatableName::new(
            "performAction:with:".to_string(),
            Language::ObjC,
            objc_snapshot(),
            origin(),
            true,
        );
        let backend = FixedTranslator::new(NameTranslationResponse {
            base_name: Some("perform".to_string()),
            arg_names: Some(vec!["action".to_string(), "with".to_string()]),
            ..Default::default()
        });

        let snapshot = swift_snapshot();
        let first = name
            .swift_name(&backend, origin(), &snapshot)
            .await
            .unwrap();
        let second = name
            .swift_name(&backend, origin(), &snapshot)
            .await
            .unwrap();
        assert_eq!(first, "perform(action:with:)");
        assert_eq!(second, "perform(action:with:)");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

        // A selector travels as its colon-suffixed pieces
        let request = backend.last_request();
        assert_eq!(
            request.selector_pieces,
            Some(vec!["performAction:".to_string(), "with:".to_string()])
        );
        assert!(request.base_name.is_none());
    }

    #[tokio::test]
    async fn test_plain_clang_function_translates_via_base_name() {
        let name = TranslatableName::new(
            "free_buffer".to_string(),
            Language::C,
            objc_snapshot(),
            origin(),
            false,
        );
        let backend = FixedTranslator::new(NameTranslationResponse {
            base_name: Some("freeBuffer".to_string()),
            arg_names: Some(vec![]),
            ..Default::default()
        });

        let snapshot = swift_snapshot();
        assert_eq!(
            name.swift_name(&backend, origin(), &snapshot).await.unwrap(),
            "freeBuffer"
        );

        // A non-selector symbol travels as a bare base name
        let request = backend.last_request();
        assert_eq!(request.base_name.as_deref(), Some("free_buffer"));
        assert!(request.selector_pieces.is_none());
    }

    #[tokio::test]
    async fn test_swift_definition_clang_name_translates() {
        let name = TranslatableName::new(
            "foo(a:b:)".to_string(),
            Language::Swift,
            swift_snapshot(),
            origin(),
            false,
        );
        let backend = FixedTranslator::new(NameTranslationResponse {
            is_zero_arg_selector: Some(false),
            selector_pieces: Some(vec!["fooWithA".to_string(), "b".to_string()]),
            ..Default::default()
        });

        let spelling = name.clang_name(&backend).await.unwrap();
        assert_eq!(spelling, "fooWithA:b:");
    }

    #[tokio::test]
    async fn test_zero_arg_selector_has_no_colon() {
        let name = TranslatableName::new(
            "description".to_string(),
            Language::Swift,
            swift_snapshot(),
            origin(),
            false,
        );
        let backend = FixedTranslator::new(NameTranslationResponse {
            is_zero_arg_selector: Some(true),
            selector_pieces: Some(vec!["description".to_string()]),
            ..Default::default()
        });

        assert_eq!(name.clang_name(&backend).await.unwrap(), "description");
    }

    #[tokio::test]
    async fn test_swift_spelled_new_name_for_clang_definition() {
        // The replacement name of a clang-defined symbol arrives in Swift
        // spelling; its clang form goes through translation, its Swift form
        // is already there.
        let name = TranslatableName::new(
            "do(task:along:)".to_string(),
            Language::ObjC,
            objc_snapshot(),
            origin(),
            true,
        );
        let backend = FixedTranslator::new(NameTranslationResponse {
            is_zero_arg_selector: Some(false),
            selector_pieces: Some(vec!["doTask".to_string(), "along".to_string()]),
            ..Default::default()
        });

        let snapshot = swift_snapshot();
        assert_eq!(
            name.swift_name(&backend, origin(), &snapshot).await.unwrap(),
            "do(task:along:)"
        );
        assert_eq!(name.clang_name(&backend).await.unwrap(), "doTask:along:");
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let name = TranslatableName::new(
            "performAction:with:".to_string(),
            Language::ObjC,
            objc_snapshot(),
            origin(),
            true,
        );
        let backend = FixedTranslator::new(NameTranslationResponse::default());

        let snapshot = swift_snapshot();
        let result = name.swift_name(&backend, origin(), &snapshot).await;
        assert!(matches!(
            result,
            Err(RenameError::MalformedTranslationResponse { direction: "Objective-C to Swift", .. })
        ));
    }

    #[tokio::test]
    async fn test_renamed_clone_has_fresh_caches() {
        let old = TranslatableName::new(
            "performAction:with:".to_string(),
            Language::ObjC,
            objc_snapshot(),
            origin(),
            true,
        );
        let new = old.with_definition_name("doTask:along:".to_string());
        assert_eq!(new.definition_name(), "doTask:along:");
        assert_eq!(new.definition_language(), Language::ObjC);

        let backend = FixedTranslator::new(NameTranslationResponse {
            base_name: Some("do".to_string()),
            arg_names: Some(vec!["task".to_string(), "along".to_string()]),
            ..Default::default()
        });
        let snapshot = swift_snapshot();
        assert_eq!(
            new.swift_name(&backend, origin(), &snapshot).await.unwrap(),
            "do(task:along:)"
        );
    }
}
