//! Workspace root tracking
//!
//! Records the workspace folders announced by the client so rename requests
//! can be refused for documents that belong to no open workspace.

use std::sync::{Arc, RwLock};
use tower_lsp::lsp_types::Url;

#[derive(Clone, Default)]
pub struct Workspace {
    state: Arc<RwLock<WorkspaceState>>,
}

#[derive(Default)]
struct WorkspaceState {
    roots: Vec<Url>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a workspace root folder
    pub fn add_root(&self, root: Url) {
        let mut state = self.state.write().unwrap();
        if !state.roots.contains(&root) {
            state.roots.push(root);
        }
    }

    /// Whether the document belongs to any registered workspace root
    pub fn contains(&self, uri: &Url) -> bool {
        let state = self.state.read().unwrap();
        state.roots.iter().any(|root| {
            let root = root.as_str().trim_end_matches('/');
            uri.as_str()
                .strip_prefix(root)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}
