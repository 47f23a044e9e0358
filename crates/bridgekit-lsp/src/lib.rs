//! bridgekit: a language server bridging Swift-family and C-family sources
//!
//! The crate's center is [`server::rename::RenameEngine`], which computes
//! consistent cross-language renames; [`server::BridgeLanguageServer`] wires
//! it to an LSP client over tower-lsp.

pub mod error;
pub mod server;
