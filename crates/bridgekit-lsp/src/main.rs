use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tower_lsp::{LspService, Server};

use bridgekit_lsp::server::backend::SubprocessBackend;
use bridgekit_lsp::server::index::{FileIndex, SymbolIndex};
use bridgekit_lsp::server::{BridgeLanguageServer, ServerConnections};

#[derive(Parser)]
#[command(name = "bridgekit-lsp", about = "Cross-language rename server for Swift and C-family sources")]
#[command(version)]
struct Cli {
    /// Use stdio transport
    #[arg(long)]
    stdio: bool,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Command to spawn as the Swift backend
    #[arg(long)]
    swift_backend: String,

    /// Command to spawn as the clang backend
    #[arg(long)]
    clang_backend: String,

    /// Path to a prebuilt symbol index dump
    #[arg(long)]
    index: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging goes to stderr; stdout carries JSON-RPC.
    env_logger::Builder::new()
        .filter_level(match cli.log_level.as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            _ => log::LevelFilter::Warn,
        })
        .init();

    if !cli.stdio {
        eprintln!("Note: stdio is the only supported transport");
    }
    eprintln!("Starting bridgekit language server...");

    let swift = SubprocessBackend::spawn(&cli.swift_backend, &[])
        .with_context(|| format!("failed to spawn Swift backend {}", cli.swift_backend))?;
    let clang = SubprocessBackend::spawn(&cli.clang_backend, &[])
        .with_context(|| format!("failed to spawn clang backend {}", cli.clang_backend))?;

    let index = match &cli.index {
        Some(path) => Some(Arc::new(FileIndex::load(path)?) as Arc<dyn SymbolIndex>),
        None => None,
    };

    let swift = Arc::new(swift);
    let clang = Arc::new(clang);
    let (service, socket) = LspService::new(move |client| {
        BridgeLanguageServer::new(
            client,
            ServerConnections {
                swift: swift.clone(),
                clang: clang.clone(),
                index: index.clone(),
            },
        )
    });

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();
    Server::new(stdin, stdout, socket).serve(service).await;

    eprintln!("bridgekit language server stopped.");
    Ok(())
}
