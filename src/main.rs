//! Firefly III MCP server entry point.
//!
//! Reads `FIREFLY_URL` and `FIREFLY_TOKEN` from the environment and serves
//! MCP tools over stdio. Missing settings are logged but do not stop the
//! server, so the diagnostic tools can report them.

extern crate alloc;

mod cache;
mod client;
mod config;
mod diagnostics;
mod error;
mod models;
mod params;
mod resources;
mod response;
mod server;

use rmcp::ServiceExt;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use crate::server::FireflyMcpServer;

/// Runs the MCP server.
///
/// # Errors
///
/// Returns an error if the stdio transport fails to start or stops with an
/// error.
async fn run() -> Result<(), Box<dyn core::error::Error>> {
    // Log to stderr; stdout carries the MCP stdio transport.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting Firefly III MCP server");

    let settings = Settings::from_env();
    if settings.is_complete() {
        tracing::info!(
            url = settings.url.as_deref().unwrap_or_default(),
            "Firefly III settings loaded"
        );
    } else {
        tracing::warn!(
            url_set = settings.url.is_some(),
            token_set = settings.token.is_some(),
            "FIREFLY_URL or FIREFLY_TOKEN is not set; API tools will report a configuration error"
        );
    }

    let mcp_server = FireflyMcpServer::new(settings);
    let transport = (tokio::io::stdin(), tokio::io::stdout());
    let service = mcp_server.serve(transport).await?;

    tracing::info!("MCP server running on stdio");
    let _quit_reason = service.waiting().await?;
    tracing::info!("MCP server stopped");

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!(%err, "fatal error");
        std::process::exit(1);
    }
}
