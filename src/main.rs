//! Bitpin MCP Server
//!
//! A Model Context Protocol server for the Bitpin exchange.

use rmcp::ServiceExt;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bitpin_mcp::{config::McpTransport, mcp::http, BitpinServer, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging; stdout carries the MCP protocol in stdio mode
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    tracing::info!(
        api_url = %config.api_url,
        transport = ?config.transport,
        "Starting Bitpin MCP Server"
    );

    let transport = config.transport;
    let http_bind = config.http_bind;
    let server = BitpinServer::new(config)?;

    match transport {
        McpTransport::Stdio => {
            let running = server.serve(rmcp::transport::stdio()).await?;
            running.waiting().await?;
        }
        McpTransport::Http => http::run(server, http_bind).await?,
    }

    Ok(())
}
