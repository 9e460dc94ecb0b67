//! Streamable HTTP host for the MCP server.
//!
//! Every MCP session gets a clone of the same [`BitpinServer`], so sessions
//! share one connection pool and one token pair.

use std::net::SocketAddr;

use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use tokio::net::TcpListener;

use crate::mcp::BitpinServer;

/// Path the MCP endpoint is mounted at.
pub const MCP_PATH: &str = "/mcp";

/// Build the axum router exposing `server` at [`MCP_PATH`].
pub fn router(server: BitpinServer) -> axum::Router {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );

    axum::Router::new().nest_service(MCP_PATH, service)
}

/// Serve `server` on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(
    server: BitpinServer,
    listener: TcpListener,
    shutdown: F,
) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(%addr, path = MCP_PATH, "MCP HTTP endpoint listening");

    axum::serve(listener, router(server)).with_graceful_shutdown(shutdown).await
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn run(server: BitpinServer, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;

    serve(server, listener, async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutting down MCP HTTP endpoint"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        }
    })
    .await
}
