//! MCP server for the customer registry.
//!
//! Exposes the registry to AI assistants through the Model Context Protocol
//! over stdio.

pub mod handlers;

pub use handlers::CustomerRegistryServer;

use anyhow::Result;
use rmcp::transport::io::stdio;
use rmcp::ServiceExt;

/// Serve `server` over stdin/stdout until the client disconnects.
pub async fn run_server(server: CustomerRegistryServer) -> Result<()> {
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}
