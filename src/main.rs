//! Customer Registry MCP Server - Main entry point
//!
//! Serves the customer registry to MCP clients over stdio, backed by either
//! Cloud Firestore or an in-memory store.

use anyhow::Result;
use customer_registry_mcp::client::{AsyncFirestoreClient, AsyncFirestoreClientImpl};
use customer_registry_mcp::config::StoreBackend;
use customer_registry_mcp::repositories::{
    CustomerRepository, FirestoreCustomerRepository, InMemoryCustomerRepository,
};
use customer_registry_mcp::{Config, CustomerRegistryServer, FirestoreClient, Metrics};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let loaded = Config::from_env();

    // Logs go to stderr; stdout carries MCP messages.
    let log_level = loaded
        .as_ref()
        .map(|cfg| cfg.log_level.as_str())
        .unwrap_or("error");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("error"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match loaded {
        Ok(cfg) => {
            info!("Configuration loaded successfully");
            cfg
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let metrics = Metrics::new();
    let repository: Arc<dyn CustomerRepository> = match config.backend {
        StoreBackend::Firestore => {
            info!(
                "Using Firestore project '{}' (database {}) at {}",
                config.firestore_project_id, config.firestore_database, config.firestore_base_url
            );
            let sync_client = FirestoreClient::new(&config, metrics.clone());
            let client =
                Arc::new(AsyncFirestoreClientImpl::new(sync_client)) as Arc<dyn AsyncFirestoreClient>;
            Arc::new(FirestoreCustomerRepository::new(client))
        }
        StoreBackend::Memory => {
            info!("Using in-memory store; records are lost on exit");
            Arc::new(InMemoryCustomerRepository::new())
        }
    };

    let server = CustomerRegistryServer::new(repository, &config, metrics.clone());
    info!(
        "Page size {} (max {}), stats cache TTL {}s",
        config.default_page_size, config.max_page_size, config.stats_cache_ttl_seconds
    );

    info!("Starting MCP server with stdio transport");
    customer_registry_mcp::server::run_server(server).await?;

    let summary = metrics.summary();
    info!(
        "Shutdown: {} store requests ({} errors, avg {:.1}ms), {} writes, {} searches",
        summary.store_requests_total,
        summary.store_errors_total,
        summary.store_duration_avg_ms,
        summary.customers_written_total,
        summary.searches_total
    );
    Ok(())
}
