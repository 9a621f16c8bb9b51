//! edgecache server entry point.
//!
//! Boots the engine (install, then activate) and exposes it as MCP tools on
//! stdio. Logging goes to stderr to avoid interfering with the JSON-RPC
//! protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use edgecache_client::{FetchClient, FetchConfig};
use edgecache_core::{AppConfig, CacheDb};
use edgecache_engine::{Engine, EngineConfig};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    tracing::info!(origin = %config.origin, db = %config.db_path.display(), "starting edgecache on stdio transport");

    let store = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening cache at {}", config.db_path.display()))?;
    let fetcher = FetchClient::new(FetchConfig::from(&config))?;
    let engine = Engine::new(Arc::new(store), Arc::new(fetcher), EngineConfig::from_app(&config)?);

    // the MCP peer is the one page this engine controls
    let mut page = engine.sessions().connect().await;
    tokio::spawn(async move {
        while let Some(message) = page.recv().await {
            tracing::info!(?message, "page message");
        }
    });

    engine.on_install().await;
    if engine.wants_activation().await {
        engine.on_activate().await;
    }

    let handler = handler::EdgeCacheServer::new(engine.clone());
    let server = serve_server(handler, stdio()).await?;
    server.waiting().await?;

    engine.settle().await;
    Ok(())
}
