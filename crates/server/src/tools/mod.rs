//! MCP tool implementations.

pub mod cache;
pub mod edge_control;
pub mod edge_fetch;

use edgecache_client::canonicalize;
use edgecache_core::Error;
use edgecache_engine::Engine;

/// Resolve a tool's `url` argument; paths are taken relative to the origin.
fn resolve_url(engine: &Engine, url: &str) -> Result<url::Url, Error> {
    if url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()));
    }
    canonicalize(url, Some(&engine.config().origin)).map_err(|e| Error::InvalidUrl(e.to_string()))
}

fn to_text<T: serde::Serialize>(output: &T) -> Result<String, Error> {
    serde_json::to_string_pretty(output).map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))
}
