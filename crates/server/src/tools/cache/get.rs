//! cache_get tool implementation.
//!
//! Reads the current generation's entry for a URL without touching the network.

use edgecache_core::Error;
use edgecache_engine::Engine;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::{resolve_url, to_text};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL, or a path relative to the configured origin.
    pub url: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize)]
pub struct CacheGetOutput {
    pub generation: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// RFC 3339 capture time, if the entry carries a readable Date header.
    pub captured_at: Option<String>,
    pub body_bytes: usize,
}

pub async fn get_impl(engine: &Engine, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = resolve_url(engine, &params.url)?;
    let entry = engine
        .cached(&url)
        .await?
        .ok_or_else(|| Error::CacheMiss(url.to_string()))?;

    let output = CacheGetOutput {
        generation: engine.cache_name(),
        url: url.to_string(),
        status: entry.status,
        captured_at: entry.captured_at().map(|t| t.to_rfc3339()),
        body_bytes: entry.body.len(),
        headers: entry.headers,
    };

    Ok(CallToolResult::success(vec![Content::text(to_text(&output)?)]))
}
