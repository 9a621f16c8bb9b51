//! cache_purge tool implementation.
//!
//! Deletes one URL's entry from the current generation.

use edgecache_engine::Engine;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::{resolve_url, to_text};

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Absolute URL, or a path relative to the configured origin.
    pub url: String,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    pub url: String,
    /// False when there was no entry to delete.
    pub deleted: bool,
}

pub async fn purge_impl(engine: &Engine, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let url = resolve_url(engine, &params.url)?;
    let deleted = engine.purge(&url).await?;
    tracing::debug!(url = %url, deleted, "purged cache entry");

    let output = CachePurgeOutput { url: url.to_string(), deleted };
    Ok(CallToolResult::success(vec![Content::text(to_text(&output)?)]))
}
