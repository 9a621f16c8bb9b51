//! edge_fetch tool implementation.
//!
//! Sends one page request through the engine.

use edgecache_client::{Method, PageRequest};
use edgecache_core::Error;
use edgecache_engine::{Engine, ResponseSource};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{resolve_url, to_text};

/// Parameters for the edge_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EdgeFetchParams {
    /// Absolute URL, or a path relative to the configured origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,
}

/// Output from the edge_fetch tool.
#[derive(Debug, Clone, Serialize)]
pub struct EdgeFetchOutput {
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
    pub source: ResponseSource,
}

pub async fn fetch_impl(engine: &Engine, params: EdgeFetchParams) -> Result<CallToolResult, McpError> {
    let url = resolve_url(engine, &params.url)?;
    let method = match params.method.as_deref() {
        None => Method::GET,
        Some(m) => Method::from_bytes(m.trim().to_uppercase().as_bytes())
            .map_err(|_| Error::InvalidInput(format!("unsupported method: {m}")))?,
    };

    let served = engine.on_request(&PageRequest::new(method, url.clone())).await?;

    let output = EdgeFetchOutput {
        url: url.to_string(),
        status: served.response.status,
        body: String::from_utf8_lossy(&served.response.body).into_owned(),
        headers: served.response.headers,
        source: served.source,
    };

    Ok(CallToolResult::success(vec![Content::text(to_text(&output)?)]))
}
