//! MCP server handler implementation.
//!
//! Routes tool calls to the engine.
use crate::tools::cache::{CacheGetParams, CachePurgeParams, get_impl, purge_impl};
use crate::tools::edge_control::{EdgeControlParams, control_impl};
use crate::tools::edge_fetch::{EdgeFetchParams, fetch_impl};

use edgecache_engine::Engine;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The MCP server handler for edgecache.
#[derive(Clone)]
pub struct EdgeCacheServer {
    engine: Engine,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl EdgeCacheServer {
    pub fn new(engine: Engine) -> Self {
        Self { engine, tool_router: Self::tool_router() }
    }

    /// Send a page request through the engine.
    #[tool(
        description = "Request a URL through the edge cache. Same-origin GETs are served by the caching strategy for the URL's asset class; everything else goes to the network. Returns status, headers, body and where the response came from."
    )]
    async fn edge_fetch(&self, params: Parameters<EdgeFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.engine, params.0).await
    }

    /// Send a control message: SKIP_WAITING, CLEAR_CACHE or GET_VERSION.
    #[tool(description = "Send a control message to the engine: SKIP_WAITING, CLEAR_CACHE or GET_VERSION.")]
    async fn edge_control(&self, params: Parameters<EdgeControlParams>) -> Result<CallToolResult, McpError> {
        control_impl(&self.engine, params.0).await
    }

    #[tool(description = "Inspect the current cache generation's entry for a URL.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.engine, params.0).await
    }

    #[tool(description = "Delete the current cache generation's entry for a URL.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.engine, params.0).await
    }
}

impl ServerHandler for EdgeCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "edgecache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
