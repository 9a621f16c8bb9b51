//! edge_control tool implementation.

use edgecache_core::Error;
use edgecache_engine::{ControlMessage, ControlReply, Engine};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use super::to_text;

/// Parameters for the edge_control tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EdgeControlParams {
    /// SKIP_WAITING, CLEAR_CACHE or GET_VERSION.
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeControlOutput {
    #[serde(rename = "type")]
    pub kind: String,
    /// Absent for SKIP_WAITING.
    pub reply: Option<ControlReply>,
}

pub async fn control_impl(engine: &Engine, params: EdgeControlParams) -> Result<CallToolResult, McpError> {
    let kind = params.kind.trim().to_uppercase();
    let message: ControlMessage = serde_json::from_value(serde_json::json!({ "type": kind }))
        .map_err(|_| Error::InvalidInput(format!("unknown control message: {}", params.kind)))?;

    let (tx, rx) = oneshot::channel();
    engine.on_control_message(message, Some(tx)).await;
    // SKIP_WAITING drops the sender without answering
    let reply = rx.await.ok();

    let output = EdgeControlOutput { kind, reply };
    Ok(CallToolResult::success(vec![Content::text(to_text(&output)?)]))
}
