// Resolve a tool call against the registry and wrap the outcome in an envelope

use crate::protocol::{
    InitializeResult, JsonRpcError, JsonRpcResponse, ListToolsResult, ServerInfo, ToolCallRequest,
    PROTOCOL_VERSION,
};
use crate::tools::ToolRegistry;
use std::sync::Arc;

/// Dispatches tool calls and answers discovery requests
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    server_info: ServerInfo,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            server_info: ServerInfo::default(),
        }
    }

    pub fn with_server_info(mut self, server_info: ServerInfo) -> Self {
        self.server_info = server_info;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Every registered tool, in registration order
    pub fn list_tools(&self) -> ListToolsResult {
        ListToolsResult {
            tools: self.registry.list(),
        }
    }

    /// Discovery payload with protocol version and server identity
    pub fn initialize(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: serde_json::json!({}),
            server_info: self.server_info.clone(),
            tools: self.registry.list(),
        }
    }

    /// Invoke the requested tool. The request id is echoed back unchanged.
    pub async fn dispatch(&self, request: ToolCallRequest) -> JsonRpcResponse {
        let id = request.id.clone();

        let method = match request.method_name() {
            Some(method) => method,
            None => {
                tracing::warn!(id = %id, "Tool call without method");
                return JsonRpcResponse::error(id, JsonRpcError::method_not_provided());
            }
        };

        let tool = match self.registry.lookup(method) {
            Some(tool) => tool,
            None => {
                tracing::warn!(id = %id, method, "Unknown tool requested");
                return JsonRpcResponse::error(id, JsonRpcError::method_not_found(method));
            }
        };

        match tool.invoke(request.arguments()).await {
            Ok(output) => JsonRpcResponse::success(id, serde_json::Value::String(output)),
            Err(e) => {
                tracing::error!(method, kind = e.kind(), error = %e, "Tool execution error");
                JsonRpcResponse::error(id, JsonRpcError::tool_execution(&e))
            }
        }
    }
}
