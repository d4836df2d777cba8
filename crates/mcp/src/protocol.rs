// Tool-call protocol types (JSON-RPC 2.0 envelope)

use crate::tools::ToolDescriptor;
use serde::{Deserialize, Serialize};

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROTOCOL_VERSION: &str = "1.0";

/// Incoming tool call.
///
/// Any JSON value parses: fields of the wrong type are read leniently so that
/// the request id can still be echoed in an error envelope. A non-string
/// `method` is kept as its JSON text and therefore never resolves to a tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "serde_json::Value")]
pub struct ToolCallRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    pub id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl From<serde_json::Value> for ToolCallRequest {
    fn from(value: serde_json::Value) -> Self {
        let mut fields = match value {
            serde_json::Value::Object(fields) => fields,
            _ => return Self::default(),
        };

        let method = match fields.remove("method") {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(method)) => Some(method),
            Some(other) => Some(other.to_string()),
        };

        Self {
            jsonrpc: fields
                .remove("jsonrpc")
                .and_then(|v| v.as_str().map(str::to_string)),
            id: fields.remove("id").unwrap_or(serde_json::Value::Null),
            method,
            params: fields.remove("params"),
        }
    }
}

impl ToolCallRequest {
    pub fn new(id: impl Into<serde_json::Value>, method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            id: id.into(),
            method: Some(method.into()),
            params: Some(params),
        }
    }

    /// Method name exactly as sent, if present and not blank
    pub fn method_name(&self) -> Option<&str> {
        self.method
            .as_deref()
            .filter(|method| !method.trim().is_empty())
    }

    /// Call arguments; missing or null params become an empty object
    pub fn arguments(&self) -> serde_json::Value {
        match &self.params {
            None | Some(serde_json::Value::Null) => serde_json::Value::Object(Default::default()),
            Some(params) => params.clone(),
        }
    }
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: serde_json::Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    pub fn error_code(&self) -> Option<i32> {
        self.error.as_ref().map(|e| e.code)
    }
}

/// JSON-RPC 2.0 Error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcError {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INTERNAL_ERROR: i32 = -32603;

    pub fn parse_error(details: impl std::fmt::Display) -> Self {
        Self {
            code: Self::PARSE_ERROR,
            message: format!("Parse error: {}", details),
        }
    }

    pub fn method_not_provided() -> Self {
        Self {
            code: Self::INVALID_REQUEST,
            message: "Method not provided".to_string(),
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: Self::METHOD_NOT_FOUND,
            message: format!("Method '{}' not found", method),
        }
    }

    pub fn tool_execution(error: impl std::fmt::Display) -> Self {
        Self {
            code: Self::INTERNAL_ERROR,
            message: format!("Tool execution error: {}", error),
        }
    }
}

/// List tools response
#[derive(Debug, Clone, Serialize)]
pub struct ListToolsResult {
    pub tools: Vec<ToolDescriptor>,
}

/// Discovery response carrying server identity alongside the tool list
#[derive(Debug, Clone, Serialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: serde_json::Value,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
    pub tools: Vec<ToolDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: "Personalized Study Assistant".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "MCP tool endpoint".to_string(),
        }
    }
}
