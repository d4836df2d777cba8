//! Error taxonomy shared by every tool.

/// Result type for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Failures a tool can report to its caller.
///
/// Tools log at the point of failure and return the error unchanged; only the
/// dispatch endpoint and the HTTP handlers turn it into a user-facing response.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Required configuration is missing; no external call was attempted.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The text-generation service answered with an error.
    #[error("Upstream service error (status {status}): {details}")]
    Upstream { status: u16, details: String },

    /// The text-generation service did not answer in time.
    #[error("Upstream service timed out: {0}")]
    UpstreamTimeout(String),

    /// No tool is registered under the requested name.
    #[error("Method '{0}' not found")]
    UnknownMethod(String),

    /// Missing or invalid input.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// The progress store failed during a read or write.
    #[error("Error recording progress: {0:#}")]
    Persistence(anyhow::Error),
}

impl ToolError {
    /// Stable label used in structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Upstream { .. } => "upstream",
            Self::UpstreamTimeout(_) => "upstream_timeout",
            Self::UnknownMethod(_) => "unknown_method",
            Self::MalformedRequest(_) => "malformed_request",
            Self::Persistence(_) => "persistence",
        }
    }

    /// Transient failures that may succeed when retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::UpstreamTimeout(_) => true,
            Self::Upstream { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest(message.into())
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedRequest(format!("Invalid arguments: {}", err))
    }
}
