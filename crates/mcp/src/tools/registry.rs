// Tool registry and the invocation wrapper shared by every tool

use crate::tools::ToolDescriptor;
use std::collections::HashMap;
use std::sync::Arc;
use study_core::ToolResult;

/// Longest result prefix written to the success log
const RESULT_PREVIEW_CHARS: usize = 100;

/// Tool executor trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Describe the tool's name and parameters. Called once, at registration.
    fn descriptor(&self) -> ToolDescriptor;

    /// Execute the tool with given arguments
    async fn execute(&self, arguments: serde_json::Value) -> ToolResult<String>;
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Tool '{0}' is already registered")]
    Duplicate(String),
}

/// A registered tool together with the descriptor captured at registration
#[derive(Clone)]
pub struct RegisteredTool {
    descriptor: Arc<ToolDescriptor>,
    tool: Arc<dyn Tool>,
}

impl RegisteredTool {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    /// Invoke the tool, logging the call, its outcome and any failure.
    ///
    /// Errors are returned exactly as the tool produced them.
    pub async fn invoke(&self, arguments: serde_json::Value) -> ToolResult<String> {
        let name = self.name();
        tracing::info!(tool = name, arguments = %arguments, "Tool call");

        match self.tool.execute(arguments).await {
            Ok(output) => {
                tracing::info!(tool = name, result_preview = %preview(&output), "Tool success");
                Ok(output)
            }
            Err(e) => {
                tracing::error!(tool = name, kind = e.kind(), error = %e, "Tool failed");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("name", &self.descriptor.name)
            .finish()
    }
}

fn preview(output: &str) -> &str {
    match output.char_indices().nth(RESULT_PREVIEW_CHARS) {
        Some((end, _)) => &output[..end],
        None => output,
    }
}

/// Tool registry, filled once at startup and read-only afterwards.
///
/// Listing order is registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Registering a name twice is an error.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let descriptor = tool.descriptor();
        if self.by_name.contains_key(&descriptor.name) {
            return Err(RegistryError::Duplicate(descriptor.name));
        }

        self.by_name.insert(descriptor.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool {
            descriptor: Arc::new(descriptor),
            tool,
        });
        Ok(())
    }

    /// Get a tool by name
    pub fn lookup(&self, name: &str) -> Option<&RegisteredTool> {
        self.by_name.get(name).map(|&index| &self.tools[index])
    }

    /// All descriptors in registration order
    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor().clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
