// Core types and functionality for the study assistant

pub mod error;
pub mod generation;
pub mod progress;
pub mod storage;
pub mod types;

pub use error::{ToolError, ToolResult};
pub use generation::{GenerationRequest, GeneratorConfig, OpenAiGenerator, RetryConfig, TextGenerator};
pub use progress::{ProgressReport, ProgressTracker};
pub use types::*;
