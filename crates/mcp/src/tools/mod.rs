pub mod descriptor;
pub mod progress;
pub mod registry;
pub mod study;

pub use descriptor::{ParamType, ParameterSpec, SchemaType, ToolDescriptor, ToolDescriptorBuilder};
pub use progress::TrackProgressTool;
pub use registry::{RegisteredTool, RegistryError, Tool, ToolRegistry};
pub use study::{
    FlashcardsTool, QuizTool, RecommendResourcesTool, StudyPlanTool, SummarizeTextTool,
};

use std::sync::Arc;
use study_core::{ProgressTracker, TextGenerator};

/// Build the registry with every study tool, in manifest order
pub fn study_registry(
    generator: Arc<dyn TextGenerator>,
    tracker: Arc<ProgressTracker>,
) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();

    registry.register(Arc::new(StudyPlanTool::new(generator.clone())))?;
    registry.register(Arc::new(SummarizeTextTool::new(generator.clone())))?;
    registry.register(Arc::new(QuizTool::new(generator.clone())))?;
    registry.register(Arc::new(FlashcardsTool::new(generator.clone())))?;
    registry.register(Arc::new(RecommendResourcesTool::new(generator)))?;
    registry.register(Arc::new(TrackProgressTool::new(tracker)))?;

    Ok(registry)
}
