// Study progress tool

use crate::tools::{Tool, ToolDescriptor};
use serde::Deserialize;
use std::sync::Arc;
use study_core::{ProgressTracker, ToolError, ToolResult};

/// Tool to record study hours or report today's total
pub struct TrackProgressTool {
    tracker: Arc<ProgressTracker>,
}

impl TrackProgressTool {
    pub fn new(tracker: Arc<ProgressTracker>) -> Self {
        Self { tracker }
    }
}

#[derive(Debug, Deserialize)]
struct TrackProgressArgs {
    user_id: String,
    topic: String,
    #[serde(default)]
    hours: f64,
    #[serde(default)]
    report_only: bool,
}

#[async_trait::async_trait]
impl Tool for TrackProgressTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::builder(
            "trackProgress",
            "Records or reports study progress, aggregating hours for the same day.",
        )
        .param::<String>("user_id", "Identifier for the user")
        .param::<String>("topic", "The topic that was studied")
        .optional::<f64>("hours", "Hours spent studying (default 0)")
        .optional::<bool>("report_only", "Only report today's total without adding hours (default false)")
        .build()
    }

    async fn execute(&self, arguments: serde_json::Value) -> ToolResult<String> {
        let args: TrackProgressArgs = serde_json::from_value(arguments)?;

        // redb transactions block, keep them off the async workers
        let tracker = self.tracker.clone();
        let report = tokio::task::spawn_blocking(move || {
            tracker.record_or_report(&args.user_id, &args.topic, args.hours, args.report_only)
        })
        .await
        .map_err(|e| ToolError::Persistence(anyhow::anyhow!("Progress task failed: {}", e)))??;

        Ok(report.to_string())
    }
}
