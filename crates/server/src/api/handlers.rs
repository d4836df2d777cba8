use super::{ApiError, ApiResult};
use crate::config::AppState;
use crate::middleware::AuthenticatedUser;
use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_core::{ProgressRecord, ToolError};

const MIN_SUMMARY_TEXT: usize = 10;
const MAX_FIELD_LENGTH: usize = 255;
const MAX_HOURS: f64 = 999.99;

/// Summarize text through the registered summarizer
pub async fn summarize_text(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> ApiResult<Json<SummarizeResponse>> {
    let Json(req) = payload.map_err(|e| ApiError::validation(e.body_text()))?;

    let text = req.text.trim();
    if text.chars().count() < MIN_SUMMARY_TEXT {
        return Err(ApiError::validation(format!(
            "text: Ensure this field has at least {} characters.",
            MIN_SUMMARY_TEXT
        )));
    }

    let summary = invoke(&state, "summarizeText", serde_json::json!({ "text": text })).await?;
    Ok(Json(SummarizeResponse { summary }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummarizeRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub summary: String,
}

/// Record hours (or report today's total) for the caller
pub async fn track_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    payload: Result<Json<TrackProgressRequest>, JsonRejection>,
) -> ApiResult<Json<TrackProgressResponse>> {
    let Json(req) = payload.map_err(|e| ApiError::validation(e.body_text()))?;
    req.validate().map_err(ApiError::validation)?;

    if req.user_id.trim() != user.0 {
        tracing::debug!(requested = %req.user_id, user = %user.0, "Recording progress under the authenticated user");
    }

    let message = invoke(
        &state,
        "trackProgress",
        serde_json::json!({
            "user_id": user.0,
            "topic": req.topic.trim(),
            "hours": req.hours,
            "report_only": req.report_only,
        }),
    )
    .await?;

    Ok(Json(TrackProgressResponse { message }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrackProgressRequest {
    pub user_id: String,
    pub topic: String,
    #[serde(default)]
    pub hours: f64,
    #[serde(default)]
    pub report_only: bool,
}

impl TrackProgressRequest {
    fn validate(&self) -> Result<(), String> {
        for (field, value) in [("user_id", &self.user_id), ("topic", &self.topic)] {
            if value.trim().is_empty() {
                return Err(format!("{}: This field may not be blank.", field));
            }
            if value.chars().count() > MAX_FIELD_LENGTH {
                return Err(format!(
                    "{}: Ensure this field has no more than {} characters.",
                    field, MAX_FIELD_LENGTH
                ));
            }
        }

        if !self.hours.is_finite() || self.hours < 0.0 || self.hours > MAX_HOURS {
            return Err(format!("hours: Ensure this value is between 0 and {}.", MAX_HOURS));
        }
        let hundredths = self.hours * 100.0;
        if (hundredths - hundredths.round()).abs() > 1e-6 {
            return Err("hours: Ensure that there are no more than 2 decimal places.".to_string());
        }
        if !self.report_only && self.hours <= 0.0 {
            return Err("Hours must be greater than 0 when not in report-only mode.".to_string());
        }

        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrackProgressResponse {
    pub message: String,
}

/// Every progress record of the caller, newest day first
pub async fn list_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Json<ListProgressResponse>> {
    let tracker = state.tracker.clone();
    let records = tokio::task::spawn_blocking(move || tracker.history(&user.0))
        .await
        .map_err(|e| ApiError::internal(e.to_string()))??;

    Ok(Json(ListProgressResponse { records }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListProgressResponse {
    pub records: Vec<ProgressRecord>,
}

/// Run a registered tool the same way the dispatcher would
async fn invoke(state: &AppState, method: &str, arguments: serde_json::Value) -> Result<String, ToolError> {
    let tool = state
        .dispatcher
        .registry()
        .lookup(method)
        .ok_or_else(|| ToolError::UnknownMethod(method.to_string()))?;
    tool.invoke(arguments).await
}
