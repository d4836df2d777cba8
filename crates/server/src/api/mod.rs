use crate::config::{AppState, ServerConfig};
use crate::middleware::{log_requests, require_auth};
use anyhow::Result;
use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_core::ToolError;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

mod handlers;
mod rpc;

/// Start the API server
pub async fn serve(addr: &str, config: ServerConfig) -> Result<()> {
    let state = AppState::new(&config)?;

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);

    // Direct tool endpoints require a bearer token; discovery and dispatch are open
    let authenticated = Router::new()
        .route("/api/tool/summarize-text", post(handlers::summarize_text))
        .route("/api/tool/track-progress", post(handlers::track_progress))
        .route("/api/tool/progress", get(handlers::list_progress))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/tools", get(rpc::list_tools))
        .route("/api/rpc", get(rpc::initialize).post(rpc::call_tool))
        .merge(authenticated)
        // Middleware
        .layer(middleware::from_fn(log_requests))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::new()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "study-assistant",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// Error type for the direct tool handlers
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    pub fn validation(details: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse::with_details("Validation failed", details),
        }
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorResponse::with_details("An unexpected error occurred", details),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<ToolError> for ApiError {
    fn from(err: ToolError) -> Self {
        let (status, summary) = match &err {
            ToolError::MalformedRequest(_) => (StatusCode::BAD_REQUEST, "Validation failed"),
            ToolError::UnknownMethod(_) => (StatusCode::NOT_FOUND, "Unknown tool"),
            ToolError::Configuration(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Text generation is not configured")
            }
            ToolError::Upstream { .. } | ToolError::UpstreamTimeout(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "OpenAI API Error")
            }
            ToolError::Persistence(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to track progress"),
        };

        Self {
            status,
            body: ErrorResponse::with_details(summary, err.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
