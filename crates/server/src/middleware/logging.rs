use crate::middleware::AuthenticatedUser;
use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Emit one structured event per HTTP request
pub async fn log_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let response = next.run(req).await;

    let user = response
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|user| user.0.as_str())
        .unwrap_or("anonymous");
    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        user,
        "http_request"
    );

    response
}
