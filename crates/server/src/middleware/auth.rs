use crate::api::ErrorResponse;
use crate::config::{AppState, AuthConfig};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

/// Identity of the caller, attached to requests (and their responses) by [`require_auth`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

/// Extract the bearer token from the authorization header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth_str = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Resolve the caller behind the request's bearer token
pub fn authenticate(auth: &AuthConfig, headers: &HeaderMap) -> Option<AuthenticatedUser> {
    let token = bearer_token(headers)?;
    auth.user_for_token(token)
        .map(|user| AuthenticatedUser(user.to_string()))
}

/// Reject requests without a known bearer token
pub async fn require_auth(State(state): State<Arc<AppState>>, mut req: Request, next: Next) -> Response {
    let user = match authenticate(&state.auth, req.headers()) {
        Some(user) => user,
        None => {
            tracing::warn!(path = %req.uri().path(), "Rejected unauthenticated request");
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("Authentication credentials were not provided or are invalid")),
            )
                .into_response();
        }
    };

    req.extensions_mut().insert(user.clone());
    let mut response = next.run(req).await;
    // Lets the request logger report who made the call
    response.extensions_mut().insert(user);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn auth_config() -> AuthConfig {
        AuthConfig {
            tokens: [("token123".to_string(), "alice".to_string())].into_iter().collect(),
        }
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer token123"));
        assert_eq!(bearer_token(&headers), Some("token123"));
    }

    #[test]
    fn test_authenticate_known_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer token123"));
        assert_eq!(
            authenticate(&auth_config(), &headers),
            Some(AuthenticatedUser("alice".to_string()))
        );

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer nope"));
        assert!(authenticate(&auth_config(), &headers).is_none());
    }
}
