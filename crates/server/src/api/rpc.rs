// Discovery and JSON-RPC dispatch endpoints

use crate::config::AppState;
use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use std::sync::Arc;
use study_mcp::protocol::{
    InitializeResult, JsonRpcError, JsonRpcResponse, ListToolsResult, ToolCallRequest,
};

/// List every registered tool
pub async fn list_tools(State(state): State<Arc<AppState>>) -> Json<ListToolsResult> {
    Json(state.dispatcher.list_tools())
}

/// Discovery with protocol version and server identity
pub async fn initialize(State(state): State<Arc<AppState>>) -> Json<InitializeResult> {
    Json(state.dispatcher.initialize())
}

/// Invoke a tool by name
pub async fn call_tool(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> (StatusCode, Json<JsonRpcResponse>) {
    let request: ToolCallRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Unparseable tool call");
            let response = JsonRpcResponse::error(serde_json::Value::Null, JsonRpcError::parse_error(e));
            return (StatusCode::BAD_REQUEST, Json(response));
        }
    };

    let response = state.dispatcher.dispatch(request).await;
    (status_for(&response), Json(response))
}

/// HTTP status matching the envelope's error code
fn status_for(response: &JsonRpcResponse) -> StatusCode {
    match response.error_code() {
        None => StatusCode::OK,
        Some(JsonRpcError::INVALID_REQUEST) | Some(JsonRpcError::PARSE_ERROR) => StatusCode::BAD_REQUEST,
        Some(JsonRpcError::METHOD_NOT_FOUND) => StatusCode::NOT_FOUND,
        Some(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{app, get, post_json, send};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    #[tokio::test]
    async fn test_list_tools_in_registration_order() {
        let app = app(true);
        let (status, body) = send(&app.router, get("/api/tools", None)).await;

        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|tool| tool["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                "generateStudyPlan",
                "summarizeText",
                "generateQuiz",
                "generateFlashcards",
                "recommendResources",
                "trackProgress",
            ]
        );

        let track = &body["tools"][5]["inputSchema"];
        assert_eq!(track["required"], serde_json::json!(["user_id", "topic"]));
        assert_eq!(track["properties"]["report_only"]["type"], "boolean");

        let (_, again) = send(&app.router, get("/api/tools", None)).await;
        assert_eq!(body, again);
    }

    #[tokio::test]
    async fn test_initialize_variant() {
        let app = app(true);
        let (status, body) = send(&app.router, get("/api/rpc", None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["protocolVersion"], "1.0");
        assert_eq!(body["serverInfo"]["name"], "Personalized Study Assistant");
        assert_eq!(body["tools"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_call_tool_success() {
        let app = app(true);
        let (status, body) = send(
            &app.router,
            post_json(
                "/api/rpc",
                None,
                serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": 42,
                    "method": "summarizeText",
                    "params": {"text": "Mitochondria are the powerhouse of the cell."}
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!({"jsonrpc": "2.0", "id": 42, "result": "A short summary."})
        );
    }

    #[tokio::test]
    async fn test_error_codes_and_statuses() {
        let app = app(true);

        let (status, body) = send(
            &app.router,
            post_json("/api/rpc", None, serde_json::json!({"id": "a", "params": {}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], -32600);
        assert_eq!(body["error"]["message"], "Method not provided");
        assert_eq!(body["id"], "a");

        let (status, body) = send(
            &app.router,
            post_json("/api/rpc", None, serde_json::json!({"id": "b", "method": "teleport"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], -32601);

        let (status, body) = send(
            &app.router,
            post_json(
                "/api/rpc",
                None,
                serde_json::json!({"id": "c", "method": "generateQuiz", "params": {"topic": "x"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], -32603);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Tool execution error: "));
    }

    #[tokio::test]
    async fn test_non_string_or_padded_method_is_not_found() {
        let app = app(true);

        let (status, body) = send(
            &app.router,
            post_json("/api/rpc", None, serde_json::json!({"jsonrpc": 2, "id": 7, "method": 123})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["id"], 7);
        assert_eq!(body["error"]["code"], -32601);
        assert_eq!(body["error"]["message"], "Method '123' not found");

        let (status, body) = send(
            &app.router,
            post_json(
                "/api/rpc",
                None,
                serde_json::json!({"id": "p", "method": " summarizeText ", "params": {"text": "Some text to summarize."}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["id"], "p");
        assert!(app.generator.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_api_key_surfaces_as_internal_error() {
        let app = app(false);
        let (status, body) = send(
            &app.router,
            post_json(
                "/api/rpc",
                None,
                serde_json::json!({"id": 1, "method": "generateFlashcards", "params": {"topic": "Verbs", "num_cards": 3}}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body["error"]["message"],
            "Tool execution error: Configuration error: OpenAI API key not configured."
        );
    }

    #[tokio::test]
    async fn test_track_progress_via_rpc() {
        let app = app(true);
        let call = |params: serde_json::Value| {
            post_json(
                "/api/rpc",
                None,
                serde_json::json!({"id": 1, "method": "trackProgress", "params": params}),
            )
        };

        let (status, body) = send(
            &app.router,
            call(serde_json::json!({"user_id": "u1", "topic": "algebra", "hours": 1.5})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["result"].as_str().unwrap().ends_with("Total for today: 1.50 hours."));

        let (_, body) = send(
            &app.router,
            call(serde_json::json!({"user_id": "u1", "topic": "algebra", "hours": 0.5})),
        )
        .await;
        assert!(body["result"].as_str().unwrap().ends_with("Added 0.50 hours. New total: 2.00 hours."));

        let (_, body) = send(
            &app.router,
            call(serde_json::json!({"user_id": "u1", "topic": "algebra", "report_only": true})),
        )
        .await;
        assert!(body["result"].as_str().unwrap().ends_with("is 2.00 hours."));
    }

    #[tokio::test]
    async fn test_invalid_json_body() {
        let app = app(true);
        let request = Request::builder()
            .method("POST")
            .uri("/api/rpc")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], -32700);
        assert!(body["id"].is_null());
    }
}
