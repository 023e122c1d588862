//! HTTP front door.
//!
//! Deserializes external requests into tool dispatch calls and serializes
//! results back. The front door raises raw HTTP-status faults only for
//! unparseable bodies and internal panics; every dispatched tool call comes
//! back `200` with the structured result, error field included, so callers
//! treat all tool calls uniformly.
//!
//! Request bodies are buffered fully in memory before parsing; there is no
//! streaming or backpressure.
//!
//! # Routes
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /ingest` | Store a captured tree |
//! | `GET /tool-status` | Active-session and pending-command counts |
//! | `POST\|GET\|DELETE /tool` | Tool dispatch: `{tool, arguments}` |

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::FutureExt;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::model::ExtractedNode;
use crate::tools::{ToolContext, ToolRegistry};

// ============================================================================
// AppState
// ============================================================================

/// Shared state passed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Tool dispatch registry.
    registry: Arc<ToolRegistry>,

    /// Handler collaborators.
    ctx: ToolContext,

    /// Bearer token required on `/tool`, if set.
    access_token: Option<String>,
}

impl AppState {
    /// Creates state over a registry and its context.
    #[must_use]
    pub fn new(registry: ToolRegistry, ctx: ToolContext) -> Self {
        Self {
            registry: Arc::new(registry),
            ctx,
            access_token: None,
        }
    }

    /// Requires a bearer token on `/tool` calls.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

// ============================================================================
// Router
// ============================================================================

/// Builds the front-door router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ingest", post(handle_ingest))
        .route("/tool-status", get(handle_tool_status))
        .route(
            "/tool",
            post(handle_tool).get(handle_tool).delete(handle_tool),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds the front door and serves until the listener fails.
///
/// # Errors
///
/// Returns [`crate::Error::Io`] if binding or serving fails.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "HTTP front door bound");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

// ============================================================================
// Request Bodies
// ============================================================================

#[derive(Deserialize)]
struct IngestBody {
    /// Storage name; defaults to the captured root's id.
    name: Option<String>,
    node: ExtractedNode,
}

#[derive(Deserialize)]
struct ToolCall {
    tool: String,
    #[serde(default)]
    arguments: Value,
}

fn invalid_json() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Invalid JSON" })),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// `POST /ingest` — stores a captured tree.
async fn handle_ingest(State(state): State<AppState>, body: Bytes) -> Response {
    let Ok(body) = serde_json::from_slice::<IngestBody>(&body) else {
        return invalid_json();
    };

    if let Err(e) = body.node.validate() {
        warn!(error = %e, "Rejected ingested tree");
        return Json(json!({ "error": e.to_string() })).into_response();
    }

    let name = body.name.unwrap_or_else(|| body.node.id.clone());
    let saved = state.ctx.components.save(name, body.node);

    Json(json!({
        "id": saved.id,
        "name": saved.name,
        "createdAt": saved.created_at,
    }))
    .into_response()
}

/// `GET /tool-status` — session and pending counts.
async fn handle_tool_status(State(state): State<AppState>) -> Response {
    Json(json!({
        "activeSessions": state.ctx.relay.session_count(),
        "pendingCommands": state.ctx.relay.pending_count(),
    }))
    .into_response()
}

/// `POST|GET|DELETE /tool` — dispatches one tool call.
async fn handle_tool(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(expected) = &state.access_token {
        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if presented != Some(expected.as_str()) {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Unauthorized" })),
            )
                .into_response();
        }
    }

    let Ok(call) = serde_json::from_slice::<ToolCall>(&body) else {
        return invalid_json();
    };

    // Failure boundary: a handler bug must come back as a 500 envelope,
    // never tear down the front door.
    let dispatch = state.registry.handle(&call.tool, call.arguments, &state.ctx);
    match AssertUnwindSafe(dispatch).catch_unwind().await {
        Ok(result) => Json(result).into_response(),
        Err(panic) => {
            let details = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(tool = %call.tool, details = %details, "Tool handler panicked");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal error", "details": details })),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::model::{BoundingBox, NodeKind};
    use crate::relay::Relay;

    fn test_router() -> (Router, ToolContext) {
        let ctx = ToolContext::new(Relay::new());
        let state = AppState::new(ToolRegistry::with_defaults(), ctx.clone());
        (router(state), ctx)
    }

    async fn send(app: Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }

    fn node_body() -> String {
        let node = ExtractedNode::new(
            "hero",
            NodeKind::Container,
            BoundingBox::new(0.0, 0.0, 120.0, 60.0),
        );
        json!({ "name": "hero-card", "node": node }).to_string()
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let (app, _ctx) = test_router();
        let (status, body) = send(app, "POST", "/tool", "{not json").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid JSON");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_200_with_embedded_error() {
        let (app, _ctx) = test_router();
        let (status, body) = send(
            app,
            "POST",
            "/tool",
            r#"{ "tool": "rotate_canvas", "arguments": {} }"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"], "Unknown tool: rotate_canvas");
    }

    #[tokio::test]
    async fn test_tool_dispatch_over_delete() {
        let (app, _ctx) = test_router();
        let (status, body) = send(
            app,
            "DELETE",
            "/tool",
            r#"{ "tool": "delete_component", "arguments": { "key": "ghost" } }"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"], "Not found: component 'ghost'");
    }

    #[tokio::test]
    async fn test_tool_status_shape() {
        let (app, ctx) = test_router();
        let (status, body) = send(app, "GET", "/tool-status", "").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["activeSessions"], 0);
        assert_eq!(body["pendingCommands"], 0);
        assert_eq!(ctx.relay.session_count(), 0);
    }

    #[tokio::test]
    async fn test_ingest_then_load() {
        let (app, ctx) = test_router();

        let (status, saved) = send(app.clone(), "POST", "/ingest", &node_body()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["name"], "hero-card");
        assert_eq!(ctx.components.len(), 1);

        let (status, loaded) = send(
            app,
            "POST",
            "/tool",
            r#"{ "tool": "load_component", "arguments": { "key": "hero-card" } }"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(loaded["data"]["id"], "hero");
    }

    #[tokio::test]
    async fn test_ingest_invalid_tree_embeds_error() {
        let (app, ctx) = test_router();
        let body = r#"{
            "node": {
                "id": "bad",
                "kind": "vector",
                "bounds": { "x": 0.0, "y": 0.0, "width": 8.0, "height": 8.0 },
                "vector": "<svg/>",
                "children": [{
                    "id": "c",
                    "kind": "text",
                    "bounds": { "x": 0.0, "y": 0.0, "width": 1.0, "height": 1.0 }
                }]
            }
        }"#;

        let (status, result) = send(app, "POST", "/ingest", body).await;
        assert_eq!(status, StatusCode::OK);
        assert!(result.get("error").is_some());
        assert!(ctx.components.is_empty());
    }

    #[tokio::test]
    async fn test_access_token_gate() {
        let ctx = ToolContext::new(Relay::new());
        let state =
            AppState::new(ToolRegistry::with_defaults(), ctx).with_access_token("sk-open");
        let app = router(state);

        let (status, _) = send(
            app.clone(),
            "POST",
            "/tool",
            r#"{ "tool": "relay_status" }"#,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let request = Request::builder()
            .method("POST")
            .uri("/tool")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, "Bearer sk-open")
            .body(Body::from(r#"{ "tool": "relay_status" }"#))
            .expect("request");
        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_handler_panic_is_500_envelope() {
        use async_trait::async_trait;
        use crate::error::Result;
        use crate::tools::Tool;

        struct PanickingTool;

        #[async_trait]
        impl Tool for PanickingTool {
            fn name(&self) -> &'static str {
                "explode"
            }

            async fn call(&self, _args: Value, _ctx: &ToolContext) -> Result<Value> {
                panic!("boom");
            }
        }

        let ctx = ToolContext::new(Relay::new());
        let mut registry = ToolRegistry::with_defaults();
        registry.register(Arc::new(PanickingTool));
        let app = router(AppState::new(registry, ctx));

        let (status, body) = send(app, "POST", "/tool", r#"{ "tool": "explode" }"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal error");
        assert_eq!(body["details"], "boom");
    }
}
