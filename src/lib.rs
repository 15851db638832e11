use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

pub mod config;
pub mod domain;
pub mod errors;
pub mod hh_client;
pub mod http;
pub mod logging;
pub mod mcp;
pub mod operations;

use mcp::{registry::SessionRegistry, router::RequestRouter};
use operations::OperationRegistry;

#[derive(Clone)]
pub struct AppState {
    pub router: RequestRouter,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Each state owns its own session table, so independent gateways can run
    /// side by side in one process.
    pub fn new(operations: Arc<OperationRegistry>) -> Self {
        let sessions = Arc::new(SessionRegistry::new());
        Self {
            router: RequestRouter::new(sessions.clone(), operations),
            sessions,
        }
    }
}

pub fn build_app(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(http::handlers::health))
        .route("/.well-known/mcp", get(http::handlers::discovery))
        .route(
            "/mcp",
            post(http::handlers::mcp_post)
                .get(http::handlers::mcp_get)
                .delete(http::handlers::mcp_delete),
        )
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::http::handlers::SESSION_ID_HEADER;
    use crate::mcp::testing::initialize_request;
    use crate::operations::testing::echo_registry;

    use super::*;

    fn state() -> AppState {
        AppState::new(Arc::new(echo_registry()))
    }

    fn app_with(state: AppState) -> Router {
        build_app(state, http::cors_layer(None))
    }

    fn app() -> Router {
        app_with(state())
    }

    fn post_mcp(session: Option<&str>, body: String) -> Request<Body> {
        let mut builder = Request::builder()
            .uri("/mcp")
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(session) = session {
            builder = builder.header(SESSION_ID_HEADER, session);
        }
        builder.body(Body::from(body)).expect("request build")
    }

    fn session_request(method: &str, session: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/mcp").method(method);
        if let Some(session) = session {
            builder = builder.header(SESSION_ID_HEADER, session);
        }
        builder.body(Body::empty()).expect("request build")
    }

    async fn body_json(response: Response) -> Value {
        let body = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        serde_json::from_slice(&body).expect("valid json response")
    }

    async fn initialize(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(post_mcp(None, initialize_request(1, "2025-06-18").to_string()))
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::OK);
        response
            .headers()
            .get(SESSION_ID_HEADER)
            .expect("session header on initialize")
            .to_str()
            .expect("ascii session id")
            .to_string()
    }

    fn echo_call(id: u64, text: Option<&str>) -> String {
        let arguments = match text {
            Some(text) => json!({ "text": text }),
            None => json!({}),
        };
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": { "name": "echo", "arguments": arguments }
        })
        .to_string()
    }

    #[tokio::test]
    async fn health_reports_session_count() {
        let state = state();
        let app = app_with(state.clone());
        initialize(&app).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .method("GET")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["sessions"], 1);
        assert_eq!(state.sessions.len(), 1);
    }

    #[tokio::test]
    async fn discovery_points_at_mcp_endpoint() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/.well-known/mcp")
                    .method("GET")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["mcp_endpoint"], "/mcp");
        assert_eq!(body["name"], env!("CARGO_PKG_NAME"));
    }

    #[tokio::test]
    async fn root_get_is_not_found() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .method("GET")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn initialize_assigns_session_id() {
        let app = app();

        let response = app
            .oneshot(post_mcp(None, initialize_request(1, "2024-11-05").to_string()))
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(SESSION_ID_HEADER).is_some());
        let body = body_json(response).await;
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["id"], 1);
        assert_eq!(body["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(body["result"]["serverInfo"]["name"], env!("CARGO_PKG_NAME"));
        assert_eq!(
            body["result"]["serverInfo"]["version"],
            env!("CARGO_PKG_VERSION")
        );
        assert!(body["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn request_without_session_is_bad_request() {
        let state = state();
        let response = app_with(state.clone())
            .oneshot(post_mcp(None, echo_call(1, Some("hi"))))
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], -32000);
        assert_eq!(
            body["error"]["message"],
            "Bad Request: No valid session ID provided"
        );
        assert!(body["id"].is_null());
        assert!(state.sessions.is_empty());
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let state = state();
        let response = app_with(state.clone())
            .oneshot(post_mcp(Some("ghost"), echo_call(1, Some("hi"))))
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], -32001);
        assert!(state.sessions.is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_parse_error() {
        let response = app()
            .oneshot(post_mcp(None, "{not json".to_string()))
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn notification_is_accepted_without_body() {
        let app = app();
        let session = initialize(&app).await;

        let response = app
            .oneshot(post_mcp(
                Some(&session),
                json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }).to_string(),
            ))
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(response.headers().get(SESSION_ID_HEADER).is_none());
    }

    #[tokio::test]
    async fn tool_calls_are_routed_to_the_session() {
        let app = app();
        let session = initialize(&app).await;

        let ok = app
            .clone()
            .oneshot(post_mcp(Some(&session), echo_call(2, Some("hi"))))
            .await
            .expect("request execution");
        assert_eq!(ok.status(), StatusCode::OK);
        let body = body_json(ok).await;
        assert_eq!(body["id"], 2);
        assert_eq!(body["result"]["content"][0]["text"], "hi");

        let invalid = app
            .clone()
            .oneshot(post_mcp(Some(&session), echo_call(3, None)))
            .await
            .expect("request execution");
        let body = body_json(invalid).await;
        assert_eq!(body["error"]["code"], -32602);
        assert_eq!(body["error"]["data"]["details"]["fields"][0]["field"], "text");

        let unknown_tool = app
            .oneshot(post_mcp(
                Some(&session),
                json!({
                    "jsonrpc": "2.0",
                    "id": 4,
                    "method": "tools/call",
                    "params": { "name": "missing", "arguments": {} }
                })
                .to_string(),
            ))
            .await
            .expect("request execution");
        let body = body_json(unknown_tool).await;
        assert_eq!(body["error"]["code"], -32601);
        assert_eq!(body["error"]["data"]["details"]["name"], "missing");
    }

    #[tokio::test]
    async fn delete_terminates_session() {
        let state = state();
        let app = app_with(state.clone());
        let session = initialize(&app).await;
        assert_eq!(state.sessions.len(), 1);

        let deleted = app
            .clone()
            .oneshot(session_request("DELETE", Some(&session)))
            .await
            .expect("request execution");
        assert_eq!(deleted.status(), StatusCode::OK);
        assert!(state.sessions.is_empty());

        let replay = app
            .clone()
            .oneshot(post_mcp(Some(&session), echo_call(2, Some("hi"))))
            .await
            .expect("request execution");
        assert_eq!(replay.status(), StatusCode::NOT_FOUND);

        let second_delete = app
            .oneshot(session_request("DELETE", Some(&session)))
            .await
            .expect("request execution");
        assert_eq!(second_delete.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn session_control_requires_session_header() {
        for method in ["GET", "DELETE"] {
            let response = app()
                .oneshot(session_request(method, None))
                .await
                .expect("request execution");

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn event_stream_for_unknown_session_is_not_found() {
        let state = state();
        let response = app_with(state.clone())
            .oneshot(session_request("GET", Some("ghost")))
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], -32001);
        assert!(state.sessions.is_empty());
    }

    #[tokio::test]
    async fn batch_is_answered_within_the_session() {
        let state = state();
        let app = app_with(state.clone());
        let session = initialize(&app).await;
        let batch = json!([
            { "jsonrpc": "2.0", "id": 1, "method": "tools/call",
              "params": { "name": "echo", "arguments": { "text": "first" } } },
            { "jsonrpc": "2.0", "method": "notifications/initialized" },
            { "jsonrpc": "2.0", "id": 2, "method": "tools/list" }
        ]);

        let response = app
            .oneshot(post_mcp(Some(&session), batch.to_string()))
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(SESSION_ID_HEADER).is_none());
        let body = body_json(response).await;
        let replies = body.as_array().expect("batch reply is an array");
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["id"], 1);
        assert_eq!(replies[0]["result"]["content"][0]["text"], "first");
        assert_eq!(replies[1]["id"], 2);
        assert_eq!(replies[1]["result"]["tools"][0]["name"], "echo");
        assert_eq!(state.sessions.len(), 1);
    }

    #[tokio::test]
    async fn event_stream_ends_when_session_closes() {
        let state = state();
        let app = app_with(state.clone());
        let session = initialize(&app).await;

        let stream = app
            .clone()
            .oneshot(session_request("GET", Some(&session)))
            .await
            .expect("request execution");
        assert_eq!(stream.status(), StatusCode::OK);
        assert_eq!(
            stream
                .headers()
                .get(header::CONTENT_TYPE)
                .expect("content type"),
            "text/event-stream"
        );

        state
            .sessions
            .get(&session)
            .expect("live session")
            .close();

        let collected = tokio::time::timeout(Duration::from_secs(5), stream.into_body().collect())
            .await
            .expect("stream ends after close");
        assert!(collected.is_ok());
    }

    #[tokio::test]
    async fn cors_exposes_session_header() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/mcp")
                    .method("OPTIONS")
                    .header(header::ORIGIN, "https://client.example")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .expect("allow origin"),
            "*"
        );

        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/.well-known/mcp")
                    .method("GET")
                    .header(header::ORIGIN, "https://client.example")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");
        let exposed = response
            .headers()
            .get(header::ACCESS_CONTROL_EXPOSE_HEADERS)
            .expect("expose headers")
            .to_str()
            .expect("ascii");
        assert!(exposed.contains(SESSION_ID_HEADER));
    }

    #[tokio::test]
    async fn gateways_do_not_share_sessions() {
        let first = app();
        let second = app();
        let session = initialize(&first).await;

        let response = second
            .oneshot(post_mcp(Some(&session), echo_call(2, Some("hi"))))
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
