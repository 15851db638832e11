//! Axum HTTP handlers for the web server
//!
//! Provides the streamable-HTTP Model Context Protocol endpoint (POST, GET and
//! DELETE on `/mcp`) and general metadata endpoints.

use std::convert::Infallible;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tokio_stream::{wrappers::WatchStream, StreamExt};
use tracing::info;

use crate::mcp::rpc::json_rpc_error;
use crate::mcp::session::SessionState;
use crate::AppState;

pub const SESSION_ID_HEADER: &str = "mcp-session-id";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub sessions: usize,
}

#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub mcp_endpoint: &'static str,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        sessions: state.sessions.len(),
    })
}

pub async fn discovery() -> Json<DiscoveryResponse> {
    Json(DiscoveryResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        mcp_endpoint: "/mcp",
    })
}

fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub async fn mcp_post(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json_rpc_error(None, -32700, "Parse error")),
            )
                .into_response()
        }
    };

    let dispatched = match state.router.dispatch(session_id(&headers), payload).await {
        Ok(dispatched) => dispatched,
        Err(err) => return err.into_response(),
    };

    let mut response = match dispatched.response {
        Some(body) => (StatusCode::OK, Json(body)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    };

    if dispatched.created {
        match HeaderValue::from_str(dispatched.session.id()) {
            Ok(value) => {
                response.headers_mut().insert(SESSION_ID_HEADER, value);
            }
            Err(_) => {
                dispatched.session.close();
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json_rpc_error(None, -32603, "Internal error")),
                )
                    .into_response();
            }
        }
    }

    response
}

/// Keeps an event stream open for the session until it closes. The server
/// never pushes unsolicited messages, so the stream only carries keep-alives.
pub async fn mcp_get(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = match state.router.resolve_existing(session_id(&headers)) {
        Ok(session) => session,
        Err(err) => return err.into_response(),
    };

    info!(session_id = %session.id(), "event stream opened");
    let stream = WatchStream::new(session.subscribe())
        .take_while(|current| *current == SessionState::Open)
        .filter_map(|_| None::<Result<Event, Infallible>>);

    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}

pub async fn mcp_delete(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match state.router.resolve_existing(session_id(&headers)) {
        Ok(session) => {
            session.close();
            StatusCode::OK.into_response()
        }
        Err(err) => err.into_response(),
    }
}
