//! HTTP Transport layer for the Model Context Protocol
//!
//! Provides the external API routing, including the session-multiplexed `/mcp`
//! listener, its CORS policy and the metadata endpoints.

pub mod handlers;

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use handlers::SESSION_ID_HEADER;

/// `None` allows any origin. The session header is always exposed so browser
/// clients can read the id assigned on initialize.
pub fn cors_layer(allow_origin: Option<HeaderValue>) -> CorsLayer {
    let origin = match allow_origin {
        Some(origin) => AllowOrigin::exact(origin),
        None => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(SESSION_ID_HEADER)])
}
