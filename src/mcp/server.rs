//! In-session Model Context Protocol engine
//!
//! Decodes JSON-RPC messages addressed to an established session and routes
//! them to the handshake (`initialize`), liveness (`ping`) and tool
//! (`tools/list`, `tools/call`) handlers.

use rust_mcp_sdk::schema::{
    CallToolRequest, CallToolRequestParams, Implementation, InitializeRequest, InitializeResult,
    JsonrpcMessage, JsonrpcRequest, ListToolsRequest, ListToolsResult, PingRequest,
    ServerCapabilities, ServerCapabilitiesTools,
};
use serde_json::{json, Value};
use tracing::info;

use crate::errors::GatewayError;
use crate::mcp::rpc::{
    gateway_error_to_json_rpc, is_json_rpc_error, json_rpc_error, json_rpc_result,
    request_id_to_value,
};
use crate::mcp::session::SessionContext;

/// Newest first; the first entry is offered when a client asks for an
/// unsupported version.
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2025-06-18", "2025-03-26", "2024-11-05"];
pub const LATEST_PROTOCOL_VERSION: &str = SUPPORTED_PROTOCOL_VERSIONS[0];

/// True when `payload` is a single, well-formed `initialize` request.
pub fn is_initialize_request(payload: &Value) -> bool {
    payload.get("method").and_then(Value::as_str) == Some("initialize")
        && payload.get("id").is_some()
        && serde_json::from_value::<InitializeRequest>(payload.clone()).is_ok()
}

/// Handles a single message or a batch. Returns `None` when nothing needs to
/// be sent back (notifications only).
pub async fn handle_json_rpc_payload(session: &SessionContext, payload: Value) -> Option<Value> {
    let Value::Array(batch) = payload else {
        return handle_json_rpc_value(session, payload).await;
    };

    if batch.is_empty() {
        return Some(json_rpc_error(None, -32600, "Invalid Request"));
    }

    let mut responses = Vec::new();
    for item in batch {
        if let Some(response) = handle_json_rpc_value(session, item).await {
            responses.push(response);
        }
    }

    if responses.is_empty() {
        None
    } else {
        Some(Value::Array(responses))
    }
}

pub async fn handle_json_rpc_value(session: &SessionContext, payload: Value) -> Option<Value> {
    if !payload.is_object() {
        return Some(json_rpc_error(None, -32600, "Invalid Request"));
    }

    let request_id = payload.get("id").cloned();
    let parsed: JsonrpcMessage = match serde_json::from_value(payload) {
        Ok(message) => message,
        Err(_) => return Some(json_rpc_error(request_id, -32600, "Invalid Request")),
    };

    match parsed {
        JsonrpcMessage::Request(request) => {
            if let Err(error_response) = validate_request_shape(&request) {
                return Some(error_response);
            }

            let request_id = request_id_to_value(request.id);
            if request.method.trim().is_empty() {
                return Some(json_rpc_error(Some(request_id), -32600, "Invalid Request"));
            }

            Some(
                handle_json_rpc_request(
                    session,
                    Some(request_id),
                    request.method,
                    request.params.map(Value::Object),
                )
                .await,
            )
        }
        JsonrpcMessage::Notification(notification) => {
            info!(
                session_id = %session.id(),
                method = %notification.method,
                "notification received"
            );
            None
        }
        // responses to server-initiated requests; this server never sends any
        JsonrpcMessage::ResultResponse(_) | JsonrpcMessage::ErrorResponse(_) => None,
    }
}

pub fn validate_request_shape(request: &JsonrpcRequest) -> Result<(), Value> {
    let payload = serde_json::to_value(request).expect("jsonrpc request serialization");
    let request_id = Some(request_id_to_value(request.id.clone()));

    let valid = match request.method.as_str() {
        "tools/call" => serde_json::from_value::<CallToolRequest>(payload).is_ok(),
        "tools/list" => serde_json::from_value::<ListToolsRequest>(payload).is_ok(),
        "ping" => serde_json::from_value::<PingRequest>(payload).is_ok(),
        "initialize" => serde_json::from_value::<InitializeRequest>(payload).is_ok(),
        _ => true,
    };

    if valid {
        Ok(())
    } else {
        Err(json_rpc_error(request_id, -32602, "Invalid params"))
    }
}

pub async fn handle_json_rpc_request(
    session: &SessionContext,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
) -> Value {
    let audit_params = redact_audit_params(params.as_ref());

    let response = match method.as_str() {
        "initialize" => handle_initialize(session, id, params.as_ref()),
        "ping" => json_rpc_result(id, json!({})),
        "tools/list" => {
            let list_tools_result = ListToolsResult {
                tools: session.operations().descriptors(),
                meta: None,
                next_cursor: None,
            };
            json_rpc_result(
                id,
                serde_json::to_value(list_tools_result).expect("tools list result serialization"),
            )
        }
        "tools/call" => handle_tools_call(session, id, params).await,
        _ => json_rpc_error(id, -32601, "Method not found"),
    };

    info!(
        session_id = %session.id(),
        method = %method,
        params = %audit_params,
        outcome = if is_json_rpc_error(&response) { "failure" } else { "success" },
        "mcp action audited"
    );

    response
}

fn handle_initialize(session: &SessionContext, id: Option<Value>, params: Option<&Value>) -> Value {
    let protocol_version = match negotiate_protocol_version(params) {
        Ok(version) => version,
        Err(err) => return gateway_error_to_json_rpc(id, &err),
    };

    if !session.mark_initialized() {
        return gateway_error_to_json_rpc(id, &GatewayError::AlreadyInitialized);
    }

    let initialize_result = InitializeResult {
        server_info: Implementation {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: None,
            description: None,
            icons: vec![],
            website_url: None,
        },
        capabilities: ServerCapabilities {
            tools: Some(ServerCapabilitiesTools {
                list_changed: Some(false),
            }),
            ..Default::default()
        },
        protocol_version: protocol_version.to_string(),
        instructions: None,
        meta: None,
    };

    json_rpc_result(
        id,
        serde_json::to_value(initialize_result).expect("initialize result serialization"),
    )
}

async fn handle_tools_call(
    session: &SessionContext,
    id: Option<Value>,
    params: Option<Value>,
) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, -32602, "Invalid params");
    };

    let tool_call: CallToolRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, -32602, "Invalid params"),
    };

    session.invoke(&tool_call.name, tool_call.arguments.map(Value::Object), id).await
}

/// Echoes a supported requested version, otherwise offers the latest one.
pub fn negotiate_protocol_version(params: Option<&Value>) -> Result<&'static str, GatewayError> {
    let offered_version = params
        .and_then(Value::as_object)
        .and_then(|object| object.get("protocolVersion"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|version| !version.is_empty())
        .ok_or_else(|| {
            GatewayError::invalid_params(
                "invalid_protocol_version",
                "initialize params.protocolVersion is required",
            )
        })?;

    Ok(SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .copied()
        .find(|supported| *supported == offered_version)
        .unwrap_or(LATEST_PROTOCOL_VERSION))
}

pub fn redact_audit_params(params: Option<&Value>) -> Value {
    params.map(redact_audit_value).unwrap_or(Value::Null)
}

pub fn redact_audit_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| {
                    if is_sensitive_key(key) {
                        (key.clone(), Value::String("[REDACTED]".to_string()))
                    } else {
                        (key.clone(), redact_audit_value(item))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_audit_value).collect()),
        _ => value.clone(),
    }
}

pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_ascii_lowercase();
    matches!(
        normalized.as_str(),
        "authorization" | "bearer" | "api_key" | "apikey"
    ) || normalized.contains("token")
        || normalized.contains("secret")
        || normalized.contains("password")
        || normalized.contains("credential")
}
