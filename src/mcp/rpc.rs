//! JSON-RPC protocol representations and formatting utilities
//!
//! Provides standardized mapping of gateway errors to valid JSON-RPC payloads.

use rust_mcp_sdk::schema::{
    JsonrpcErrorResponse, JsonrpcResultResponse, RequestId, Result as McpResult, RpcError,
};
use serde_json::{json, Value};

use crate::errors::GatewayError;

pub const MISSING_SESSION_CODE: i32 = -32000;
pub const UNKNOWN_SESSION_CODE: i32 = -32001;

pub fn is_json_rpc_error(value: &Value) -> bool {
    value.get("error").is_some()
}

pub fn gateway_error_to_json_rpc(id: Option<Value>, err: &GatewayError) -> Value {
    match err {
        GatewayError::MissingSession => json_rpc_error(
            id,
            MISSING_SESSION_CODE,
            "Bad Request: No valid session ID provided",
        ),
        GatewayError::UnknownSession(_) => {
            json_rpc_error(id, UNKNOWN_SESSION_CODE, "Session not found")
        }
        GatewayError::UnknownOperation(name) => json_rpc_error_with_data(
            id,
            -32601,
            "Method not found",
            Some(json!({
                "code": "tool_not_found",
                "message": "unknown tool name",
                "details": {
                    "name": name,
                },
            })),
        ),
        GatewayError::SchemaValidation(fields) => json_rpc_error_with_data(
            id,
            -32602,
            "Invalid params",
            Some(json!({
                "code": "schema_validation",
                "message": err.to_string(),
                "details": {
                    "fields": fields,
                },
            })),
        ),
        GatewayError::InvalidParams { code, message } => json_rpc_error_with_data(
            id,
            -32602,
            "Invalid params",
            Some(json!({
                "code": code,
                "message": message,
                "details": {}
            })),
        ),
        GatewayError::AlreadyInitialized => json_rpc_error(
            id,
            -32600,
            "Invalid Request: Server already initialized",
        ),
        GatewayError::DuplicateOperation(_) | GatewayError::DuplicateSession(_) => {
            json_rpc_error(id, -32603, "Internal error")
        }
    }
}

pub fn json_rpc_error(id: Option<Value>, code: i32, message: &str) -> Value {
    json_rpc_error_with_data(id, code, message, None)
}

pub fn json_rpc_error_with_data(
    id: Option<Value>,
    code: i32,
    message: &str,
    data: Option<Value>,
) -> Value {
    let response = JsonrpcErrorResponse::new(
        RpcError {
            code: i64::from(code),
            data,
            message: message.to_string(),
        },
        id.as_ref().and_then(value_to_request_id),
    );
    serde_json::to_value(response).expect("jsonrpc error response serialization")
}

pub fn json_rpc_result(id: Option<Value>, result: Value) -> Value {
    if let Some(request_id) = id.as_ref().and_then(value_to_request_id) {
        let extra = result.as_object().cloned();
        let response = JsonrpcResultResponse::new(request_id, McpResult { meta: None, extra });
        return serde_json::to_value(response).expect("jsonrpc result response serialization");
    }

    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

pub fn value_to_request_id(value: &Value) -> Option<RequestId> {
    if let Some(string_id) = value.as_str() {
        return Some(RequestId::String(string_id.to_string()));
    }

    value.as_i64().map(RequestId::Integer)
}

pub fn request_id_to_value(id: RequestId) -> Value {
    match id {
        RequestId::String(value) => Value::String(value),
        RequestId::Integer(value) => Value::Number(value.into()),
    }
}
