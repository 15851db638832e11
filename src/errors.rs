use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::mcp::rpc::gateway_error_to_json_rpc;
use crate::operations::schema::FieldType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Missing,
    TypeMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub expected: FieldType,
    pub problem: ViolationKind,
}

impl FieldViolation {
    pub fn missing(field: impl Into<String>, expected: FieldType) -> Self {
        Self {
            field: field.into(),
            expected,
            problem: ViolationKind::Missing,
        }
    }

    pub fn type_mismatch(field: impl Into<String>, expected: FieldType) -> Self {
        Self {
            field: field.into(),
            expected,
            problem: ViolationKind::TypeMismatch,
        }
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no valid session id provided")]
    MissingSession,
    #[error("session not found: {0}")]
    UnknownSession(String),
    #[error("unknown operation: {0}")]
    UnknownOperation(String),
    #[error("invalid arguments: {}", describe_violations(.0))]
    SchemaValidation(Vec<FieldViolation>),
    #[error("bad request: {message}")]
    InvalidParams {
        code: &'static str,
        message: &'static str,
    },
    #[error("session already initialized")]
    AlreadyInitialized,
    #[error("operation already registered: {0}")]
    DuplicateOperation(String),
    #[error("session already registered: {0}")]
    DuplicateSession(String),
}

impl GatewayError {
    pub fn invalid_params(code: &'static str, message: &'static str) -> Self {
        Self::InvalidParams { code, message }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingSession
            | Self::UnknownOperation(_)
            | Self::SchemaValidation(_)
            | Self::InvalidParams { .. }
            | Self::AlreadyInitialized => StatusCode::BAD_REQUEST,
            Self::UnknownSession(_) => StatusCode::NOT_FOUND,
            Self::DuplicateOperation(_) | Self::DuplicateSession(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

fn describe_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|violation| match violation.problem {
            ViolationKind::Missing => format!(
                "{} is required ({})",
                violation.field,
                violation.expected.as_str()
            ),
            ViolationKind::TypeMismatch => format!(
                "{} must be of type {}",
                violation.field,
                violation.expected.as_str()
            ),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failure reported by an operation handler. Relayed to the caller as a
/// failed tool result; the gateway never retries.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("backend request failed: {0}")]
    Backend(String),
    #[error("backend returned an unreadable response: {0}")]
    Decode(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed with internal error");
        }

        (status, Json(gateway_error_to_json_rpc(None, &self))).into_response()
    }
}
