//! Per-session context
//!
//! A `SessionContext` binds one client conversation to the shared operation
//! registry. Its transport handle is a watch channel carrying the lifecycle
//! state; transports subscribe to it to learn when the session closes.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, PoisonError,
};

use chrono::{DateTime, Utc};
use rust_mcp_sdk::schema::{CallToolResult, ContentBlock, TextContent};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::errors::GatewayError;
use crate::mcp::rpc::{gateway_error_to_json_rpc, json_rpc_result};
use crate::operations::OperationRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed,
}

type CloseHook = Box<dyn FnOnce(&str) + Send>;

pub struct SessionContext {
    id: String,
    operations: Arc<OperationRegistry>,
    created_at: DateTime<Utc>,
    initialized: AtomicBool,
    state: watch::Sender<SessionState>,
    close_hook: Mutex<Option<CloseHook>>,
}

impl SessionContext {
    pub fn new(id: impl Into<String>, operations: Arc<OperationRegistry>) -> Self {
        let (state, _) = watch::channel(SessionState::Open);
        Self {
            id: id.into(),
            operations,
            created_at: Utc::now(),
            initialized: AtomicBool::new(false),
            state,
            close_hook: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn operations(&self) -> &OperationRegistry {
        &self.operations
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Installs the hook run exactly once when the session closes. Replaces
    /// any previously installed hook.
    pub fn on_close(&self, hook: impl FnOnce(&str) + Send + 'static) {
        *self
            .close_hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Box::new(hook));
    }

    /// Marks the handshake as done. Returns false if it already happened.
    pub fn mark_initialized(&self) -> bool {
        !self.initialized.swap(true, Ordering::SeqCst)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Idempotent. The state flips to `Closed` before the close hook runs, so
    /// a concurrent lookup that still holds this context sees it as closed.
    pub fn close(&self) {
        let transitioned = self.state.send_if_modified(|state| {
            if *state == SessionState::Open {
                *state = SessionState::Closed;
                true
            } else {
                false
            }
        });
        if !transitioned {
            return;
        }

        let hook = self
            .close_hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(hook) = hook {
            hook(&self.id);
        }

        let lifetime_ms = (Utc::now() - self.created_at()).num_milliseconds();
        info!(session_id = %self.id, lifetime_ms, "session closed");
    }

    /// Looks up `name`, validates `arguments` against its schema and runs the
    /// handler, producing the JSON-RPC response for `id`.
    pub async fn invoke(&self, name: &str, arguments: Option<Value>, id: Option<Value>) -> Value {
        match self.call_tool(name, arguments).await {
            Ok(result) => json_rpc_result(
                id,
                serde_json::to_value(result).expect("tool result serialization"),
            ),
            Err(err) => gateway_error_to_json_rpc(id, &err),
        }
    }

    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Value>,
    ) -> Result<CallToolResult, GatewayError> {
        let operation = self.operations.lookup(name)?;
        let input = operation
            .schema()
            .validate(arguments.as_ref().unwrap_or(&Value::Null))?;

        match operation.invoke(input).await {
            Ok(content) => Ok(CallToolResult {
                content,
                is_error: None,
                meta: None,
                structured_content: None,
            }),
            Err(err) => {
                warn!(session_id = %self.id, tool = %name, error = %err, "tool handler failed");
                Ok(CallToolResult {
                    content: vec![ContentBlock::from(TextContent::new(
                        err.to_string(),
                        None,
                        None,
                    ))],
                    is_error: Some(true),
                    meta: None,
                    structured_content: None,
                })
            }
        }
    }
}
