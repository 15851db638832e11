//! Session-aware request routing
//!
//! Every inbound envelope is classified by whether it carries a session id,
//! whether that id resolves to a live session and whether it is an
//! `initialize` request:
//!
//! | session id | resolves | initialize | outcome                        |
//! |------------|----------|------------|--------------------------------|
//! | yes        | yes      | any        | dispatch to the session        |
//! | no         | -        | yes        | create a session, dispatch     |
//! | no         | -        | no         | `GatewayError::MissingSession` |
//! | yes        | no       | any        | `GatewayError::UnknownSession` |
//!
//! The router holds no state of its own; sessions live in the
//! `SessionRegistry` it was built with.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::GatewayError;
use crate::mcp::registry::SessionRegistry;
use crate::mcp::rpc::is_json_rpc_error;
use crate::mcp::server::{handle_json_rpc_payload, is_initialize_request};
use crate::mcp::session::SessionContext;
use crate::operations::OperationRegistry;

/// Result of routing one envelope through a session.
pub struct Dispatched {
    pub session: Arc<SessionContext>,
    pub created: bool,
    pub response: Option<Value>,
}

#[derive(Clone)]
pub struct RequestRouter {
    sessions: Arc<SessionRegistry>,
    operations: Arc<OperationRegistry>,
}

impl RequestRouter {
    pub fn new(sessions: Arc<SessionRegistry>, operations: Arc<OperationRegistry>) -> Self {
        Self {
            sessions,
            operations,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    pub async fn dispatch(
        &self,
        session_id: Option<&str>,
        payload: Value,
    ) -> Result<Dispatched, GatewayError> {
        match session_id {
            Some(id) => {
                let session = self.resolve(id)?;
                let response = handle_json_rpc_payload(&session, payload).await;
                Ok(Dispatched {
                    session,
                    created: false,
                    response,
                })
            }
            None if is_initialize_request(&payload) => self.initialize(payload).await,
            None => Err(GatewayError::MissingSession),
        }
    }

    /// Teardown and polling path: the request carries only a session id.
    pub fn resolve_existing(
        &self,
        session_id: Option<&str>,
    ) -> Result<Arc<SessionContext>, GatewayError> {
        match session_id {
            Some(id) => self.resolve(id),
            None => Err(GatewayError::MissingSession),
        }
    }

    fn resolve(&self, id: &str) -> Result<Arc<SessionContext>, GatewayError> {
        self.sessions
            .get(id)
            .ok_or_else(|| GatewayError::UnknownSession(id.to_string()))
    }

    async fn initialize(&self, payload: Value) -> Result<Dispatched, GatewayError> {
        let session = self.open_session()?;
        let response = handle_json_rpc_payload(&session, payload).await;

        // a rejected handshake never leaves a session behind
        if response.as_ref().is_some_and(is_json_rpc_error) {
            warn!(session_id = %session.id(), "initialize rejected, discarding session");
            session.close();
            return Ok(Dispatched {
                session,
                created: false,
                response,
            });
        }

        Ok(Dispatched {
            session,
            created: true,
            response,
        })
    }

    /// Builds the context and its close hook before publishing it, so no
    /// partially constructed session is ever observable in the registry.
    fn open_session(&self) -> Result<Arc<SessionContext>, GatewayError> {
        let id = generate_session_id();
        let session = Arc::new(SessionContext::new(id.clone(), self.operations.clone()));

        let registry = Arc::downgrade(&self.sessions);
        session.on_close(move |id| {
            if let Some(registry) = registry.upgrade() {
                registry.remove(id);
            }
        });

        self.sessions.put(id, session.clone())?;
        info!(
            session_id = %session.id(),
            active_sessions = self.sessions.len(),
            "session created"
        );
        Ok(session)
    }
}

/// Random (v4) UUIDs are drawn from the operating system's CSPRNG.
pub fn generate_session_id() -> String {
    Uuid::new_v4().to_string()
}
