use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use crate::errors::GatewayError;
use crate::mcp::session::SessionContext;

/// Process-scoped table of live sessions.
///
/// The lock guards only the map itself. It is never held while a session
/// handles a request or while a session's close hook runs.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<SessionContext>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(
        &self,
        id: impl Into<String>,
        session: Arc<SessionContext>,
    ) -> Result<(), GatewayError> {
        let id = id.into();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if sessions.contains_key(&id) {
            return Err(GatewayError::DuplicateSession(id));
        }
        sessions.insert(id, session);
        Ok(())
    }

    /// Closed sessions are never returned, even if their removal is still in
    /// flight.
    pub fn get(&self, id: &str) -> Option<Arc<SessionContext>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .filter(|session| session.is_open())
            .cloned()
    }

    pub fn remove(&self, id: &str) -> Option<Arc<SessionContext>> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes every registered session. Used on shutdown.
    pub fn close_all(&self) -> usize {
        let sessions = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect::<Vec<_>>();

        for session in &sessions {
            session.close();
            // close() only unregisters sessions that carry a close hook
            self.remove(session.id());
        }
        sessions.len()
    }
}
