//! Session access and client id resolution.

use crate::types::ClientId;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, PoisonError, RwLock};

/// The host application's per-user session store.
///
/// Concurrency is whatever the host provides; writes are last-write-wins.
pub trait Session: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, value: String);
}

/// In-memory session, for hosts without their own store and for tests.
#[derive(Debug, Default)]
pub struct MemorySession {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Session for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn put(&self, key: &str, value: String) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value);
    }
}

/// Request extension through which the host hands the current session to
/// the intake endpoint.
#[derive(Clone)]
pub struct SessionHandle(pub Arc<dyn Session>);

impl SessionHandle {
    pub fn new(session: Arc<dyn Session>) -> Self {
        SessionHandle(session)
    }
}

/// Where a dispatch is happening.
pub enum DispatchContext<'a> {
    /// Inside an HTTP request with a live session.
    Request {
        session: &'a dyn Session,
        /// Id of the authenticated principal, if any.
        user_id: Option<String>,
        ip: Option<IpAddr>,
    },
    /// Outside any session (queued job, webhook). The caller states the
    /// client id up front, typically one persisted on a business record.
    Detached { client_id: Option<ClientId> },
}

impl<'a> DispatchContext<'a> {
    /// Request context with no authenticated user and no known IP.
    pub fn request(session: &'a dyn Session) -> Self {
        DispatchContext::Request {
            session,
            user_id: None,
            ip: None,
        }
    }

    pub fn detached(client_id: Option<ClientId>) -> Self {
        DispatchContext::Detached { client_id }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            DispatchContext::Request { user_id, .. } => user_id.as_deref(),
            DispatchContext::Detached { .. } => None,
        }
    }

    pub fn ip(&self) -> Option<IpAddr> {
        match self {
            DispatchContext::Request { ip, .. } => *ip,
            DispatchContext::Detached { .. } => None,
        }
    }
}

/// Resolve the client id to attach to a hit.
///
/// Returns `None` when neither the session nor the caller has one; the hit
/// is then sent as anonymous.
pub fn resolve(context: &DispatchContext<'_>, session_key: &str) -> Option<ClientId> {
    match context {
        DispatchContext::Request { session, .. } => session
            .get(session_key)
            .filter(|id| !id.is_empty())
            .map(ClientId),
        DispatchContext::Detached { client_id } => client_id.clone(),
    }
}
