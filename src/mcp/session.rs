//! In-memory session table for the SSE transport.
//!
//! Maps session identifiers to the inbound half of each open channel.
//! This is the only shared mutable structure in the transport core; the
//! front door owns an `Arc<SessionTable>` and injects it wherever session
//! resolution is needed, so the state machine is testable without a real
//! network transport.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rmcp::model::ClientJsonRpcMessage;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Opaque session identifier handed to clients in the `endpoint` frame.
pub type SessionId = String;

/// Lifecycle state of one session's channel.
///
/// A table entry is created at `Open` (the channel handshake is complete
/// by the time the entry exists) and moves to `Closing` when teardown
/// begins; the entry is removed outright once in-flight dispatch drains,
/// which is the `Closed` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionStatus {
    Open,
    Closing,
}

#[derive(Debug)]
struct SessionEntry {
    tx: mpsc::Sender<ClientJsonRpcMessage>,
    status: SessionStatus,
}

/// Why a message could not be forwarded to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionLookupError {
    /// The identifier was never issued, or its entry is already gone.
    NotFound,
    /// The session exists but is tearing down; only `Open` sessions
    /// accept messages.
    Closing,
}

/// Map from session identifier to the open channel's inbound sender.
#[derive(Debug, Default)]
pub struct SessionTable {
    inner: RwLock<HashMap<SessionId, SessionEntry>>,
}

impl SessionTable {
    fn read(&self) -> RwLockReadGuard<'_, HashMap<SessionId, SessionEntry>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<SessionId, SessionEntry>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an open channel, allocating a fresh session identifier.
    ///
    /// UUIDv4 identifiers are unique for the life of the process, so an
    /// identifier is never reused even after its session closes.
    #[must_use]
    pub fn insert(&self, tx: mpsc::Sender<ClientJsonRpcMessage>) -> SessionId {
        let session_id = Uuid::new_v4().to_string();
        self.write().insert(
            session_id.clone(),
            SessionEntry {
                tx,
                status: SessionStatus::Open,
            },
        );
        session_id
    }

    /// Resolve a session to its inbound sender.
    ///
    /// # Errors
    ///
    /// Returns [`SessionLookupError::NotFound`] for unknown identifiers and
    /// [`SessionLookupError::Closing`] for sessions already tearing down.
    pub fn sender(
        &self,
        session_id: &str,
    ) -> Result<mpsc::Sender<ClientJsonRpcMessage>, SessionLookupError> {
        let guard = self.read();
        let entry = guard.get(session_id).ok_or(SessionLookupError::NotFound)?;
        match entry.status {
            SessionStatus::Open => Ok(entry.tx.clone()),
            SessionStatus::Closing => Err(SessionLookupError::Closing),
        }
    }

    /// Transition a session from `Open` to `Closing`.
    ///
    /// Idempotent; marking an already-closing or absent session is a no-op.
    pub fn begin_close(&self, session_id: &str) {
        if let Some(entry) = self.write().get_mut(session_id) {
            entry.status = SessionStatus::Closing;
        }
    }

    /// Delete a session's slot.
    ///
    /// Idempotent; removing an absent identifier is a no-op, not an error.
    pub fn remove(&self, session_id: &str) {
        self.write().remove(session_id);
    }

    /// Whether the table holds an entry for `session_id` in any state.
    #[must_use]
    pub fn contains(&self, session_id: &str) -> bool {
        self.read().contains_key(session_id)
    }

    /// Count of sessions currently tracked, i.e. open streaming channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether no sessions are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Drop every entry. Used at process shutdown after the per-session
    /// tasks have been cancelled.
    pub fn clear(&self) {
        self.write().clear();
    }
}
