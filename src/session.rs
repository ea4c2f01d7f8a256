//! Session gate.
//!
//! Every public API call except `init` is refused until the SDK has finished configuring.
//! The gate is the single place holding that knowledge: the current session id, the host
//! listener and the zone registry live together behind one lock, so a reader never sees
//! a listener without the registry it belongs to.
//!
//! ```text
//!   Uninitialized ──begin()──► Pending ──complete()──► Ready
//!         ▲                       │                      │
//!         └──────── abort() ──────┘                      │
//!         └───────────────── teardown() ─────────────────┘
//! ```

use std::fmt::Display;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use crate::errors::{BridgeError, NotReadyReason};
use crate::host::HostListener;
use crate::zone::ZoneRegistry;

/// Identity of one `init` … `teardown` cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Default)]
struct SessionState {
    id: Option<SessionId>,
    listener: Option<Arc<dyn HostListener>>,
    ready: bool,
    registry: Option<Arc<ZoneRegistry>>,
}

/// A ready session, as seen by an API call that passed the gate.
pub(crate) struct ActiveSession {
    pub id: SessionId,
    pub registry: Arc<ZoneRegistry>,
}

#[derive(Default)]
pub struct SessionGate {
    state: RwLock<SessionState>,
}

impl std::fmt::Debug for SessionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.read();
        f.debug_struct("SessionGate")
            .field("id", &s.id)
            .field("has_listener", &s.listener.is_some())
            .field("ready", &s.ready)
            .finish()
    }
}

impl SessionGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_ready(&self) -> bool {
        self.read().ready
    }

    /// True once `init` has registered a listener, even if configuration is still running.
    pub fn has_listener(&self) -> bool {
        self.read().listener.is_some()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.read().id
    }

    /// Refuses the call unless the session is ready.
    pub fn guard(&self, api: &'static str) -> Result<(), BridgeError> {
        self.active(api).map(|_| ())
    }

    pub(crate) fn active(&self, api: &'static str) -> Result<ActiveSession, BridgeError> {
        let s = self.read();
        if s.listener.is_none() {
            return Err(BridgeError::NotReady {
                api,
                reason: NotReadyReason::NotInitialized,
            });
        }
        match (s.ready, s.id, &s.registry) {
            (true, Some(id), Some(registry)) => Ok(ActiveSession {
                id,
                registry: registry.clone(),
            }),
            _ => Err(BridgeError::NotReady {
                api,
                reason: NotReadyReason::InitInFlight,
            }),
        }
    }

    /// Starts a session: stores the listener, not yet ready.
    pub(crate) fn begin(&self, listener: Arc<dyn HostListener>) -> Result<SessionId, BridgeError> {
        let mut s = self.write();
        if s.listener.is_some() {
            return Err(BridgeError::AlreadyInitialized);
        }
        let id = SessionId::new();
        *s = SessionState {
            id: Some(id),
            listener: Some(listener),
            ready: false,
            registry: None,
        };
        Ok(id)
    }

    /// Marks session `id` ready. Returns false when the session was torn down meanwhile.
    pub(crate) fn complete(&self, id: SessionId, registry: Arc<ZoneRegistry>) -> bool {
        let mut s = self.write();
        if s.id != Some(id) {
            return false;
        }
        s.registry = Some(registry);
        s.ready = true;
        true
    }

    /// Drops a session whose configuration failed, so `init` may be retried.
    pub(crate) fn abort(&self, id: SessionId) {
        let mut s = self.write();
        if s.id == Some(id) {
            *s = SessionState::default();
        }
    }

    /// Registry of session `id`, as long as that session is still the ready one.
    pub(crate) fn registry_for(&self, id: SessionId) -> Option<Arc<ZoneRegistry>> {
        let s = self.read();
        if !s.ready || s.id != Some(id) {
            return None;
        }
        s.registry.clone()
    }

    /// Host listener of session `id`, while it is the ready session.
    pub(crate) fn listener_for(&self, id: SessionId) -> Option<Arc<dyn HostListener>> {
        let s = self.read();
        if !s.ready || s.id != Some(id) {
            return None;
        }
        s.listener.clone()
    }

    /// True while `id` is the ready session.
    pub(crate) fn is_current(&self, id: SessionId) -> bool {
        let s = self.read();
        s.ready && s.id == Some(id)
    }

    /// Returns to uninitialized. Hands back the registry of the closed session, if any.
    pub(crate) fn teardown(&self) -> Option<Arc<ZoneRegistry>> {
        let mut s = self.write();
        let registry = s.registry.take();
        *s = SessionState::default();
        registry
    }
}
