use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use clubdesk_core::UserId;

use crate::{Identity, Role};

/// The authoritative session snapshot, one live instance per running client.
///
/// # Invariants
/// - `role` is resolved fresh whenever `identity` changes; a stale role from
///   a previous identity never leaks into the new session.
/// - `ready` is false until the first resolution completes, and flips back
///   to false while a new identity is being resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub identity: Option<Identity>,
    pub role: Role,
    pub ready: bool,
}

impl Session {
    /// The pre-resolution state: nobody, least privilege, not ready.
    pub fn initializing() -> Self {
        Self {
            identity: None,
            role: Role::User,
            ready: false,
        }
    }

    /// A completed resolution with no identity present.
    pub fn signed_out() -> Self {
        Self {
            identity: None,
            role: Role::User,
            ready: true,
        }
    }

    /// A completed resolution for `identity` with its resolved role.
    pub fn signed_in(identity: Identity, role: Role) -> Self {
        Self {
            identity: Some(identity),
            role,
            ready: true,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.identity.as_ref().map(|i| i.id)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::initializing()
    }
}

/// Shared handle to the live session snapshot.
///
/// Written only by the session resolver; read freely by the rendering
/// boundary and the moderation engine. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle(Arc<RwLock<Session>>);

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone out the current snapshot.
    pub fn snapshot(&self) -> Session {
        match self.0.read() {
            Ok(guard) => guard.clone(),
            // A poisoned lock means a writer panicked mid-swap; the stored
            // value is still a whole Session, so read it anyway.
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the snapshot wholesale. Resolver use only.
    pub fn replace(&self, session: Session) {
        match self.0.write() {
            Ok(mut guard) => *guard = session,
            Err(poisoned) => *poisoned.into_inner() = session,
        }
    }
}
