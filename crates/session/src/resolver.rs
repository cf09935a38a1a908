//! Session resolution.
//!
//! One resolver instance owns the live session snapshot. Identity changes
//! arrive as calls to [`SessionResolver::on_identity_changed`]; each call is
//! stamped with a generation counter in its synchronous prologue, so when an
//! in-flight resolution finishes after a newer identity change has arrived,
//! its result is discarded instead of clobbering the newer session.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};
use tokio::sync::watch;

use clubdesk_auth::{
    authorize_target, resolve_role, AdminAllowlist, Capability, Identity, Role, RoleEvidence,
    Session, SessionHandle,
};
use clubdesk_core::{DomainResult, UserId};
use clubdesk_infra::DocumentStore;

/// Collection holding one role document per account, keyed by user id.
pub const USERS_COLLECTION: &str = "users";

/// Maintains the authoritative session snapshot.
pub struct SessionResolver {
    allowlist: AdminAllowlist,
    store: Arc<dyn DocumentStore>,
    session: SessionHandle,
    generation: AtomicU64,
}

impl SessionResolver {
    pub fn new(allowlist: AdminAllowlist, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            allowlist,
            store,
            session: SessionHandle::new(),
            generation: AtomicU64::new(0),
        }
    }

    /// Shared handle to the snapshot, for the boundary and the engines.
    pub fn handle(&self) -> SessionHandle {
        self.session.clone()
    }

    /// Current snapshot.
    pub fn session(&self) -> Session {
        self.session.snapshot()
    }

    /// Apply an identity change.
    ///
    /// The generation stamp and the snapshot reset happen before this
    /// returns its future, so resolutions are ordered by call arrival even
    /// if the returned futures complete out of order. The caller must drive
    /// the future for identities to finish resolving; an absent identity is
    /// applied immediately.
    pub fn on_identity_changed(
        &self,
        identity: Option<Identity>,
    ) -> impl Future<Output = ()> + '_ {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        match &identity {
            None => self.session.replace(Session::signed_out()),
            // Not ready until the resolution for this identity completes;
            // the previous identity's role must not leak into it.
            Some(_) => self.session.replace(Session::initializing()),
        }

        async move {
            let Some(identity) = identity else { return };
            let role = self.resolve(&identity).await;
            if self.generation.load(Ordering::SeqCst) == generation {
                tracing::debug!(user = %identity.id, role = %role, "session resolved");
                self.session.replace(Session::signed_in(identity, role));
            } else {
                tracing::debug!(user = %identity.id, "discarded stale role resolution");
            }
        }
    }

    /// Write `new_role` to the target's role document.
    ///
    /// Requires the acting session to pass the gate for `ChangeUserRole`
    /// (admin, and never targeting itself). Does not affect the acting
    /// session and does not retry.
    pub async fn update_role(
        &self,
        acting: &Session,
        target: UserId,
        new_role: Role,
    ) -> DomainResult<()> {
        authorize_target(acting, Capability::ChangeUserRole, target)?;

        let mut fields = Map::new();
        fields.insert(
            "role".to_string(),
            JsonValue::String(new_role.as_str().to_string()),
        );
        self.store
            .update(USERS_COLLECTION, &target.to_string(), fields)
            .await?;
        tracing::debug!(target = %target, role = %new_role, "role document updated");
        Ok(())
    }

    async fn resolve(&self, identity: &Identity) -> Role {
        let allowlisted = self.allowlist.contains(&identity.email);
        let stored = if allowlisted {
            // The allowlist takes precedence and is checked before any store
            // read; skip the read entirely.
            None
        } else {
            match self
                .store
                .get(USERS_COLLECTION, &identity.id.to_string())
                .await
            {
                Ok(Some(document)) => role_from_document(&document),
                Ok(None) => None,
                Err(err) => {
                    tracing::warn!(
                        user = %identity.id,
                        error = %err,
                        "role document read failed; defaulting to least privilege"
                    );
                    None
                }
            }
        };
        resolve_role(&RoleEvidence { allowlisted, stored })
    }
}

fn role_from_document(document: &JsonValue) -> Option<Role> {
    let value = document.get("role")?.as_str()?;
    match value.parse() {
        Ok(role) => Some(role),
        Err(_) => {
            tracing::warn!(role = value, "unrecognized role in role document");
            None
        }
    }
}

/// Forward provider identity events into the resolver until the provider
/// goes away. Events are applied in arrival order; the current identity at
/// subscription time counts as the first event.
pub async fn pump_identity_events(
    resolver: &SessionResolver,
    mut changes: watch::Receiver<Option<Identity>>,
) {
    loop {
        let identity = changes.borrow_and_update().clone();
        resolver.on_identity_changed(identity).await;
        if changes.changed().await.is_err() {
            break;
        }
    }
}
