//! Account operations.
//!
//! Thin wrappers over the identity provider that also seed the role
//! document on the paths that can mint a brand-new identity, so the
//! allowlist and the stored document never disagree for a fresh account.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use clubdesk_auth::{resolve_role, AdminAllowlist, Identity, RoleEvidence};
use clubdesk_infra::{DocumentStore, IdentityProvider, OAuthProvider, ProviderError};

use crate::resolver::USERS_COLLECTION;

/// Sign-up/sign-in/sign-out operations, with role-document seeding.
pub struct Accounts {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    allowlist: AdminAllowlist,
}

impl Accounts {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
        allowlist: AdminAllowlist,
    ) -> Self {
        Self {
            provider,
            store,
            allowlist,
        }
    }

    /// Create an account, then seed its role document with the
    /// allowlist-derived role.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Identity, ProviderError> {
        let identity = self.provider.sign_up(email, password, display_name).await?;
        self.seed_role_document(&identity).await;
        Ok(identity)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, ProviderError> {
        self.provider.sign_in(email, password).await
    }

    /// OAuth sign-in can mint a brand-new identity, so ensure a role
    /// document exists afterwards.
    pub async fn sign_in_with_oauth(
        &self,
        oauth: OAuthProvider,
    ) -> Result<Identity, ProviderError> {
        let identity = self.provider.sign_in_with_oauth(oauth).await?;
        match self
            .store
            .get(USERS_COLLECTION, &identity.id.to_string())
            .await
        {
            Ok(Some(_)) => {}
            Ok(None) => self.seed_role_document(&identity).await,
            Err(err) => {
                tracing::warn!(user = %identity.id, error = %err, "could not check for role document");
            }
        }
        Ok(identity)
    }

    pub async fn sign_out(&self) -> Result<(), ProviderError> {
        self.provider.sign_out().await
    }

    pub async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError> {
        self.provider.send_password_reset(email).await
    }

    /// Write the initial role document for a fresh identity. A failed seed
    /// is logged, not fatal: the resolver degrades to the default role until
    /// a document appears.
    async fn seed_role_document(&self, identity: &Identity) {
        let role = resolve_role(&RoleEvidence {
            allowlisted: self.allowlist.contains(&identity.email),
            stored: None,
        });
        let document = json!({
            "id": identity.id,
            "email": identity.email,
            "display_name": identity.display_name.clone().unwrap_or_default(),
            "role": role.as_str(),
            "created_at": Utc::now(),
        });
        match self
            .store
            .set(USERS_COLLECTION, &identity.id.to_string(), document)
            .await
        {
            Ok(()) => tracing::debug!(user = %identity.id, role = %role, "seeded role document"),
            Err(err) => {
                tracing::warn!(user = %identity.id, error = %err, "failed to seed role document");
            }
        }
    }
}
