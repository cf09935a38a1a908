use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::sync::watch;

use clubdesk_auth::Identity;
use clubdesk_core::UserId;

use super::r#trait::{IdentityProvider, OAuthProvider, ProviderError};

#[derive(Debug, Clone)]
struct Account {
    password: String,
    identity: Identity,
}

/// In-memory identity backend.
///
/// Intended for tests/dev. Accounts live only as long as the process;
/// password "hashing" is plain comparison because nothing here is a real
/// credential.
#[derive(Debug)]
pub struct InMemoryIdentityProvider {
    accounts: RwLock<HashMap<String, Account>>,
    oauth_accounts: RwLock<HashMap<OAuthProvider, Identity>>,
    reset_requests: RwLock<Vec<String>>,
    current: watch::Sender<Option<Identity>>,
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            accounts: RwLock::new(HashMap::new()),
            oauth_accounts: RwLock::new(HashMap::new()),
            reset_requests: RwLock::new(Vec::new()),
            current,
        }
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link an OAuth provider to an identity so `sign_in_with_oauth` can
    /// resolve it.
    pub fn link_oauth(&self, provider: OAuthProvider, email: &str, display_name: &str) -> Identity {
        let identity =
            Identity::new(UserId::new(), normalize(email)).with_display_name(display_name);
        if let Ok(mut linked) = self.oauth_accounts.write() {
            linked.insert(provider, identity.clone());
        }
        identity
    }

    /// Addresses a password reset was requested for, oldest first.
    pub fn reset_requests(&self) -> Vec<String> {
        self.reset_requests
            .read()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn announce(&self, identity: Option<Identity>) {
        // send_replace never fails even with zero receivers.
        self.current.send_replace(identity);
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Identity, ProviderError> {
        let key = normalize(email);
        if key.is_empty() || !key.contains('@') {
            return Err(ProviderError::new("invalid email address"));
        }
        if password.len() < 8 {
            return Err(ProviderError::new("password must be at least 8 characters"));
        }

        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| ProviderError::new("provider unavailable"))?;
        if accounts.contains_key(&key) {
            return Err(ProviderError::new("an account already exists for this address"));
        }

        let identity =
            Identity::new(UserId::new(), key.clone()).with_display_name(display_name);
        accounts.insert(
            key,
            Account {
                password: password.to_string(),
                identity: identity.clone(),
            },
        );
        drop(accounts);

        self.announce(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, ProviderError> {
        let key = normalize(email);
        let accounts = self
            .accounts
            .read()
            .map_err(|_| ProviderError::new("provider unavailable"))?;
        let account = accounts
            .get(&key)
            .filter(|a| a.password == password)
            .ok_or_else(|| ProviderError::new("invalid email or password"))?;
        let identity = account.identity.clone();
        drop(accounts);

        self.announce(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
    ) -> Result<Identity, ProviderError> {
        let linked = self
            .oauth_accounts
            .read()
            .map_err(|_| ProviderError::new("provider unavailable"))?;
        let identity = linked
            .get(&provider)
            .cloned()
            .ok_or_else(|| ProviderError::new(format!("no {} account linked", provider.as_str())))?;
        drop(linked);

        self.announce(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.announce(None);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError> {
        let key = normalize(email);
        let accounts = self
            .accounts
            .read()
            .map_err(|_| ProviderError::new("provider unavailable"))?;
        if !accounts.contains_key(&key) {
            return Err(ProviderError::new("no account for this address"));
        }
        drop(accounts);

        if let Ok(mut requests) = self.reset_requests.write() {
            requests.push(key);
        }
        Ok(())
    }

    fn identity_changes(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }
}
