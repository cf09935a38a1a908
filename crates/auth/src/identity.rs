use serde::{Deserialize, Serialize};

use clubdesk_core::UserId;

/// An authenticated external principal.
///
/// Opaque to this core beyond a stable id and an address-of-record; whether
/// it came from email+password or an OAuth provider is the identity
/// provider's business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    /// Address-of-record, compared case-insensitively against the allowlist.
    pub email: String,
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}
