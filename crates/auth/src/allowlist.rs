//! Fixed administrator allowlist.
//!
//! Addresses on this list resolve to `Role::Admin` unconditionally, before
//! and regardless of any stored role document.

/// Build-time administrator addresses.
pub const ADMIN_ADDRESSES: &[&str] = &["admin@clubdesk.example", "board@clubdesk.example"];

/// Case-insensitive set of administrator addresses-of-record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminAllowlist {
    // Normalized (trimmed, lowercased) at construction so lookups are a
    // plain comparison.
    entries: Vec<String>,
}

impl AdminAllowlist {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    /// The compiled-in list used by the running application.
    pub fn builtin() -> Self {
        Self::new(ADMIN_ADDRESSES.iter().copied())
    }

    pub fn contains(&self, email: &str) -> bool {
        let needle = email.trim().to_lowercase();
        self.entries.iter().any(|e| *e == needle)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
