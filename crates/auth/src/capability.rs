use serde::{Deserialize, Serialize};

/// A named permission checked by the authorization gate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Render any admin console view.
    ViewAdminConsole,
    /// Transition a moderation record through its state machine.
    MutateModerationRecord,
    /// Write another account's role document.
    ChangeUserRole,
    /// Hard-delete another account's user record.
    DeleteUser,
}

impl Capability {
    /// All capabilities the surrounding system checks.
    pub const ALL: [Capability; 4] = [
        Capability::ViewAdminConsole,
        Capability::MutateModerationRecord,
        Capability::ChangeUserRole,
        Capability::DeleteUser,
    ];

    /// Whether this capability must reject the acting account as its own
    /// target. An admin may never demote or delete themself through this
    /// path.
    pub fn protects_target(&self) -> bool {
        matches!(self, Capability::ChangeUserRole | Capability::DeleteUser)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewAdminConsole => "view_admin_console",
            Capability::MutateModerationRecord => "mutate_moderation_record",
            Capability::ChangeUserRole => "change_user_role",
            Capability::DeleteUser => "delete_user",
        }
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
