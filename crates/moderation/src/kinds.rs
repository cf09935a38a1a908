//! The three record kinds of the admin console.

use serde_json::{Map, Value as JsonValue};

use chrono::{DateTime, Utc};

use clubdesk_auth::{Capability, Role};
use clubdesk_core::RecordId;

use crate::kind::{RecordKind, SortField, SortKey};
use crate::record::{
    ApplicationRecord, ApplicationStatus, MessageRecord, MessageStatus, UserRecord,
};

fn single_field(key: &str, value: &str) -> Map<String, JsonValue> {
    let mut fields = Map::new();
    fields.insert(key.to_string(), JsonValue::String(value.to_string()));
    fields
}

// ─────────────────────────────────────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────────────────────────────────────

/// Contact messages: `pending → read`, nothing else.
pub struct Messages;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MessageAction {
    MarkRead,
}

impl RecordKind for Messages {
    type Record = MessageRecord;
    type Action = MessageAction;

    const COLLECTION: &'static str = "messages";
    const MUTATE_CAPABILITY: Capability = Capability::MutateModerationRecord;
    const DELETE_CAPABILITY: Capability = Capability::MutateModerationRecord;

    fn id(record: &Self::Record) -> RecordId {
        record.id
    }

    fn created_at(record: &Self::Record) -> DateTime<Utc> {
        record.created_at
    }

    fn status_label(record: &Self::Record) -> &'static str {
        record.status.as_str()
    }

    fn search_text(record: &Self::Record) -> Vec<&str> {
        vec![&record.name, &record.email, &record.subject, &record.body]
    }

    fn sort_key(record: &Self::Record, field: SortField) -> SortKey {
        match field {
            SortField::CreatedAt => SortKey::Instant(record.created_at),
            SortField::Name => SortKey::Text(record.name.clone()),
            SortField::Email => SortKey::Text(record.email.clone()),
            SortField::Status => SortKey::Text(record.status.as_str().to_string()),
        }
    }

    fn transition(
        record: &Self::Record,
        action: Self::Action,
    ) -> Option<(Self::Record, Map<String, JsonValue>)> {
        match (record.status, action) {
            (MessageStatus::Pending, MessageAction::MarkRead) => {
                let mut next = record.clone();
                next.status = MessageStatus::Read;
                let fields = single_field("status", next.status.as_str());
                Some((next, fields))
            }
            (MessageStatus::Read, MessageAction::MarkRead) => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Applications
// ─────────────────────────────────────────────────────────────────────────────

/// Membership applications: `pending → approved | rejected`, both terminal.
pub struct Applications;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ApplicationAction {
    Approve,
    Reject,
}

impl RecordKind for Applications {
    type Record = ApplicationRecord;
    type Action = ApplicationAction;

    const COLLECTION: &'static str = "applications";
    const MUTATE_CAPABILITY: Capability = Capability::MutateModerationRecord;
    const DELETE_CAPABILITY: Capability = Capability::MutateModerationRecord;

    fn id(record: &Self::Record) -> RecordId {
        record.id
    }

    fn created_at(record: &Self::Record) -> DateTime<Utc> {
        record.created_at
    }

    fn status_label(record: &Self::Record) -> &'static str {
        record.status.as_str()
    }

    fn search_text(record: &Self::Record) -> Vec<&str> {
        vec![&record.name, &record.email]
    }

    fn sort_key(record: &Self::Record, field: SortField) -> SortKey {
        match field {
            SortField::CreatedAt => SortKey::Instant(record.created_at),
            SortField::Name => SortKey::Text(record.name.clone()),
            SortField::Email => SortKey::Text(record.email.clone()),
            SortField::Status => SortKey::Text(record.status.as_str().to_string()),
        }
    }

    fn transition(
        record: &Self::Record,
        action: Self::Action,
    ) -> Option<(Self::Record, Map<String, JsonValue>)> {
        // Only pending applications have outgoing edges; a decision is final.
        if record.status != ApplicationStatus::Pending {
            return None;
        }
        let mut next = record.clone();
        next.status = match action {
            ApplicationAction::Approve => ApplicationStatus::Approved,
            ApplicationAction::Reject => ApplicationStatus::Rejected,
        };
        let fields = single_field("status", next.status.as_str());
        Some((next, fields))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User directory
// ─────────────────────────────────────────────────────────────────────────────

/// The user directory: the role moves freely between any two values, but the
/// capabilities are target-protected (an admin never mutates themself here).
pub struct UserRoles;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UserAction {
    SetRole(Role),
}

impl RecordKind for UserRoles {
    type Record = UserRecord;
    type Action = UserAction;

    const COLLECTION: &'static str = "users";
    const MUTATE_CAPABILITY: Capability = Capability::ChangeUserRole;
    const DELETE_CAPABILITY: Capability = Capability::DeleteUser;

    fn id(record: &Self::Record) -> RecordId {
        record.id.into()
    }

    fn created_at(record: &Self::Record) -> DateTime<Utc> {
        record.created_at
    }

    fn status_label(record: &Self::Record) -> &'static str {
        record.role.as_str()
    }

    fn search_text(record: &Self::Record) -> Vec<&str> {
        vec![&record.display_name, &record.email]
    }

    fn sort_key(record: &Self::Record, field: SortField) -> SortKey {
        match field {
            SortField::CreatedAt => SortKey::Instant(record.created_at),
            SortField::Name => SortKey::Text(record.display_name.clone()),
            SortField::Email => SortKey::Text(record.email.clone()),
            SortField::Status => SortKey::Text(record.role.as_str().to_string()),
        }
    }

    fn transition(
        record: &Self::Record,
        action: Self::Action,
    ) -> Option<(Self::Record, Map<String, JsonValue>)> {
        let UserAction::SetRole(role) = action;
        let mut next = record.clone();
        next.role = role;
        let fields = single_field("role", role.as_str());
        Some((next, fields))
    }
}
