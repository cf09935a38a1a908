//! The seam between the generic engine and a concrete record kind.
//!
//! Each kind declares its collection, its capabilities, its transition
//! table, and its field accessors; the engine re-derives nothing.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use clubdesk_auth::Capability;
use clubdesk_core::RecordId;

/// Field a list view can sort by.
///
/// `Name` and `Status` map onto the closest per-kind field: display name and
/// role for the user directory.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    CreatedAt,
    Name,
    Email,
    Status,
}

/// Sort key projected out of a record for one field choice.
///
/// Instants compare by instant, text case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    Instant(DateTime<Utc>),
    Text(String),
}

/// Declaration of one moderation record kind.
pub trait RecordKind: Send + Sync + 'static {
    /// Row type managed by the engine.
    type Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static;
    /// Transition label accepted by `transition`.
    type Action: Copy + core::fmt::Debug + Send + Sync + 'static;

    /// Store collection holding this kind.
    const COLLECTION: &'static str;
    /// Capability required to transition a record of this kind.
    const MUTATE_CAPABILITY: Capability;
    /// Capability required to hard-delete a record of this kind.
    const DELETE_CAPABILITY: Capability;

    fn id(record: &Self::Record) -> RecordId;

    fn created_at(record: &Self::Record) -> DateTime<Utc>;

    /// Exact-match key for the status filter (the role for users).
    fn status_label(record: &Self::Record) -> &'static str;

    /// Fields the search term matches against, case-insensitively.
    fn search_text(record: &Self::Record) -> Vec<&str>;

    fn sort_key(record: &Self::Record, field: SortField) -> SortKey;

    /// The state machine: the successor record plus the fields to persist,
    /// or `None` when the current status has no outgoing edge for `action`.
    fn transition(
        record: &Self::Record,
        action: Self::Action,
    ) -> Option<(Self::Record, Map<String, JsonValue>)>;
}
