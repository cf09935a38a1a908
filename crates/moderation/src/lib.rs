//! `clubdesk-moderation` — the moderation workflow engine.
//!
//! One generic controller manages every admin list: it loads a record
//! collection, transitions records through the kind's declared state
//! machine, hard-deletes on confirmed request, and projects the list
//! through a filter/sort spec. The three kinds (messages, applications,
//! user roles) differ only in their [`RecordKind`] declarations.

pub mod engine;
pub mod filter;
pub mod kind;
pub mod kinds;
pub mod record;

pub use engine::{Confirmed, Moderator, RemoveOutcome};
pub use filter::{apply_filter_sort, FilterSortSpec, StatusFilter};
pub use kind::{RecordKind, SortField, SortKey};
pub use kinds::{
    ApplicationAction, Applications, MessageAction, Messages, UserAction, UserRoles,
};
pub use record::{
    ApplicationRecord, ApplicationStatus, MessageRecord, MessageStatus, UserRecord,
};
