//! `clubdesk-session` — the session & authorization resolver.
//!
//! Consumes identity-change events and role-document reads to maintain the
//! single authoritative `(identity, role, ready)` snapshot, and wraps the
//! identity provider's account operations so brand-new accounts get their
//! role document seeded.

pub mod accounts;
pub mod resolver;

pub use accounts::Accounts;
pub use resolver::{pump_identity_events, SessionResolver, USERS_COLLECTION};
