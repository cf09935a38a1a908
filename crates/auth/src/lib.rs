//! `clubdesk-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from I/O and storage: it defines the
//! role/capability vocabulary, the session snapshot, the administrator
//! allowlist, the ordered role-resolution policy, and the authorization gate.
//! Everything here is deterministic and side-effect free.

pub mod allowlist;
pub mod capability;
pub mod gate;
pub mod identity;
pub mod policy;
pub mod roles;
pub mod session;

pub use allowlist::AdminAllowlist;
pub use capability::Capability;
pub use gate::{authorize, authorize_target, can_access, can_access_target, decide, AccessDecision};
pub use identity::Identity;
pub use policy::{resolve_role, RoleEvidence};
pub use roles::Role;
pub use session::{Session, SessionHandle};
