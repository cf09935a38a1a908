//! `clubdesk-infra` — collaborator contracts and reference implementations.
//!
//! The rest of the system reaches its persistent store and its identity
//! backend only through the traits defined here. The in-memory
//! implementations exist for tests and development; a production deployment
//! supplies its own adapters.

pub mod document_store;
pub mod identity;

pub use document_store::{DocumentStore, InMemoryDocumentStore, SortDirection, StoreError};
pub use identity::{IdentityProvider, InMemoryIdentityProvider, OAuthProvider, ProviderError};
