//! Keyed document store boundary.
//!
//! This module defines an infrastructure-facing abstraction over persistent
//! JSON document collections without making any storage assumptions. The
//! session resolver reads role documents through it; the moderation engine
//! reads and mutates record collections through it.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryDocumentStore;
pub use r#trait::{DocumentStore, SortDirection, StoreError};
