//! Identity provider boundary.
//!
//! Sign-in/sign-up/sign-out primitives plus an identity-change stream,
//! without assuming any particular backend. The boundary forwards the
//! stream's events into the session resolver.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryIdentityProvider;
pub use r#trait::{IdentityProvider, OAuthProvider, ProviderError};
