//! Session history persistence
//!
//! The store and the identity provider are external services; this module
//! holds the traits the session controller writes through and their REST
//! and static implementations.

mod identity;
mod rest;
mod writer;

pub use identity::{IdentityProvider, StaticIdentity, UserIdentity};
pub use rest::RestSessionHistory;
pub use writer::{PersistenceError, SessionHistoryRecord, SessionHistoryWriter};
