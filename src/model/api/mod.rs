//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - IDs are serialised as hex strings.
//! - Datetimes are serialised as RFC 3339 strings.

pub mod admin;
pub mod auth;
pub mod candidate;
pub mod id;
pub mod user;
pub mod vote;

pub use auth::{AuthToken, AuthUser, Rights, AUTH_TOKEN_COOKIE};
pub use id::ApiId;
