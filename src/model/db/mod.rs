//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in a DB-friendly way, e.g.:
//!
//! - IDs and datetimes are serialised in MongoDB's own format.

pub mod admin;
pub use admin::{Admin, NewAdmin};

pub mod candidate;
pub use candidate::{Candidate, NewCandidate};

pub mod user;
pub use user::{NewUser, Role, User};

pub mod vote;
pub use vote::{NewVote, Vote};
