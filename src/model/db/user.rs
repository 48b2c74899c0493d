use std::fmt::{Display, Formatter};
use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::{embedding::Embedding, mongodb::Id};

/// Authorisation tier of a registered user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Voter,
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Self::Voter
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Voter => write!(f, "voter"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// Core user data, as stored in the database: identity plus the biometric
/// template captured at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCore {
    pub name: String,
    /// Unique per user, enforced by an index.
    pub email: String,
    /// Government-issued voter ID; unique per user, enforced by an index.
    pub voter_id: String,
    /// The face embedding captured at registration.
    pub embedding: Embedding,
    pub profile_image_url: String,
    pub role: Role,
    /// Starts false; set to true exactly once when a vote is recorded.
    /// The unique index on the votes collection is the real double-vote
    /// guard; this flag is a fast-path denormalisation of it.
    pub has_voted: bool,
}

impl UserCore {
    /// Create a new user who has not yet voted.
    pub fn new(
        name: String,
        email: String,
        voter_id: String,
        embedding: Embedding,
        profile_image_url: String,
        role: Role,
    ) -> Self {
        Self {
            name,
            email,
            voter_id,
            embedding,
            profile_image_url,
            role,
            has_voted: false,
        }
    }
}

/// A user without an ID.
pub type NewUser = UserCore;

/// A user from the database, with their unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub user: UserCore,
}

impl Deref for User {
    type Target = UserCore;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

impl DerefMut for User {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.user
    }
}


#[cfg(test)]
mod tests {
    use mongodb::bson;

    use super::*;

    #[test]
    fn new_users_have_not_voted() {
        assert!(!UserCore::example().has_voted);
    }

    #[test]
    fn role_serialises_lowercase() {
        assert_eq!(bson::to_bson(&Role::Voter).unwrap(), bson::bson!("voter"));
        assert_eq!(bson::to_bson(&Role::Admin).unwrap(), bson::bson!("admin"));
    }

    #[test]
    fn db_round_trip_preserves_embedding() {
        let user = User::example();
        let doc = bson::to_document(&user).unwrap();
        // The ID is stored under `_id` and the core fields are flattened.
        assert!(doc.contains_key("_id"));
        assert!(doc.contains_key("embedding"));
        let back: User = bson::from_document(doc).unwrap();
        assert_eq!(back.id, user.id);
        assert_eq!(back.user, user.user);
    }
}
