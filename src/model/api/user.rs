use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    db::{Role, User},
    embedding::Embedding,
};

/// Registration request, submitted by an admin on the voter's behalf.
///
/// The embedding is extracted from the registration photo by the client's
/// pretrained model; the profile image itself goes to blob storage outside
/// this service and only its URL is carried through.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub voter_id: String,
    pub embedding: Embedding,
    pub profile_image_url: String,
    #[serde(default)]
    pub role: Role,
}

/// Login request: just a freshly captured embedding.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub embedding: Embedding,
}

/// A user as returned by the API. Never includes the stored embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: ApiId,
    pub name: String,
    pub email: String,
    pub voter_id: String,
    pub profile_image_url: String,
    pub role: Role,
    pub has_voted: bool,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id.into(),
            name: user.user.name,
            email: user.user.email,
            voter_id: user.user.voter_id,
            profile_image_url: user.user.profile_image_url,
            role: user.user.role,
            has_voted: user.user.has_voted,
        }
    }
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json;

    use super::*;

    #[test]
    fn summary_does_not_leak_the_embedding() {
        let summary = UserSummary::from(User::example());
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("embedding").is_none());
        assert_eq!(json["role"], "voter");
        assert_eq!(json["has_voted"], false);
    }

    #[test]
    fn register_request_role_defaults_to_voter() {
        let json = r#"{
            "name": "Asha Rao",
            "email": "asha.rao@example.com",
            "voter_id": "VOTER-0001",
            "embedding": [0.1, 0.2],
            "profile_image_url": "https://images.example.com/faces/asha.jpg"
        }"#;
        let request: RegisterRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.role, Role::Voter);
        assert_eq!(request.embedding.len(), 2);
    }
}
