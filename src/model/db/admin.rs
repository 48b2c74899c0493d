use std::ops::{Deref, DerefMut};

use mongodb::bson::doc;
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    model::mongodb::{Coll, Id},
    Config,
};

/// Core bootstrap-admin data.
///
/// Voter registration is admin-only, so at least one admin must exist
/// before any face can be enrolled. Bootstrap admins therefore sign in
/// with a username and password rather than a face.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCore {
    pub username: String,
    pub password_hash: String,
}

impl AdminCore {
    /// Create an admin with the given credentials, hashing the password.
    pub fn new(username: String, password: &str) -> Result<Self> {
        let salt: [u8; 16] = rand::random();
        let password_hash =
            argon2::hash_encoded(password.as_bytes(), &salt, &argon2::Config::default())?;
        Ok(Self {
            username,
            password_hash,
        })
    }

    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        // Unwrap safe because an AdminCore can only be built by `new`,
        // so the hash is always well-formed.
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap()
    }
}

/// An admin without an ID.
pub type NewAdmin = AdminCore;

/// An admin user from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub admin: AdminCore,
}

impl Deref for Admin {
    type Target = AdminCore;

    fn deref(&self) -> &Self::Target {
        &self.admin
    }
}

impl DerefMut for Admin {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.admin
    }
}

/// Ensure at least one admin exists, creating the default one from config
/// if the collection is empty.
pub async fn ensure_admin_exists(admins: &Coll<NewAdmin>, config: &Config) -> Result<()> {
    let count = admins.count_documents(None, None).await?;
    if count == 0 {
        let admin = AdminCore::new(
            config.default_admin_username().to_string(),
            config.default_admin_password(),
        )?;
        info!("No admins found, creating default admin '{}'", admin.username);
        admins.insert_one(admin, None).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_verifies() {
        let admin = AdminCore::new("coordinator".to_string(), "hunter2").unwrap();
        assert!(admin.verify_password("hunter2"));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let admin = AdminCore::new("coordinator".to_string(), "hunter2").unwrap();
        assert!(!admin.verify_password("hunter3"));
        assert!(!admin.verify_password(""));
    }

    #[test]
    fn hashes_are_salted() {
        let a = AdminCore::new("a".to_string(), "same-password").unwrap();
        let b = AdminCore::new("b".to_string(), "same-password").unwrap();
        assert_ne!(a.password_hash, b.password_hash);
    }
}
