use serde::{Deserialize, Serialize};

/// Username and password credentials for a bootstrap admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl AdminCredentials {
        pub fn example() -> Self {
            Self {
                username: "coordinator".to_string(),
                password: "correct horse battery staple".to_string(),
            }
        }
    }
}
