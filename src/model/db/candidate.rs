use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core candidate data. Immutable after creation except for `vote_count`,
/// which only ever moves via atomic `$inc` updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCore {
    pub name: String,
    pub party: String,
    pub logo_url: String,
    pub vote_count: u64,
}

impl CandidateCore {
    /// Create a new candidate with zero votes.
    pub fn new(name: String, party: String, logo_url: String) -> Self {
        Self {
            name,
            party,
            logo_url,
            vote_count: 0,
        }
    }
}

/// A candidate without an ID.
pub type NewCandidate = CandidateCore;

/// A candidate from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl Candidate {
        pub fn example(name: &str, vote_count: u64) -> Self {
            Self {
                id: Id::new(),
                candidate: CandidateCore {
                    name: name.to_string(),
                    party: format!("{name} Party"),
                    logo_url: format!("https://images.example.com/logos/{name}.png"),
                    vote_count,
                },
            }
        }
    }
}
