use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core vote data: who voted for whom, and when.
///
/// The unique index on `voter_id` makes inserting a second vote for the
/// same voter fail with a duplicate key error, which is the exactly-once
/// guarantee. Votes are immutable and never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteCore {
    pub voter_id: Id,
    pub candidate_id: Id,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl VoteCore {
    /// Create a vote timestamped now.
    pub fn new(voter_id: Id, candidate_id: Id) -> Self {
        Self {
            voter_id,
            candidate_id,
            created_at: Utc::now(),
        }
    }
}

/// A vote without an ID.
pub type NewVote = VoteCore;

/// A vote from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub vote: VoteCore,
}

impl Deref for Vote {
    type Target = VoteCore;

    fn deref(&self) -> &Self::Target {
        &self.vote
    }
}

impl DerefMut for Vote {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.vote
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson;

    use super::*;

    #[test]
    fn timestamp_round_trips_as_bson_datetime() {
        let vote = VoteCore::new(Id::new(), Id::new());
        let doc = bson::to_document(&vote).unwrap();
        // Stored as a native BSON datetime, not a string.
        assert!(doc.get_datetime("created_at").is_ok());
        let back: VoteCore = bson::from_document(doc).unwrap();
        assert_eq!(back.voter_id, vote.voter_id);
        assert_eq!(back.candidate_id, vote.candidate_id);
        // BSON datetimes have millisecond precision.
        assert_eq!(
            back.created_at.timestamp_millis(),
            vote.created_at.timestamp_millis()
        );
    }
}
