use serde::{Deserialize, Serialize};

use crate::model::{api::id::ApiId, db::Candidate};

/// Request body for creating a candidate. The logo is uploaded to blob
/// storage by the client; only its URL reaches this service.
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateSpec {
    pub name: String,
    pub party: String,
    pub logo_url: String,
}

/// A candidate as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateDescription {
    pub id: ApiId,
    pub name: String,
    pub party: String,
    pub logo_url: String,
    pub vote_count: u64,
}

impl From<Candidate> for CandidateDescription {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id.into(),
            name: candidate.candidate.name,
            party: candidate.candidate.party,
            logo_url: candidate.candidate.logo_url,
            vote_count: candidate.candidate.vote_count,
        }
    }
}
