use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{api::id::ApiId, db::Candidate};

/// Request body for casting a vote. The voter comes from the auth token.
#[derive(Debug, Clone, Deserialize)]
pub struct VoteSpec {
    pub candidate_id: String,
}

/// Receipt returned after a successful vote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub candidate_id: ApiId,
    pub created_at: DateTime<Utc>,
}

/// One row of the results dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResult {
    pub id: ApiId,
    pub name: String,
    pub party: String,
    pub logo_url: String,
    pub vote_count: u64,
    /// Share of the total vote, rounded to 2 decimal places; 0 when no
    /// votes have been cast at all.
    pub percentage: f64,
}

/// The full results dashboard payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionResults {
    pub results: Vec<CandidateResult>,
    pub total_votes: u64,
}

impl ElectionResults {
    /// Aggregate candidates into dashboard rows: sorted by vote count
    /// descending (stable, so ties keep their fetch order) with each
    /// candidate's percentage of the total.
    pub fn tally(mut candidates: Vec<Candidate>, total_votes: u64) -> Self {
        candidates.sort_by(|a, b| b.vote_count.cmp(&a.vote_count));
        let results = candidates
            .into_iter()
            .map(|candidate| {
                let percentage = if total_votes == 0 {
                    0.0
                } else {
                    let share = candidate.vote_count as f64 / total_votes as f64 * 100.0;
                    (share * 100.0).round() / 100.0
                };
                CandidateResult {
                    id: candidate.id.into(),
                    name: candidate.candidate.name,
                    party: candidate.candidate.party,
                    logo_url: candidate.candidate.logo_url,
                    vote_count: candidate.candidate.vote_count,
                    percentage,
                }
            })
            .collect();
        Self {
            results,
            total_votes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_are_sorted_descending() {
        let candidates = vec![
            Candidate::example("alpha", 2),
            Candidate::example("beta", 7),
            Candidate::example("gamma", 4),
        ];
        let results = ElectionResults::tally(candidates, 13);
        let counts: Vec<u64> = results.results.iter().map(|r| r.vote_count).collect();
        assert_eq!(counts, vec![7, 4, 2]);
        assert_eq!(results.total_votes, 13);
    }

    #[test]
    fn ties_keep_fetch_order() {
        let candidates = vec![
            Candidate::example("first", 3),
            Candidate::example("second", 3),
            Candidate::example("third", 3),
        ];
        let results = ElectionResults::tally(candidates, 9);
        let names: Vec<&str> = results.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn percentages_are_rounded_to_two_decimals() {
        let candidates = vec![
            Candidate::example("alpha", 1),
            Candidate::example("beta", 2),
        ];
        let results = ElectionResults::tally(candidates, 3);
        assert_eq!(results.results[0].percentage, 66.67);
        assert_eq!(results.results[1].percentage, 33.33);
    }

    #[test]
    fn percentages_sum_to_roughly_one_hundred() {
        let candidates = vec![
            Candidate::example("alpha", 5),
            Candidate::example("beta", 3),
            Candidate::example("gamma", 9),
        ];
        let results = ElectionResults::tally(candidates, 17);
        let sum: f64 = results.results.iter().map(|r| r.percentage).sum();
        assert!((sum - 100.0).abs() < 0.05, "sum was {sum}");
    }

    #[test]
    fn no_votes_means_all_zero_percentages() {
        let candidates = vec![
            Candidate::example("alpha", 0),
            Candidate::example("beta", 0),
        ];
        let results = ElectionResults::tally(candidates, 0);
        assert!(results.results.iter().all(|r| r.percentage == 0.0));
        assert_eq!(results.total_votes, 0);
    }
}
