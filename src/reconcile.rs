//! Background reconciliation of the denormalised vote state.
//!
//! A vote is recorded in up to three places: the vote document itself, the
//! voter's `has_voted` flag, and the candidate's `vote_count`. The insert
//! is the source of truth; the other two are separate single-document
//! updates, so a crash between them can leave the counters behind. Rather
//! than trusting the incremental counters blindly, this task periodically
//! recomputes them from the votes collection.

use mongodb::{bson::doc, Database};
use rocket::{
    fairing::{Fairing, Info, Kind},
    futures::TryStreamExt,
    tokio,
    tokio::time::{interval, Duration, MissedTickBehavior},
    Orbit, Rocket,
};

use crate::{
    error::Result,
    model::{
        db::{Candidate, User, Vote},
        mongodb::Coll,
    },
    Config,
};

/// A fairing that spawns the periodic reconciliation task at liftoff.
pub struct ReconcilerFairing;

#[rocket::async_trait]
impl Fairing for ReconcilerFairing {
    fn info(&self) -> Info {
        Info {
            name: "Vote count reconciler",
            kind: Kind::Liftoff,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        // Unwraps are safe as both are managed by earlier fairings.
        let config = rocket.state::<Config>().unwrap();
        let seconds = config.reconcile_interval();
        if seconds == 0 {
            info!("Vote count reconciliation disabled");
            return;
        }
        let db = rocket.state::<Database>().unwrap().clone();

        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(seconds.into()));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately, repairing any drift left
            // over from a previous run.
            loop {
                ticker.tick().await;
                if let Err(e) = reconcile(&db).await {
                    warn!("Vote count reconciliation failed: {e}");
                }
            }
        });
        info!("Vote count reconciliation running every {seconds}s");
    }
}

/// Recompute every candidate's `vote_count` from the votes collection and
/// repair any voter whose vote was recorded but whose flag was never set.
pub async fn reconcile(db: &Database) -> Result<()> {
    let candidates = Coll::<Candidate>::from_db(db);
    let votes = Coll::<Vote>::from_db(db);
    let users = Coll::<User>::from_db(db);

    // Counters: the votes collection is the source of truth.
    let all_candidates: Vec<Candidate> = candidates.find(None, None).await?.try_collect().await?;
    for candidate in all_candidates {
        let actual = votes
            .count_documents(doc! { "candidate_id": candidate.id }, None)
            .await?;
        if actual != candidate.vote_count {
            warn!(
                "Candidate {} vote count drifted: stored {}, actual {}",
                candidate.id, candidate.vote_count, actual
            );
            candidates
                .update_one(
                    candidate.id.as_doc(),
                    doc! { "$set": { "vote_count": actual as i64 } },
                    None,
                )
                .await?;
        }
    }

    // Flags: anyone with a vote on record has voted.
    let voted = votes.distinct("voter_id", None, None).await?;
    let repaired = users
        .update_many(
            doc! { "_id": { "$in": voted }, "has_voted": false },
            doc! { "$set": { "has_voted": true } },
            None,
        )
        .await?;
    if repaired.modified_count > 0 {
        warn!(
            "Repaired has_voted flag for {} voter(s)",
            repaired.modified_count
        );
    }

    Ok(())
}

/// Tests against a real MongoDB; run with `cargo test -- --ignored` and a
/// local `mongod`.
#[cfg(test)]
mod tests {
    use crate::{
        client_and_db,
        model::{
            db::{
                candidate::CandidateCore,
                user::{Role, UserCore},
                vote::NewVote,
                NewCandidate, NewUser,
            },
            embedding::{Embedding, EMBEDDING_DIM},
            mongodb::Id,
        },
    };

    use super::*;

    async fn seed_candidate(db: &Database, name: &str, vote_count: u64) -> Id {
        let mut candidate = CandidateCore::new(
            name.to_string(),
            format!("{name} Party"),
            format!("https://images.example.com/logos/{name}.png"),
        );
        candidate.vote_count = vote_count;
        let inserted = Coll::<NewCandidate>::from_db(db)
            .insert_one(&candidate, None)
            .await
            .unwrap();
        inserted.inserted_id.as_object_id().unwrap().into()
    }

    async fn seed_voter(db: &Database, voter_id: &str, has_voted: bool) -> Id {
        let mut user = UserCore::new(
            format!("Voter {voter_id}"),
            format!("{voter_id}@example.com"),
            voter_id.to_string(),
            Embedding::new(vec![0.1; EMBEDDING_DIM]),
            format!("https://images.example.com/faces/{voter_id}.jpg"),
            Role::Voter,
        );
        user.has_voted = has_voted;
        let inserted = Coll::<NewUser>::from_db(db)
            .insert_one(&user, None)
            .await
            .unwrap();
        inserted.inserted_id.as_object_id().unwrap().into()
    }

    #[rocket::async_test]
    #[ignore = "requires a running MongoDB"]
    async fn repairs_drifted_counter_and_unset_flag() {
        let (_client, db) = client_and_db().await;

        // "alpha" claims five votes but only has two on record; the voter
        // behind one of them never had their flag set. "beta" is in sync.
        let alpha = seed_candidate(&db, "alpha", 5).await;
        let beta = seed_candidate(&db, "beta", 1).await;
        let flagged = seed_voter(&db, "VOTER-2001", true).await;
        let unflagged = seed_voter(&db, "VOTER-2002", false).await;
        let beta_voter = seed_voter(&db, "VOTER-2003", true).await;
        let votes = Coll::<NewVote>::from_db(&db);
        for (voter, candidate) in [(flagged, alpha), (unflagged, alpha), (beta_voter, beta)] {
            votes
                .insert_one(&NewVote::new(voter, candidate), None)
                .await
                .unwrap();
        }

        reconcile(&db).await.unwrap();

        let candidates = Coll::<Candidate>::from_db(&db);
        let alpha_stored = candidates.find_one(alpha.as_doc(), None).await.unwrap().unwrap();
        let beta_stored = candidates.find_one(beta.as_doc(), None).await.unwrap().unwrap();
        assert_eq!(2, alpha_stored.vote_count);
        assert_eq!(1, beta_stored.vote_count);

        // Counters now agree with the ledger in aggregate too.
        let total_votes = Coll::<Vote>::from_db(&db)
            .count_documents(None, None)
            .await
            .unwrap();
        assert_eq!(
            total_votes,
            alpha_stored.vote_count + beta_stored.vote_count
        );

        let repaired = Coll::<User>::from_db(&db)
            .find_one(unflagged.as_doc(), None)
            .await
            .unwrap()
            .unwrap();
        assert!(repaired.has_voted);

        db.drop(None).await.unwrap();
    }
}
