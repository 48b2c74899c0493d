use mongodb::bson::doc;
use rocket::{futures::TryStreamExt, http::Status, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::AuthToken,
            vote::{ElectionResults, VoteReceipt, VoteSpec},
        },
        db::{vote::NewVote, Admin, Candidate, User, Vote},
        mongodb::{errors::is_duplicate_key_error, Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![cast_vote, results_admin, results_voter]
}

/// Cast the authenticated voter's single vote.
///
/// The `has_voted` pre-check only rejects obviously-late duplicates; two
/// concurrent requests can both pass it. What actually prevents a double
/// count is the unique index on `votes.voter_id`: the second insert fails
/// with a duplicate key error regardless of interleaving.
#[post("/votes/cast", data = "<spec>", format = "json")]
async fn cast_vote(
    token: AuthToken<User>,
    spec: Json<VoteSpec>,
    users: Coll<User>,
    candidates: Coll<Candidate>,
    votes: Coll<NewVote>,
) -> Result<(Status, Json<VoteReceipt>)> {
    let voter_id = token.id;

    // Fast path: the flag catches most duplicates before any writes.
    let voter = users
        .find_one(voter_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("No voter found with ID {voter_id}")))?;
    if voter.has_voted {
        return Err(Error::bad_request("You have already cast your vote."));
    }

    // The candidate must exist before we count anything towards it.
    let candidate_id: Id = spec.candidate_id.parse()?;
    candidates
        .find_one(candidate_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("No candidate found with ID {candidate_id}")))?;

    // The insert is the one-shot transition; the unique index on voter_id
    // rejects a second vote even if both requests passed the flag check.
    let vote = NewVote::new(voter_id, candidate_id);
    let result = votes.insert_one(&vote, None).await;
    if is_duplicate_key_error(result.as_ref().map(|_| ())) {
        return Err(Error::bad_request("Vote already recorded."));
    }
    result?;

    // Denormalised follow-ups, each a single atomic document update. If a
    // crash skips one, the reconciler recomputes it from the votes.
    users
        .update_one(
            voter_id.as_doc(),
            doc! { "$set": { "has_voted": true } },
            None,
        )
        .await?;
    candidates
        .update_one(
            candidate_id.as_doc(),
            doc! { "$inc": { "vote_count": 1 } },
            None,
        )
        .await?;

    info!("Vote recorded for candidate {candidate_id}");
    Ok((
        Status::Created,
        Json(VoteReceipt {
            candidate_id: candidate_id.into(),
            created_at: vote.created_at,
        }),
    ))
}

#[get("/votes/results", rank = 1)]
async fn results_admin(
    _token: AuthToken<Admin>,
    candidates: Coll<Candidate>,
    votes: Coll<Vote>,
) -> Result<Json<ElectionResults>> {
    results(candidates, votes).await
}

#[get("/votes/results", rank = 2)]
async fn results_voter(
    _token: AuthToken<User>,
    candidates: Coll<Candidate>,
    votes: Coll<Vote>,
) -> Result<Json<ElectionResults>> {
    results(candidates, votes).await
}

/// Live tallies. A pure read over the stored counters; consistent with the
/// vote path at read time, which is all a dashboard needs.
async fn results(candidates: Coll<Candidate>, votes: Coll<Vote>) -> Result<Json<ElectionResults>> {
    let all_candidates: Vec<Candidate> = candidates.find(None, None).await?.try_collect().await?;
    let total_votes = votes.count_documents(None, None).await?;
    Ok(Json(ElectionResults::tally(all_candidates, total_votes)))
}

/// Tests that drive the vote ledger against a real MongoDB, since the
/// exactly-once guarantee lives in the unique index rather than in any
/// Rust code path. Run them with `cargo test -- --ignored` and a local
/// `mongod`.
#[cfg(test)]
mod tests {
    use mongodb::Database;
    use rocket::{
        http::{ContentType, Cookie},
        local::asynchronous::Client,
        serde::json::json,
    };

    use crate::{
        client_and_db,
        model::{
            db::{
                candidate::CandidateCore,
                user::{Role, UserCore},
                NewCandidate, NewUser,
            },
            embedding::{Embedding, EMBEDDING_DIM},
        },
        Config,
    };

    use super::*;

    async fn seed_voter(db: &Database, voter_id: &str) -> User {
        let user = UserCore::new(
            format!("Voter {voter_id}"),
            format!("{voter_id}@example.com"),
            voter_id.to_string(),
            Embedding::new(vec![0.1; EMBEDDING_DIM]),
            format!("https://images.example.com/faces/{voter_id}.jpg"),
            Role::Voter,
        );
        let inserted = Coll::<NewUser>::from_db(db)
            .insert_one(&user, None)
            .await
            .unwrap();
        User {
            id: inserted.inserted_id.as_object_id().unwrap().into(),
            user,
        }
    }

    async fn seed_candidate(db: &Database) -> Candidate {
        let candidate = CandidateCore::new(
            "Vikram Shah".to_string(),
            "Unity Party".to_string(),
            "https://images.example.com/logos/unity.png".to_string(),
        );
        let inserted = Coll::<NewCandidate>::from_db(db)
            .insert_one(&candidate, None)
            .await
            .unwrap();
        Candidate {
            id: inserted.inserted_id.as_object_id().unwrap().into(),
            candidate,
        }
    }

    fn auth_cookie(client: &Client, voter: &User) -> Cookie<'static> {
        let config = client.rocket().state::<Config>().unwrap();
        AuthToken::new(voter).into_cookie(config)
    }

    #[rocket::async_test]
    #[ignore = "requires a running MongoDB"]
    async fn recorded_vote_beats_stale_flag() {
        let (client, db) = client_and_db().await;
        let voter = seed_voter(&db, "VOTER-1001").await;
        let candidate = seed_candidate(&db).await;

        // A vote already on record with the flag never set models a crash
        // between the insert and the follow-up updates. The index, not the
        // flag, must reject the retry.
        Coll::<NewVote>::from_db(&db)
            .insert_one(&NewVote::new(voter.id, candidate.id), None)
            .await
            .unwrap();

        let response = client
            .post(uri!(cast_vote))
            .cookie(auth_cookie(&client, &voter))
            .header(ContentType::JSON)
            .body(json!({ "candidate_id": candidate.id.to_string() }).to_string())
            .dispatch()
            .await;

        assert_eq!(Status::BadRequest, response.status());
        let body = response.into_string().await.unwrap();
        assert!(body.contains("Vote already recorded."));
        let total = Coll::<Vote>::from_db(&db)
            .count_documents(None, None)
            .await
            .unwrap();
        assert_eq!(1, total);

        db.drop(None).await.unwrap();
    }

    #[rocket::async_test]
    #[ignore = "requires a running MongoDB"]
    async fn concurrent_double_cast_records_one_vote() {
        let (client, db) = client_and_db().await;
        let voter = seed_voter(&db, "VOTER-1002").await;
        let candidate = seed_candidate(&db).await;

        let cookie = auth_cookie(&client, &voter);
        let body = json!({ "candidate_id": candidate.id.to_string() }).to_string();
        let request = || {
            client
                .post(uri!(cast_vote))
                .cookie(cookie.clone())
                .header(ContentType::JSON)
                .body(body.clone())
                .dispatch()
        };

        // Both requests can pass the `has_voted` check before either
        // insert lands; the unique index must still admit exactly one.
        let (first, second) = rocket::tokio::join!(request(), request());
        let statuses = [first.status(), second.status()];
        assert!(statuses.contains(&Status::Created));
        assert!(statuses.contains(&Status::BadRequest));

        let total = Coll::<Vote>::from_db(&db)
            .count_documents(None, None)
            .await
            .unwrap();
        assert_eq!(1, total);
        let stored = Coll::<Candidate>::from_db(&db)
            .find_one(candidate.id.as_doc(), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(1, stored.vote_count);
        let stored_voter = Coll::<User>::from_db(&db)
            .find_one(voter.id.as_doc(), None)
            .await
            .unwrap()
            .unwrap();
        assert!(stored_voter.has_voted);

        db.drop(None).await.unwrap();
    }
}
