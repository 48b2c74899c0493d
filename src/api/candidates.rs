use rocket::{futures::TryStreamExt, http::Status, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::AuthToken,
            candidate::{CandidateDescription, CandidateSpec},
        },
        db::{candidate::NewCandidate, Admin, Candidate, User},
        mongodb::Coll,
    },
};

pub fn routes() -> Vec<Route> {
    routes![get_candidates_admin, get_candidates_voter, add_candidate]
}

#[get("/candidates", rank = 1)]
async fn get_candidates_admin(
    _token: AuthToken<Admin>,
    candidates: Coll<Candidate>,
) -> Result<Json<Vec<CandidateDescription>>> {
    all_candidates(candidates).await
}

#[get("/candidates", rank = 2)]
async fn get_candidates_voter(
    _token: AuthToken<User>,
    candidates: Coll<Candidate>,
) -> Result<Json<Vec<CandidateDescription>>> {
    all_candidates(candidates).await
}

async fn all_candidates(candidates: Coll<Candidate>) -> Result<Json<Vec<CandidateDescription>>> {
    let candidates: Vec<Candidate> = candidates.find(None, None).await?.try_collect().await?;
    Ok(Json(candidates.into_iter().map(Into::into).collect()))
}

/// Add a candidate to the ballot. Admin-only; candidates are immutable
/// after creation apart from their vote count.
#[post("/candidates", data = "<spec>", format = "json")]
async fn add_candidate(
    _token: AuthToken<Admin>,
    spec: Json<CandidateSpec>,
    new_candidates: Coll<NewCandidate>,
) -> Result<(Status, Json<CandidateDescription>)> {
    let spec = spec.into_inner();
    if spec.name.trim().is_empty() || spec.party.trim().is_empty() || spec.logo_url.trim().is_empty()
    {
        return Err(Error::bad_request(
            "Please provide name, party, and a logo URL.",
        ));
    }

    let candidate = NewCandidate::new(spec.name, spec.party, spec.logo_url);
    let id = new_candidates
        .insert_one(&candidate, None)
        .await?
        .inserted_id
        .as_object_id()
        .unwrap() // Safe because the ID comes directly from the database.
        .into();

    info!("Added candidate '{}' ({})", candidate.name, candidate.party);
    let candidate = Candidate { id, candidate };
    Ok((Status::Created, Json(candidate.into())))
}
