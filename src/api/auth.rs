use mongodb::bson::doc;
use rocket::{
    futures::TryStreamExt,
    http::{Cookie, CookieJar, Status},
    serde::json::Json,
    Route, State,
};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            admin::AdminCredentials,
            auth::{AuthToken, AUTH_TOKEN_COOKIE},
            user::{LoginRequest, RegisterRequest, UserSummary},
        },
        db::{user::NewUser, Admin, Role, User},
        embedding::EMBEDDING_DIM,
        mongodb::{errors::is_duplicate_key_error, Coll},
    },
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![authenticate, register, login, me_admin, me_voter, logout]
}

/// Bootstrap admin sign-in with username and password. Face-enrolled
/// users (voters and admins alike) use [`login`] instead.
#[post("/auth/admin", data = "<credentials>", format = "json")]
async fn authenticate(
    cookies: &CookieJar<'_>,
    credentials: Json<AdminCredentials>,
    admins: Coll<Admin>,
    config: &State<Config>,
) -> Result<()> {
    let with_username = doc! {
        "username": &credentials.username
    };

    let admin = admins
        .find_one(with_username, None)
        .await?
        .filter(|admin| admin.verify_password(&credentials.password))
        .ok_or_else(|| {
            Error::unauthorized(
                "No admin found with the provided username and password combination.",
            )
        })?;

    let token = AuthToken::new(&admin);
    cookies.add(token.into_cookie(config));

    Ok(())
}

/// Register a voter (or another admin): store their identity and the face
/// embedding captured from their registration photo. Admin-only.
#[post("/auth/register", data = "<request>", format = "json")]
async fn register(
    _token: AuthToken<Admin>,
    request: Json<RegisterRequest>,
    users: Coll<User>,
    new_users: Coll<NewUser>,
    config: &State<Config>,
) -> Result<(Status, Json<UserSummary>)> {
    let request = request.into_inner();

    // Reject missing fields before touching the store.
    if request.name.trim().is_empty()
        || request.email.trim().is_empty()
        || request.voter_id.trim().is_empty()
        || request.profile_image_url.trim().is_empty()
    {
        return Err(Error::bad_request("Please provide all required fields"));
    }
    if request.embedding.len() != EMBEDDING_DIM {
        return Err(Error::bad_request(format!(
            "Expected a {EMBEDDING_DIM}-dimensional embedding, got {}",
            request.embedding.len()
        )));
    }

    // Identity uniqueness pre-check. The unique indexes close the race if
    // two registrations for the same identity arrive concurrently.
    let duplicate = doc! {
        "$or": [{"email": &request.email}, {"voter_id": &request.voter_id}],
    };
    if users.find_one(duplicate, None).await?.is_some() {
        return Err(Error::bad_request(
            "User with this email or Voter ID already exists",
        ));
    }

    // Duplicate-face check: scan every enrolled embedding.
    let enrolled: Vec<User> = users.find(None, None).await?.try_collect().await?;
    let gallery = enrolled.iter().map(|user| (user.id, &user.user.embedding));
    if request
        .embedding
        .closest_match(gallery, config.registration_threshold())
        .is_some()
    {
        return Err(Error::bad_request("This face is already registered."));
    }

    let new_user = NewUser::new(
        request.name,
        request.email,
        request.voter_id,
        request.embedding,
        request.profile_image_url,
        request.role,
    );
    let result = new_users.insert_one(&new_user, None).await;
    if is_duplicate_key_error(result.as_ref().map(|_| ())) {
        // Lost the race against a concurrent registration.
        return Err(Error::bad_request(
            "User with this email or Voter ID already exists",
        ));
    }
    let id = result?
        .inserted_id
        .as_object_id()
        .unwrap() // Safe because the ID comes directly from the database.
        .into();

    info!("Registered {} '{}'", new_user.role, new_user.voter_id);
    let user = User {
        id,
        user: new_user,
    };
    Ok((Status::Created, Json(user.into())))
}

/// Face login: identify the freshly captured embedding against every
/// stored user and authenticate as the closest match under the threshold.
#[post("/auth/login", data = "<request>", format = "json")]
async fn login(
    request: Json<LoginRequest>,
    cookies: &CookieJar<'_>,
    users: Coll<User>,
    config: &State<Config>,
) -> Result<Json<UserSummary>> {
    if request.embedding.is_empty() {
        return Err(Error::bad_request("No face embedding provided"));
    }

    let enrolled: Vec<User> = users.find(None, None).await?.try_collect().await?;
    let gallery = enrolled.iter().map(|user| (user.id, &user.user.embedding));
    let matched_id = request
        .embedding
        .closest_match(gallery, config.login_threshold())
        .ok_or_else(|| Error::unauthorized("Authentication failed. Face not recognized."))?;

    // The ID came out of the gallery we just scanned.
    let user = enrolled
        .into_iter()
        .find(|user| user.id == matched_id)
        .unwrap();

    // Rights come from the stored role, not from how the user signed in.
    let cookie = match user.role {
        Role::Voter => AuthToken::new(&user).into_cookie(config),
        Role::Admin => AuthToken::<Admin>::for_id(user.id).into_cookie(config),
    };
    cookies.add(cookie);

    info!("Face login as {} '{}'", user.role, user.voter_id);
    Ok(Json(user.into()))
}

#[get("/auth/me", rank = 1)]
async fn me_admin(token: AuthToken<Admin>, users: Coll<User>) -> Result<Json<UserSummary>> {
    profile(token.id.as_doc(), &users).await
}

#[get("/auth/me", rank = 2)]
async fn me_voter(token: AuthToken<User>, users: Coll<User>) -> Result<Json<UserSummary>> {
    profile(token.id.as_doc(), &users).await
}

/// Look up the face-enrolled profile behind a token. Bootstrap admins have
/// no such profile and get a 404.
async fn profile(
    filter: mongodb::bson::Document,
    users: &Coll<User>,
) -> Result<Json<UserSummary>> {
    let user = users
        .find_one(filter, None)
        .await?
        .ok_or_else(|| Error::not_found("No face-enrolled profile for this user"))?;
    Ok(Json(user.into()))
}

#[delete("/auth")]
fn logout(cookies: &CookieJar) -> Status {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    Status::Ok
}
