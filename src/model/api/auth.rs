use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use rocket::{
    http::{Cookie, SameSite, Status},
    outcome::{try_outcome, IntoOutcome},
    request::{FromRequest, Outcome},
    time::Duration,
    Request, State,
};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::config::Config;
use crate::error::Error;
use crate::model::{
    db::{Admin, Role, User},
    mongodb::{Coll, Id},
};

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// Different privilege levels.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Rights {
    Voter = 0,
    Admin = 1,
}

impl Display for Rights {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::Voter => "voter",
                Self::Admin => "admin",
            }
        )
    }
}

impl From<Role> for Rights {
    fn from(role: Role) -> Self {
        match role {
            Role::Voter => Self::Voter,
            Role::Admin => Self::Admin,
        }
    }
}

/// Someone who can hold an authentication token, with defined rights.
pub trait AuthUser {
    /// The rights of this user type.
    const RIGHTS: Rights;
    /// Get the user's ID.
    fn id(&self) -> Id;
}

impl AuthUser for User {
    const RIGHTS: Rights = Rights::Voter;

    fn id(&self) -> Id {
        self.id
    }
}

impl AuthUser for Admin {
    const RIGHTS: Rights = Rights::Admin;

    fn id(&self) -> Id {
        self.id
    }
}

/// An authentication token representing a specific user with specific rights.
#[derive(Serialize, Deserialize)]
pub struct AuthToken<U> {
    pub id: Id,
    #[serde(rename = "rgt")]
    pub rights: Rights,
    #[serde(skip)]
    phantom: PhantomData<U>,
}

impl<U> AuthToken<U> {
    /// Does this token permit the given rights?
    pub fn permits(&self, target: Rights) -> bool {
        self.rights == target
    }
}

impl<U> AuthToken<U>
where
    U: AuthUser,
{
    /// Create a new [`AuthToken`] for the given user, with the correct rights for that user type.
    pub fn new(user: &U) -> Self {
        Self::for_id(user.id())
    }

    /// Create a new [`AuthToken`] for the given user ID. Needed when the
    /// rights come from a stored role rather than the Rust type, e.g. a
    /// face-enrolled administrator.
    pub fn for_id(id: Id) -> Self {
        Self {
            id,
            rights: U::RIGHTS,
            phantom: PhantomData,
        }
    }

    #[allow(clippy::missing_panics_doc)]
    /// Serialize this token into a cookie.
    pub fn into_cookie(self, config: &Config) -> Cookie<'static> {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.auth_ttl(),
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )
        .expect("JWT encoding is infallible with default settings");

        Cookie::build(AUTH_TOKEN_COOKIE, token)
            .max_age(Duration::seconds(config.auth_ttl().num_seconds()))
            .http_only(true)
            .same_site(SameSite::Strict)
            .finish()
    }

    /// Deserialize a token from a cookie.
    pub fn from_cookie(cookie: &Cookie<'static>, config: &Config) -> Result<Self, Error> {
        let token = jsonwebtoken::decode(
            cookie.value(),
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims<U>>| claims.claims.token)?;
        Ok(token)
    }
}

/// Cookie claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims<U> {
    #[serde(flatten, bound = "")]
    token: AuthToken<U>,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

#[rocket::async_trait]
impl<'r, U> FromRequest<'r> for AuthToken<U>
where
    U: AuthUser + Send,
{
    type Error = Error;

    /// Get an [`AuthToken`] from the cookie and verify that it has the correct rights for this user
    /// type.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Unwrap is safe as `Config` is always managed.
        let config = req.guard::<&State<Config>>().await.unwrap();

        // Forward to any routes that do not require an authentication token.
        let cookie = try_outcome!(req.cookies().get(AUTH_TOKEN_COOKIE).or_forward(()));

        // Decode the token.
        let token: Self = try_outcome!(Self::from_cookie(cookie, config).or_forward(()));

        // Check it represents the correct rights.
        if !token.permits(U::RIGHTS) {
            return Outcome::Forward(());
        }

        // Check the user actually exists.
        let db = req.guard::<&State<mongodb::Database>>().await.unwrap();
        match token.rights {
            Rights::Voter => {
                let voter = Coll::<User>::from_db(db)
                    .find_one(token.id.as_doc(), None)
                    .await;
                match voter {
                    Ok(Some(_)) => Outcome::Success(token),
                    Ok(None) => Outcome::Forward(()),
                    Err(e) => Outcome::Failure((Status::InternalServerError, e.into())),
                }
            }
            Rights::Admin => {
                // Admin rights are held by bootstrap admins and by
                // face-enrolled users with the admin role.
                let admin = Coll::<Admin>::from_db(db)
                    .find_one(token.id.as_doc(), None)
                    .await;
                match admin {
                    Ok(Some(_)) => return Outcome::Success(token),
                    Ok(None) => {}
                    Err(e) => return Outcome::Failure((Status::InternalServerError, e.into())),
                }
                let mut filter = token.id.as_doc();
                filter.insert("role", "admin");
                let user = Coll::<User>::from_db(db).find_one(filter, None).await;
                match user {
                    Ok(Some(_)) => Outcome::Success(token),
                    Ok(None) => Outcome::Forward(()),
                    Err(e) => Outcome::Failure((Status::InternalServerError, e.into())),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_survives_the_cookie_round_trip() {
        let config = Config::example();
        let user = User::example();
        let token = AuthToken::new(&user);
        let cookie = token.into_cookie(&config);

        let decoded = AuthToken::<User>::from_cookie(&cookie, &config).unwrap();
        assert_eq!(decoded.id, user.id);
        assert!(decoded.permits(Rights::Voter));
        assert!(!decoded.permits(Rights::Admin));
    }

    #[test]
    fn voter_token_does_not_grant_admin_rights() {
        let config = Config::example();
        let cookie = AuthToken::new(&User::example()).into_cookie(&config);
        // The claims decode under either type parameter; what gates access
        // is the rights check the request guard performs.
        let decoded = AuthToken::<Admin>::from_cookie(&cookie, &config).unwrap();
        assert!(!decoded.permits(Admin::RIGHTS));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let config = Config::example();
        let cookie = AuthToken::new(&User::example()).into_cookie(&config);
        let mut forged = cookie.value().to_string();
        forged.pop();
        let forged_cookie = Cookie::new(AUTH_TOKEN_COOKIE, forged);
        assert!(AuthToken::<User>::from_cookie(&forged_cookie, &config).is_err());
    }

    #[test]
    fn rights_follow_the_stored_role() {
        assert_eq!(Rights::from(Role::Voter), Rights::Voter);
        assert_eq!(Rights::from(Role::Admin), Rights::Admin);
    }
}
