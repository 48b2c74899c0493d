use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use rocket::{
    http::Status,
    response::Responder,
    serde::json::{json, Json},
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] mongodb::error::Error),
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    OidParse(#[from] mongodb::bson::oid::Error),
    #[error(transparent)]
    Argon2(#[from] argon2::Error),
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::Status(Status::BadRequest, msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Status(Status::Unauthorized, msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::Status(Status::NotFound, msg.into())
    }

    /// The HTTP status and the client-visible reason for this error.
    /// Internal failures keep their details out of the response body.
    fn status_and_message(&self) -> (Status, String) {
        match self {
            Self::Db(_) => (
                Status::InternalServerError,
                "Store unavailable".to_string(),
            ),
            Self::Jwt(err) => match err.kind() {
                JwtErrorKind::ExpiredSignature | JwtErrorKind::ImmatureSignature => {
                    (Status::Unauthorized, "Token expired".to_string())
                }
                _ => (Status::BadRequest, "Invalid token".to_string()),
            },
            Self::OidParse(_) => (Status::BadRequest, "Malformed ID".to_string()),
            Self::Argon2(_) => (Status::BadRequest, "Illegal credentials".to_string()),
            Self::Status(status, msg) => (*status, msg.clone()),
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    /// Respond with the mapped status and a discriminated JSON reason, so
    /// the client can tell "already voted" from "no such candidate" from
    /// "server unavailable".
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let (status, message) = self.status_and_message();
        match status.class() {
            rocket::http::StatusClass::ServerError => error!("{self}"),
            _ => warn!("{self}"),
        }
        let body = Json(json!({ "error": message }));
        rocket::response::status::Custom(status, body).respond_to(req)
    }
}
