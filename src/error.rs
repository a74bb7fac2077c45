use log::warn;
use rocket::{
    http::Status,
    response::{status, Responder},
    serde::json::Json,
};
use thiserror::Error;

use crate::model::api::ErrorBody;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Nullifier already used: {0}")]
    DuplicateNullifier(String),
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl Error {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Stable machine-readable name for the error, sent alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::DuplicateNullifier(_) => "duplicate_nullifier",
            Self::Conflict(_) => "conflict",
        }
    }

    /// The HTTP status this error is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::BadRequest(_) | Self::DuplicateNullifier(_) => Status::BadRequest,
            Self::NotFound(_) => Status::NotFound,
            Self::Conflict(_) => Status::Conflict,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        warn!("{self}");
        let body = ErrorBody {
            error: self.to_string(),
            kind: self.kind().to_string(),
        };
        status::Custom(self.status(), Json(body)).respond_to(req)
    }
}
