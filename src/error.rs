use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use serde_json::json;
use thiserror::Error;

/// Failures raised by the data-access layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Map a UNIQUE violation to `Conflict` with the given message.
    pub fn unique_as_conflict(self, msg: &str) -> Self {
        match self {
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                StoreError::Conflict(msg.to_string())
            }
            other => other,
        }
    }
}

/// Every handler failure, rendered as `{"status": "error", "message": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("Too many requests. Please wait before trying again.")]
    RateLimited,
    #[error("storage failure: {0}")]
    Storage(StoreError),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ApiError::InvalidInput(msg.into())
    }

    pub fn status(&self) -> Status {
        match self {
            ApiError::InvalidInput(_) => Status::BadRequest,
            ApiError::InvalidCredentials | ApiError::Unauthenticated => Status::Unauthorized,
            ApiError::Unauthorized => Status::Forbidden,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::Conflict(_) => Status::Conflict,
            ApiError::RateLimited => Status::TooManyRequests,
            ApiError::Storage(_) | ApiError::Internal(_) => Status::InternalServerError,
        }
    }

    /// Message shown to the client. Driver errors never leave the process.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Storage(_) | ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => ApiError::NotFound(what),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Storage(other),
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        if self.status() == Status::InternalServerError {
            log::error!("{} {}: {}", req.method(), req.uri(), self);
        }
        let body = json!({ "status": "error", "message": self.public_message() });
        (self.status(), Json(body)).respond_to(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_hide_driver_detail() {
        let err = ApiError::from(StoreError::Sqlite(rusqlite::Error::InvalidQuery));
        assert_eq!(err.status(), Status::InternalServerError);
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn store_not_found_and_conflict_keep_their_meaning() {
        let nf = ApiError::from(StoreError::NotFound("Comment"));
        assert_eq!(nf.status(), Status::NotFound);
        assert_eq!(nf.public_message(), "Comment not found");

        let c = ApiError::from(StoreError::Conflict("taken".into()));
        assert_eq!(c.status(), Status::Conflict);
    }

    #[test]
    fn unauthorized_is_forbidden() {
        assert_eq!(ApiError::Unauthorized.status(), Status::Forbidden);
        assert_eq!(ApiError::Unauthorized.public_message(), "Unauthorized");
    }
}
