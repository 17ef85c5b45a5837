use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;
use warbler_db::StoreError;
use warbler_types::api::ErrorResponse;

/// API failure taxonomy. Every authorization failure collapses into the one
/// `Unauthorized` variant so the response never reveals whether it was a
/// missing session or a foreign resource.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Access unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error("{0} already taken")]
    Duplicate(&'static str),

    #[error("not found")]
    NotFound,

    #[error("internal error")]
    Internal,
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(msg) => Self::Validation(msg),
            StoreError::Duplicate(what) => Self::Duplicate(what),
            StoreError::NotFound => Self::NotFound,
            StoreError::LockPoisoned | StoreError::Sqlite(_) => {
                error!("store failure: {}", err);
                Self::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Duplicate(_) => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
