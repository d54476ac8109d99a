use crate::domain::error::DomainError;
use axum::{
    Json,
    extract::rejection::FormRejection,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

pub(crate) const LOGIN_PATH: &str = "/auth/login/";

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Form(#[from] FormRejection),

    /// Anonymous access to a page that needs a principal.
    #[error("login required to access {next}")]
    LoginRequired { next: String },
}

pub(crate) type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            AppError::LoginRequired { next } => {
                return Redirect::to(&login_url(&next)).into_response();
            }
            AppError::Form(rejection) => return rejection.into_response(),
            AppError::Domain(err) => match &err {
                DomainError::Validation { .. } | DomainError::InvalidForm(_) => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                DomainError::AlreadyExists(_) => (StatusCode::CONFLICT, err.to_string()),
                DomainError::InvalidCredentials => (StatusCode::UNAUTHORIZED, err.to_string()),
                DomainError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
                DomainError::Unexpected(_) => {
                    error!(error = %err, "request failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal error".to_string(),
                    )
                }
            },
            AppError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
        };

        (status, Json(ErrorBody { error: msg })).into_response()
    }
}

/// Login page URL that sends the user back to `next` afterwards.
pub(crate) fn login_url(next: &str) -> String {
    match serde_urlencoded::to_string([("next", next)]) {
        Ok(query) => format!("{LOGIN_PATH}?{query}"),
        Err(_) => LOGIN_PATH.to_string(),
    }
}
