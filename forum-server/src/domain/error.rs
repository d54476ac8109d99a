use thiserror::Error;

use super::post::{FormErrors, INVALID_CHOICE_MESSAGE};

#[derive(Debug, Error)]
pub(crate) enum DomainError {
    #[error("validation failed for '{field}': {message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },

    #[error("form is invalid: {0}")]
    InvalidForm(FormErrors),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("resource already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("unexpected domain error: {0}")]
    Unexpected(String),
}

impl DomainError {
    /// The chosen group disappeared before the post was written.
    pub(crate) fn group_choice_gone() -> Self {
        let mut errors = FormErrors::default();
        errors.add("group", INVALID_CHOICE_MESSAGE);
        Self::InvalidForm(errors)
    }
}
