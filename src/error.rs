use axum::{Json,
    http::StatusCode,
    response::IntoResponse
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{models::Status, repository::RepositoryError};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {}", describe_validation(.0))]
    Validation(#[from] ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// One human-readable line per failing field, sorted for stable output.
/// Only field names and rule codes appear, never the rejected values.
pub fn describe_validation(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errs)| {
            let codes: Vec<&str> = errs.iter().map(|e| &*e.code).collect();
            format!("field {} is not valid ({})", field, codes.join(", "))
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

/// Convert `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        // Map application errors to HTTP status codes and messages
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, describe_validation(&errors))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Repository(RepositoryError::Conflict(constraint)) => {
                tracing::warn!(constraint = %constraint, "Unique constraint violated");
                (StatusCode::CONFLICT, "Resource already exists".to_string())
            }
            AppError::Repository(RepositoryError::MissingReference(constraint)) => {
                tracing::warn!(constraint = %constraint, "Foreign key constraint violated");
                (
                    StatusCode::BAD_REQUEST,
                    "Referenced resource does not exist".to_string(),
                )
            }
            AppError::Repository(RepositoryError::Database(err)) => {
                tracing::error!("Database Error: {:}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
        };

        // Return standardized JSON error response
        let body = Json(json!({ "response": Status::error(error_message) }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 6))]
        username: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn test_describe_validation_lists_each_field() {
        let errors = Sample {
            username: "abc".to_string(),
            email: "nope".to_string(),
        }
        .validate()
        .unwrap_err();

        assert_eq!(
            describe_validation(&errors),
            "field email is not valid (email); field username is not valid (length)"
        );
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                AppError::Repository(RepositoryError::Conflict("users_username_key".into())),
                StatusCode::CONFLICT,
            ),
            (
                AppError::Repository(RepositoryError::MissingReference("fk".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Repository(RepositoryError::Database(sqlx::Error::PoolTimedOut)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
