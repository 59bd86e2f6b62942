pub mod annotations;
pub mod health;
pub mod images;
pub mod users;

use axum::{
    Json,
    extract::{
        Path,
        rejection::{JsonRejection, PathRejection},
    },
};
use tracing::warn;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, describe_validation};

/// Unwraps a JSON body and runs its validation rules. Nothing downstream runs
/// unless both succeed.
pub(crate) fn validated<T: Validate>(
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let Json(body) = payload.map_err(|e| {
        // Rejection text can quote the offending value, so only the status is logged.
        warn!(status = %e.status(), "Failed to decode request");
        AppError::BadRequest("Failed to decode request".to_string())
    })?;

    body.validate().map_err(|e| {
        warn!(fields = %describe_validation(&e), "Invalid request payload");
        AppError::from(e)
    })?;
    Ok(body)
}

/// Extracts a UUID path segment, reporting a malformed one as a client error.
pub(crate) fn path_id(id: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, AppError> {
    id.map(|Path(id)| id).map_err(|e| {
        warn!(status = %e.status(), "Invalid id in path");
        AppError::BadRequest("Invalid id".to_string())
    })
}
