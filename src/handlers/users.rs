use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use tracing::{error, info};
use uuid::Uuid;

use super::{path_id, validated};
use crate::{
    error::AppError,
    models::{CreatedResponse, NewUser, Status, User, UserRequest, UserUpdate},
    repository::Users,
    utils::hash_password_blocking,
};

async fn hash(password: String) -> Result<String, AppError> {
    hash_password_blocking(password).await.map_err(|e| {
        error!("Failed to hash password: {}", e);
        AppError::InternalServerError("Failed to hash password".to_string())
    })
}

/// Register a user. The password is hashed before the store sees it and is
/// never echoed back.
pub async fn create_user(
    State(users): State<Arc<dyn Users>>,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let request = validated(payload)?;
    info!(username = %request.username, "Creating user");

    let password_hash = hash(request.password).await?;

    let user = users
        .create(NewUser {
            username: request.username,
            email: request.email,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, created_at = %user.created_at, "User created successfully");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            response: Status::ok(),
            id: user.id,
            created_at: user.created_at,
        }),
    ))
}

/// List every user.
pub async fn list_users(
    State(users): State<Arc<dyn Users>>,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(users.get_all().await?))
}

/// Fetch one user by id.
pub async fn get_user(
    State(users): State<Arc<dyn Users>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<User>, AppError> {
    let id = path_id(id)?;
    users
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Overwrite a user's username, email and password. Unknown ids are a no-op.
pub async fn update_user(
    State(users): State<Arc<dyn Users>>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let id = path_id(id)?;
    let request = validated(payload)?;
    let password_hash = hash(request.password).await?;

    users
        .update(UserUpdate {
            id,
            username: request.username,
            email: request.email,
            password_hash,
        })
        .await?;

    info!(user_id = %id, "User updated");
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a user. Deleting an absent user still succeeds.
pub async fn delete_user(
    State(users): State<Arc<dyn Users>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let id = path_id(id)?;
    users.delete(id).await?;

    info!(user_id = %id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
