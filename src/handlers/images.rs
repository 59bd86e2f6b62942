use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use tracing::info;
use uuid::Uuid;

use super::{path_id, validated};
use crate::{
    error::AppError,
    models::{CreateImageRequest, CreatedResponse, Image, ImageUpdate, NewImage, Status, UpdateImageRequest},
    repository::Images,
};

pub async fn create_image(
    State(images): State<Arc<dyn Images>>,
    payload: Result<Json<CreateImageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let request = validated(payload)?;

    let image = images
        .create(NewImage {
            user_id: request.user_id,
            url: request.url,
            title: request.title,
            description: request.description,
            visibility: request.visibility,
        })
        .await?;

    info!(image_id = %image.id, user_id = %image.user_id, "Image created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            response: Status::ok(),
            id: image.id,
            created_at: image.created_at,
        }),
    ))
}

pub async fn list_images(
    State(images): State<Arc<dyn Images>>,
) -> Result<Json<Vec<Image>>, AppError> {
    Ok(Json(images.get_all().await?))
}

pub async fn get_image(
    State(images): State<Arc<dyn Images>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Image>, AppError> {
    let id = path_id(id)?;
    images
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))
}

/// The owner of an image cannot be changed.
pub async fn update_image(
    State(images): State<Arc<dyn Images>>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateImageRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let id = path_id(id)?;
    let request = validated(payload)?;

    images
        .update(ImageUpdate {
            id,
            url: request.url,
            title: request.title,
            description: request.description,
            visibility: request.visibility,
        })
        .await?;

    info!(image_id = %id, "Image updated");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_image(
    State(images): State<Arc<dyn Images>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let id = path_id(id)?;
    images.delete(id).await?;

    info!(image_id = %id, "Image deleted");
    Ok(StatusCode::NO_CONTENT)
}
