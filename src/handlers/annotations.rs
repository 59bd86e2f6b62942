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
    models::{
        Annotation, AnnotationUpdate, CreateAnnotationRequest, CreatedResponse, NewAnnotation,
        Status, UpdateAnnotationRequest,
    },
    repository::Annotations,
};

pub async fn create_annotation(
    State(annotations): State<Arc<dyn Annotations>>,
    payload: Result<Json<CreateAnnotationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let request = validated(payload)?;

    let annotation = annotations
        .create(NewAnnotation {
            image_id: request.image_id,
            user_id: request.user_id,
            x: request.x,
            y: request.y,
            width: request.width,
            height: request.height,
            comment: request.comment,
        })
        .await?;

    info!(
        annotation_id = %annotation.id,
        image_id = %annotation.image_id,
        "Annotation created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            response: Status::ok(),
            id: annotation.id,
            created_at: annotation.created_at,
        }),
    ))
}

pub async fn list_annotations(
    State(annotations): State<Arc<dyn Annotations>>,
) -> Result<Json<Vec<Annotation>>, AppError> {
    Ok(Json(annotations.get_all().await?))
}

pub async fn get_annotation(
    State(annotations): State<Arc<dyn Annotations>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Annotation>, AppError> {
    let id = path_id(id)?;
    annotations
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Annotation not found".to_string()))
}

/// Moves or resizes the box and rewrites the comment. Image and author stay fixed.
pub async fn update_annotation(
    State(annotations): State<Arc<dyn Annotations>>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateAnnotationRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let id = path_id(id)?;
    let request = validated(payload)?;

    annotations
        .update(AnnotationUpdate {
            id,
            x: request.x,
            y: request.y,
            width: request.width,
            height: request.height,
            comment: request.comment,
        })
        .await?;

    info!(annotation_id = %id, "Annotation updated");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_annotation(
    State(annotations): State<Arc<dyn Annotations>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let id = path_id(id)?;
    annotations.delete(id).await?;

    info!(annotation_id = %id, "Annotation deleted");
    Ok(StatusCode::NO_CONTENT)
}
