use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A user as read back from the store. The password hash is never selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Image {
    pub id: Uuid,
    pub user_id: Uuid,
    pub url: String,
    pub title: String,
    pub description: String,
    pub visibility: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewImage {
    pub user_id: Uuid,
    pub url: String,
    pub title: String,
    pub description: String,
    pub visibility: bool,
}

#[derive(Debug, Clone)]
pub struct ImageUpdate {
    pub id: Uuid,
    pub url: String,
    pub title: String,
    pub description: String,
    pub visibility: bool,
}

/// A rectangular region on an image with a free-text comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Annotation {
    pub id: Uuid,
    pub image_id: Uuid,
    pub user_id: Uuid,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAnnotation {
    pub image_id: Uuid,
    pub user_id: Uuid,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub comment: String,
}

#[derive(Debug, Clone)]
pub struct AnnotationUpdate {
    pub id: Uuid,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub comment: String,
}

/// Outcome marker shared by every response body.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Status {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Status {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub response: Status,
    pub version: String,
}

/// Returned by every create endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub response: Status,
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /v1/users` and `PUT /v1/users/{id}`.
#[derive(Clone, Deserialize, Validate)]
pub struct UserRequest {
    #[validate(length(min = 6, max = 18))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 20))]
    pub password: String,
}

// Plaintext passwords must never reach the logs.
impl fmt::Debug for UserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateImageRequest {
    pub user_id: Uuid,
    #[validate(url)]
    pub url: String,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
    #[serde(default)]
    pub visibility: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateImageRequest {
    #[validate(url)]
    pub url: String,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
    #[serde(default)]
    pub visibility: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAnnotationRequest {
    pub image_id: Uuid,
    pub user_id: Uuid,
    #[validate(range(min = 0))]
    pub x: i32,
    #[validate(range(min = 0))]
    pub y: i32,
    #[validate(range(min = 1))]
    pub width: i32,
    #[validate(range(min = 1))]
    pub height: i32,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub comment: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateAnnotationRequest {
    #[validate(range(min = 0))]
    pub x: i32,
    #[validate(range(min = 0))]
    pub y: i32,
    #[validate(range(min = 1))]
    pub width: i32,
    #[validate(range(min = 1))]
    pub height: i32,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub comment: String,
}
