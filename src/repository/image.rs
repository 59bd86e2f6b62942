use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{Images, RepositoryError, RepositoryResult};
use crate::models::{Image, ImageUpdate, NewImage};

#[derive(Clone)]
pub struct PgImageRepository {
    pool: PgPool,
}

impl PgImageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Images for PgImageRepository {
    async fn create(&self, image: NewImage) -> RepositoryResult<Image> {
        let created = sqlx::query_as::<_, Image>(
            r#"
            INSERT INTO images (user_id, url, title, description, visibility)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, url, title, description, visibility, created_at
            "#,
        )
        .bind(image.user_id)
        .bind(&image.url)
        .bind(&image.title)
        .bind(&image.description)
        .bind(image.visibility)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from_sqlx)?;

        debug!(image_id = %created.id, user_id = %created.user_id, "Inserted image");
        Ok(created)
    }

    async fn get_all(&self) -> RepositoryResult<Vec<Image>> {
        sqlx::query_as::<_, Image>(
            "SELECT id, user_id, url, title, description, visibility, created_at FROM images",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from_sqlx)
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Image>> {
        sqlx::query_as::<_, Image>(
            r#"
            SELECT id, user_id, url, title, description, visibility, created_at
            FROM images WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from_sqlx)
    }

    async fn update(&self, image: ImageUpdate) -> RepositoryResult<()> {
        sqlx::query(
            "UPDATE images SET url = $1, title = $2, description = $3, visibility = $4 WHERE id = $5",
        )
        .bind(&image.url)
        .bind(&image.title)
        .bind(&image.description)
        .bind(image.visibility)
        .bind(image.id)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from_sqlx)?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from_sqlx)?;
        Ok(())
    }
}
