use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{Annotations, RepositoryError, RepositoryResult};
use crate::models::{Annotation, AnnotationUpdate, NewAnnotation};

const COLUMNS: &str = "id, image_id, user_id, x, y, width, height, comment, created_at";

#[derive(Clone)]
pub struct PgAnnotationRepository {
    pool: PgPool,
}

impl PgAnnotationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Annotations for PgAnnotationRepository {
    async fn create(&self, annotation: NewAnnotation) -> RepositoryResult<Annotation> {
        let query = format!(
            "INSERT INTO annotations (image_id, user_id, x, y, width, height, comment) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {COLUMNS}"
        );
        let created = sqlx::query_as::<_, Annotation>(&query)
            .bind(annotation.image_id)
            .bind(annotation.user_id)
            .bind(annotation.x)
            .bind(annotation.y)
            .bind(annotation.width)
            .bind(annotation.height)
            .bind(&annotation.comment)
            .fetch_one(&self.pool)
            .await
            .map_err(RepositoryError::from_sqlx)?;

        debug!(annotation_id = %created.id, image_id = %created.image_id, "Inserted annotation");
        Ok(created)
    }

    async fn get_all(&self) -> RepositoryResult<Vec<Annotation>> {
        let query = format!("SELECT {COLUMNS} FROM annotations");
        sqlx::query_as::<_, Annotation>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(RepositoryError::from_sqlx)
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Annotation>> {
        let query = format!("SELECT {COLUMNS} FROM annotations WHERE id = $1");
        sqlx::query_as::<_, Annotation>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::from_sqlx)
    }

    async fn update(&self, annotation: AnnotationUpdate) -> RepositoryResult<()> {
        sqlx::query(
            "UPDATE annotations SET x = $1, y = $2, width = $3, height = $4, comment = $5 WHERE id = $6",
        )
        .bind(annotation.x)
        .bind(annotation.y)
        .bind(annotation.width)
        .bind(annotation.height)
        .bind(&annotation.comment)
        .bind(annotation.id)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from_sqlx)?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        sqlx::query("DELETE FROM annotations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from_sqlx)?;
        Ok(())
    }
}
