use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{RepositoryError, RepositoryResult, Users};
use crate::models::{NewUser, User, UserUpdate};

/// `users` table access.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Users for PgUserRepository {
    async fn create(&self, user: NewUser) -> RepositoryResult<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from_sqlx)?;

        debug!(user_id = %created.id, "Inserted user");
        Ok(created)
    }

    async fn get_all(&self) -> RepositoryResult<Vec<User>> {
        sqlx::query_as::<_, User>("SELECT id, username, email, created_at FROM users")
            .fetch_all(&self.pool)
            .await
            .map_err(RepositoryError::from_sqlx)
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from_sqlx)
    }

    async fn update(&self, user: UserUpdate) -> RepositoryResult<()> {
        sqlx::query("UPDATE users SET username = $1, email = $2, password = $3 WHERE id = $4")
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.id)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from_sqlx)?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from_sqlx)?;
        Ok(())
    }
}
