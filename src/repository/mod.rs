// Postgres-backed repositories and the in-memory store used as a test fake
mod annotation;
mod image;
pub mod memory;
mod user;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Annotation, AnnotationUpdate, Image, ImageUpdate, NewAnnotation, NewImage, NewUser, User,
    UserUpdate,
};

pub use annotation::PgAnnotationRepository;
pub use image::PgImageRepository;
pub use memory::MemoryStore;
pub use user::PgUserRepository;

// Repository error types
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Conflict: {0}")]
    Conflict(String), // A unique constraint rejected the row

    #[error("Missing reference: {0}")]
    MissingReference(String), // A foreign key points at nothing

    // No `From<sqlx::Error>`: every sqlx error goes through `from_sqlx`
    #[error(transparent)]
    Database(sqlx::Error),
}

impl RepositoryError {
    /// Classify a sqlx error by its SQLSTATE code.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        let code = err
            .as_database_error()
            .and_then(|db| db.code().map(|c| c.into_owned()));
        let constraint = err
            .as_database_error()
            .and_then(|db| db.constraint().map(str::to_string))
            .unwrap_or_default();

        match code.as_deref() {
            Some("23505") => RepositoryError::Conflict(constraint),
            Some("23503") => RepositoryError::MissingReference(constraint),
            _ => RepositoryError::Database(err),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Data access for users.
///
/// `get_by_id` yields `None` for an unknown id; `update` and `delete` succeed
/// even when no row matches.
#[async_trait]
pub trait Users: Send + Sync {
    async fn create(&self, user: NewUser) -> RepositoryResult<User>;
    async fn get_all(&self) -> RepositoryResult<Vec<User>>;
    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>>;
    async fn update(&self, user: UserUpdate) -> RepositoryResult<()>;
    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;
}

/// Data access for images. Same absence semantics as [`Users`].
#[async_trait]
pub trait Images: Send + Sync {
    async fn create(&self, image: NewImage) -> RepositoryResult<Image>;
    async fn get_all(&self) -> RepositoryResult<Vec<Image>>;
    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Image>>;
    async fn update(&self, image: ImageUpdate) -> RepositoryResult<()>;
    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;
}

/// Data access for annotations. Same absence semantics as [`Users`].
#[async_trait]
pub trait Annotations: Send + Sync {
    async fn create(&self, annotation: NewAnnotation) -> RepositoryResult<Annotation>;
    async fn get_all(&self) -> RepositoryResult<Vec<Annotation>>;
    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Annotation>>;
    async fn update(&self, annotation: AnnotationUpdate) -> RepositoryResult<()>;
    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;
}

/// The three repositories bundled together. Handlers pull out only the
/// capability they use.
#[derive(Clone)]
pub struct Repository {
    pub users: Arc<dyn Users>,
    pub images: Arc<dyn Images>,
    pub annotations: Arc<dyn Annotations>,
}

impl Repository {
    /// Repositories sharing one PostgreSQL pool.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            images: Arc::new(PgImageRepository::new(pool.clone())),
            annotations: Arc::new(PgAnnotationRepository::new(pool)),
        }
    }

    /// Repositories backed by a single in-memory store.
    pub fn in_memory(store: MemoryStore) -> Self {
        Self {
            users: Arc::new(store.clone()),
            images: Arc::new(store.clone()),
            annotations: Arc::new(store),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{borrow::Cow, error::Error as StdError, fmt};

    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    #[derive(Debug)]
    struct PgFailure {
        code: &'static str,
        constraint: &'static str,
    }

    impl fmt::Display for PgFailure {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "violates constraint {}", self.constraint)
        }
    }

    impl StdError for PgFailure {}

    impl DatabaseError for PgFailure {
        fn message(&self) -> &str {
            "constraint violation"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn constraint(&self) -> Option<&str> {
            Some(self.constraint)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    fn pg_error(code: &'static str, constraint: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(PgFailure { code, constraint }))
    }

    #[test]
    fn test_unique_violation_is_conflict() {
        let err = RepositoryError::from_sqlx(pg_error("23505", "users_username_key"));
        assert!(matches!(err, RepositoryError::Conflict(ref c) if c == "users_username_key"));
    }

    #[test]
    fn test_foreign_key_violation_is_missing_reference() {
        let err = RepositoryError::from_sqlx(pg_error("23503", "images_user_id_fkey"));
        assert!(matches!(err, RepositoryError::MissingReference(ref c) if c == "images_user_id_fkey"));
    }

    #[test]
    fn test_other_failures_stay_database_errors() {
        let err = RepositoryError::from_sqlx(pg_error("23502", "users_email_not_null"));
        assert!(matches!(err, RepositoryError::Database(_)));

        let err = RepositoryError::from_sqlx(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, RepositoryError::Database(sqlx::Error::PoolTimedOut)));
    }
}
