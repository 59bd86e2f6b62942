use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Annotations, Images, RepositoryError, RepositoryResult, Users};
use crate::models::{
    Annotation, AnnotationUpdate, Image, ImageUpdate, NewAnnotation, NewImage, NewUser, User,
    UserUpdate,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, StoredUser>,
    images: HashMap<Uuid, Image>,
    annotations: HashMap<Uuid, Annotation>,
    last_created_at: Option<DateTime<Utc>>,
}

struct StoredUser {
    user: User,
    password_hash: String,
}

impl Tables {
    /// Creation time for a new row, strictly after every earlier one.
    fn stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_created_at {
            Some(last) if now <= last => last + TimeDelta::microseconds(1),
            _ => now,
        };
        self.last_created_at = Some(stamp);
        stamp
    }

    fn username_taken(&self, username: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.user.username == username && Some(u.user.id) != except)
    }
}

/// In-memory stand-in for the PostgreSQL store.
///
/// Mirrors the schema's constraints: unique usernames, foreign keys on
/// `user_id`/`image_id`, and cascading deletes from users to images to
/// annotations. Rows come back in insertion-independent order, like a table
/// scan without `ORDER BY`.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored password hash for a user, if the user exists.
    pub async fn password_hash(&self, user_id: Uuid) -> Option<String> {
        let tables = self.tables.read().await;
        tables.users.get(&user_id).map(|u| u.password_hash.clone())
    }
}

#[async_trait]
impl Users for MemoryStore {
    async fn create(&self, user: NewUser) -> RepositoryResult<User> {
        let mut tables = self.tables.write().await;
        if tables.username_taken(&user.username, None) {
            return Err(RepositoryError::Conflict("users_username_key".to_string()));
        }

        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            created_at: tables.stamp(),
        };
        tables.users.insert(
            created.id,
            StoredUser {
                user: created.clone(),
                password_hash: user.password_hash,
            },
        );
        Ok(created)
    }

    async fn get_all(&self) -> RepositoryResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().map(|u| u.user.clone()).collect())
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).map(|u| u.user.clone()))
    }

    async fn update(&self, user: UserUpdate) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user.id) {
            return Ok(());
        }
        if tables.username_taken(&user.username, Some(user.id)) {
            return Err(RepositoryError::Conflict("users_username_key".to_string()));
        }
        if let Some(stored) = tables.users.get_mut(&user.id) {
            stored.user.username = user.username;
            stored.user.email = user.email;
            stored.password_hash = user.password_hash;
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Ok(());
        }

        let orphaned: Vec<Uuid> = tables
            .images
            .values()
            .filter(|image| image.user_id == id)
            .map(|image| image.id)
            .collect();
        for image_id in &orphaned {
            tables.images.remove(image_id);
        }
        tables
            .annotations
            .retain(|_, a| a.user_id != id && !orphaned.contains(&a.image_id));
        Ok(())
    }
}

#[async_trait]
impl Images for MemoryStore {
    async fn create(&self, image: NewImage) -> RepositoryResult<Image> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&image.user_id) {
            return Err(RepositoryError::MissingReference("images_user_id_fkey".to_string()));
        }

        let created = Image {
            id: Uuid::new_v4(),
            user_id: image.user_id,
            url: image.url,
            title: image.title,
            description: image.description,
            visibility: image.visibility,
            created_at: tables.stamp(),
        };
        tables.images.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_all(&self) -> RepositoryResult<Vec<Image>> {
        let tables = self.tables.read().await;
        Ok(tables.images.values().cloned().collect())
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Image>> {
        let tables = self.tables.read().await;
        Ok(tables.images.get(&id).cloned())
    }

    async fn update(&self, image: ImageUpdate) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(stored) = tables.images.get_mut(&image.id) {
            stored.url = image.url;
            stored.title = image.title;
            stored.description = image.description;
            stored.visibility = image.visibility;
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        if tables.images.remove(&id).is_some() {
            tables.annotations.retain(|_, a| a.image_id != id);
        }
        Ok(())
    }
}

#[async_trait]
impl Annotations for MemoryStore {
    async fn create(&self, annotation: NewAnnotation) -> RepositoryResult<Annotation> {
        let mut tables = self.tables.write().await;
        if !tables.images.contains_key(&annotation.image_id) {
            return Err(RepositoryError::MissingReference(
                "annotations_image_id_fkey".to_string(),
            ));
        }
        if !tables.users.contains_key(&annotation.user_id) {
            return Err(RepositoryError::MissingReference(
                "annotations_user_id_fkey".to_string(),
            ));
        }

        let created = Annotation {
            id: Uuid::new_v4(),
            image_id: annotation.image_id,
            user_id: annotation.user_id,
            x: annotation.x,
            y: annotation.y,
            width: annotation.width,
            height: annotation.height,
            comment: annotation.comment,
            created_at: tables.stamp(),
        };
        tables.annotations.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_all(&self) -> RepositoryResult<Vec<Annotation>> {
        let tables = self.tables.read().await;
        Ok(tables.annotations.values().cloned().collect())
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Annotation>> {
        let tables = self.tables.read().await;
        Ok(tables.annotations.get(&id).cloned())
    }

    async fn update(&self, annotation: AnnotationUpdate) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(stored) = tables.annotations.get_mut(&annotation.id) {
            stored.x = annotation.x;
            stored.y = annotation.y;
            stored.width = annotation.width;
            stored.height = annotation.height;
            stored.comment = annotation.comment;
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        self.tables.write().await.annotations.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "$argon2id$stub".to_string(),
        }
    }

    fn new_image(user_id: Uuid) -> NewImage {
        NewImage {
            user_id,
            url: "https://example.com/cat.png".to_string(),
            title: "cat".to_string(),
            description: String::new(),
            visibility: true,
        }
    }

    fn new_annotation(image_id: Uuid, user_id: Uuid) -> NewAnnotation {
        NewAnnotation {
            image_id,
            user_id,
            x: 1,
            y: 2,
            width: 30,
            height: 40,
            comment: "ear".to_string(),
        }
    }

    #[tokio::test]
    async fn test_user_crud_scenario() {
        let store = MemoryStore::new();

        let user = Users::create(&store, new_user("testuser")).await.unwrap();
        let fetched = Users::get_by_id(&store, user.id).await.unwrap().unwrap();
        assert_eq!(fetched.username, "testuser");
        assert_eq!(fetched.email, "testuser@example.com");

        let other = Users::create(&store, new_user("otheruser")).await.unwrap();
        assert_ne!(other.id, user.id);
        assert_ne!(other.created_at, user.created_at);
        assert_eq!(Users::get_all(&store).await.unwrap().len(), 2);

        Users::update(
            &store,
            UserUpdate {
                id: user.id,
                username: "updatedname".to_string(),
                email: "updateduser@example.com".to_string(),
                password_hash: "$argon2id$other".to_string(),
            },
        )
        .await
        .unwrap();
        let updated = Users::get_by_id(&store, user.id).await.unwrap().unwrap();
        assert_eq!(updated.username, "updatedname");
        assert_eq!(updated.created_at, user.created_at);
        assert_eq!(store.password_hash(user.id).await.unwrap(), "$argon2id$other");

        Users::delete(&store, user.id).await.unwrap();
        assert!(Users::get_by_id(&store, user.id).await.unwrap().is_none());
        Users::delete(&store, user.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_each_user_gets_a_fresh_id_and_timestamp() {
        let store = MemoryStore::new();

        let mut seen: Vec<User> = Vec::new();
        for name in ["firstuser", "seconduser", "thirduser"] {
            let user = Users::create(&store, new_user(name)).await.unwrap();
            assert!(!user.id.is_nil());
            for earlier in &seen {
                assert_ne!(user.id, earlier.id);
                assert_ne!(user.created_at, earlier.created_at);
                assert!(user.created_at > earlier.created_at);
            }
            seen.push(user);
        }
    }

    #[tokio::test]
    async fn test_get_all_on_empty_store_is_empty() {
        let store = MemoryStore::new();
        assert!(Users::get_all(&store).await.unwrap().is_empty());
        assert!(Images::get_all(&store).await.unwrap().is_empty());
        assert!(Annotations::get_all(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = MemoryStore::new();
        Users::create(&store, new_user("testuser")).await.unwrap();

        let err = Users::create(&store, new_user("testuser")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(Users::get_all(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_of_unknown_id_changes_nothing() {
        let store = MemoryStore::new();
        let user = Users::create(&store, new_user("testuser")).await.unwrap();

        Users::update(
            &store,
            UserUpdate {
                id: Uuid::new_v4(),
                username: "ghostuser".to_string(),
                email: "ghost@example.com".to_string(),
                password_hash: "x".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(Users::get_all(&store).await.unwrap(), vec![user]);
    }

    #[tokio::test]
    async fn test_image_requires_existing_user() {
        let store = MemoryStore::new();
        let err = Images::create(&store, new_image(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, RepositoryError::MissingReference(_)));
    }

    #[tokio::test]
    async fn test_annotation_requires_existing_image() {
        let store = MemoryStore::new();
        let user = Users::create(&store, new_user("testuser")).await.unwrap();

        let err = Annotations::create(&store, new_annotation(Uuid::new_v4(), user.id))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::MissingReference(_)));
    }

    #[tokio::test]
    async fn test_deleting_user_cascades() {
        let store = MemoryStore::new();
        let user = Users::create(&store, new_user("testuser")).await.unwrap();
        let image = Images::create(&store, new_image(user.id)).await.unwrap();
        let annotation = Annotations::create(&store, new_annotation(image.id, user.id))
            .await
            .unwrap();

        Users::delete(&store, user.id).await.unwrap();

        assert!(Images::get_by_id(&store, image.id).await.unwrap().is_none());
        assert!(Annotations::get_by_id(&store, annotation.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_annotation_update_keeps_references() {
        let store = MemoryStore::new();
        let user = Users::create(&store, new_user("testuser")).await.unwrap();
        let image = Images::create(&store, new_image(user.id)).await.unwrap();
        let annotation = Annotations::create(&store, new_annotation(image.id, user.id))
            .await
            .unwrap();

        Annotations::update(
            &store,
            AnnotationUpdate {
                id: annotation.id,
                x: 5,
                y: 6,
                width: 7,
                height: 8,
                comment: "nose".to_string(),
            },
        )
        .await
        .unwrap();

        let updated = Annotations::get_by_id(&store, annotation.id).await.unwrap().unwrap();
        assert_eq!((updated.x, updated.y, updated.width, updated.height), (5, 6, 7, 8));
        assert_eq!(updated.comment, "nose");
        assert_eq!(updated.image_id, image.id);
        assert_eq!(updated.user_id, user.id);
    }
}
