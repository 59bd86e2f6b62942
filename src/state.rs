use std::sync::Arc;

use axum::extract::FromRef;

use crate::repository::{Annotations, Images, Repository, Users};

/// Central application state shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Users, images and annotations repositories.
    pub repository: Repository,
}

impl AppState {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }
}

// Handlers extract only the capability they need, e.g. `State<Arc<dyn Users>>`.
impl FromRef<AppState> for Arc<dyn Users> {
    fn from_ref(state: &AppState) -> Self {
        state.repository.users.clone()
    }
}

impl FromRef<AppState> for Arc<dyn Images> {
    fn from_ref(state: &AppState) -> Self {
        state.repository.images.clone()
    }
}

impl FromRef<AppState> for Arc<dyn Annotations> {
    fn from_ref(state: &AppState) -> Self {
        state.repository.annotations.clone()
    }
}
