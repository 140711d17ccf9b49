//! Remote collaborators of the editor session.
//!
//! The session talks to a workout backend (owned workout records) and to
//! object storage (the exported .zwo files) through the traits below. The
//! signed-in user, if any, decides whether saving goes remote at all.

pub mod file_storage;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::database::DatabaseError;
use crate::workouts::types::Workout;

pub use file_storage::HttpFileStorage;

/// Remote storage and identity errors.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("Workout not found: {0}")]
    NotFound(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Backend error: {0}")]
    BackendError(String),
}

impl From<DatabaseError> for SyncError {
    fn from(e: DatabaseError) -> Self {
        SyncError::BackendError(e.to_string())
    }
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Stable user id from the identity provider
    pub uid: String,
    pub display_name: Option<String>,
}

impl CurrentUser {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
        }
    }
}

/// Store of workout records owned by users.
pub trait WorkoutBackend: Send + Sync {
    /// Create or replace the record and link it to `user`.
    fn persist_workout(
        &self,
        user: &CurrentUser,
        workout: &Workout,
    ) -> impl std::future::Future<Output = Result<(), SyncError>> + Send;

    /// Remove the record and the user's link to it.
    fn delete_workout(
        &self,
        user: &CurrentUser,
        id: &str,
    ) -> impl std::future::Future<Output = Result<(), SyncError>> + Send;

    fn load_workout(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Workout>, SyncError>> + Send;
}

/// Object storage holding exported workout files as `{id}.zwo`.
pub trait FileStorage: Send + Sync {
    fn fetch_workout_file(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<String, SyncError>> + Send;

    fn upload_workout_file(
        &self,
        id: &str,
        xml: &str,
    ) -> impl std::future::Future<Output = Result<(), SyncError>> + Send;
}
