//! Persistence behind a trait so the HTTP layer runs against MongoDB in
//! production and an in-memory store in tests.

use async_trait::async_trait;

use crate::models::{Attempt, BadgeAward, Exercise, Progress, User, VersionedProgress};

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another writer changed the record since it was read.
    #[error("concurrent update on {0}")]
    Conflict(String),

    /// The commit was sent but the server never confirmed it. The write may
    /// or may not have landed, so it must not be replayed from a fresh read.
    #[error("commit outcome unknown for {0}")]
    CommitUnknown(String),

    #[error("duplicate value for {0}")]
    Duplicate(String),

    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("corrupt record in {collection}: {message}")]
    Corrupt {
        collection: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

/// Everything written by one answer submission. Committed all-or-nothing.
#[derive(Debug, Clone)]
pub struct SubmissionCommit {
    pub attempt: Attempt,
    pub progress: Progress,
    pub awards: Vec<BadgeAward>,
    /// Version read before the update; `None` when no progress existed yet.
    pub expected_version: Option<u64>,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    async fn find_exercise(&self, id: &str) -> Result<Option<Exercise>, StoreError>;

    /// Newest first.
    async fn list_recent_exercises(&self, limit: usize) -> Result<Vec<Exercise>, StoreError>;

    async fn insert_exercise(&self, exercise: &Exercise) -> Result<(), StoreError>;

    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] when the email is taken.
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    /// Returns `false` when the user does not exist.
    async fn update_user(&self, user: &User) -> Result<bool, StoreError>;

    /// Removes the user with their progress, attempts and badge awards.
    /// Returns `false` when the user does not exist.
    async fn delete_user(&self, id: &str) -> Result<bool, StoreError>;

    async fn load_progress(&self, user_id: &str) -> Result<Option<VersionedProgress>, StoreError>;

    /// Atomically records the attempt, replaces the progress record when its
    /// version still equals `expected_version`, and inserts the awards.
    /// Returns the new version, or [`StoreError::Conflict`] if the record moved.
    async fn commit_submission(&self, commit: &SubmissionCommit) -> Result<u64, StoreError>;

    /// Newest first.
    async fn recent_attempts(&self, user_id: &str, limit: usize)
        -> Result<Vec<Attempt>, StoreError>;

    async fn badge_awards(&self, user_id: &str) -> Result<Vec<BadgeAward>, StoreError>;
}
