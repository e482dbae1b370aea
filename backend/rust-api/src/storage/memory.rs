use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{Store, StoreError, SubmissionCommit};
use crate::models::{Attempt, BadgeAward, Exercise, User, VersionedProgress};

#[derive(Default)]
struct Tables {
    exercises: Vec<Exercise>,
    users: HashMap<String, User>,
    progress: HashMap<String, VersionedProgress>,
    attempts: Vec<Attempt>,
    awards: Vec<BadgeAward>,
}

/// Process-local store. One lock around all tables gives every operation
/// the same atomicity the Mongo transaction provides.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_exercise(&self, id: &str) -> Result<Option<Exercise>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.exercises.iter().find(|e| e.id == id).cloned())
    }

    async fn list_recent_exercises(&self, limit: usize) -> Result<Vec<Exercise>, StoreError> {
        let tables = self.tables.lock().await;
        let mut exercises = tables.exercises.clone();
        // stable sort keeps later inserts first among equal timestamps
        exercises.reverse();
        exercises.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        exercises.truncate(limit);
        Ok(exercises)
    }

    async fn insert_exercise(&self, exercise: &Exercise) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.exercises.iter().any(|e| e.id == exercise.id) {
            return Err(StoreError::Duplicate(format!("exercise {}", exercise.id)));
        }
        tables.exercises.push(exercise.clone());
        Ok(())
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email".to_string()));
        }
        tables.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables
            .users
            .values()
            .any(|u| u.email == user.email && u.id != user.id)
        {
            return Err(StoreError::Duplicate("email".to_string()));
        }
        match tables.users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, id: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.users.remove(id).is_none() {
            return Ok(false);
        }
        tables.progress.remove(id);
        tables.attempts.retain(|a| a.user_id != id);
        tables.awards.retain(|a| a.user_id != id);
        Ok(true)
    }

    async fn load_progress(&self, user_id: &str) -> Result<Option<VersionedProgress>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.progress.get(user_id).cloned())
    }

    async fn commit_submission(&self, commit: &SubmissionCommit) -> Result<u64, StoreError> {
        let mut tables = self.tables.lock().await;
        let user_id = commit.progress.user_id.clone();
        let current = tables.progress.get(&user_id).map(|p| p.version);

        if current != commit.expected_version {
            return Err(StoreError::Conflict(format!("progress {}", user_id)));
        }

        let version = current.map_or(1, |v| v + 1);
        tables.progress.insert(
            user_id,
            VersionedProgress {
                progress: commit.progress.clone(),
                version,
            },
        );
        tables.attempts.push(commit.attempt.clone());
        for award in &commit.awards {
            let held = tables
                .awards
                .iter()
                .any(|a| a.user_id == award.user_id && a.badge_id == award.badge_id);
            if !held {
                tables.awards.push(award.clone());
            }
        }
        Ok(version)
    }

    async fn recent_attempts(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Attempt>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .attempts
            .iter()
            .rev()
            .filter(|a| a.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn badge_awards(&self, user_id: &str) -> Result<Vec<BadgeAward>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .awards
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }
}
