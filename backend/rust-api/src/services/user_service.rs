use std::sync::Arc;

use chrono::Utc;

use super::auth_service::normalize_email;
use super::AppState;
use crate::error::{AppError, AppResult};
use crate::models::user::{UpdateUserRequest, UserDetails};
use crate::models::{EarnedBadge, UserProfile};
use crate::storage::{Store, StoreError};

/// Attempts shown on the profile view.
pub const RECENT_ATTEMPTS_LIMIT: usize = 10;

pub struct UserService {
    store: Arc<dyn Store>,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            bcrypt_cost: state.config.bcrypt_cost,
        }
    }

    pub async fn get_user(&self, user_id: &str) -> AppResult<UserDetails> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let progress = self
            .store
            .load_progress(user_id)
            .await?
            .map(|versioned| versioned.progress);
        let attempts = self
            .store
            .recent_attempts(user_id, RECENT_ATTEMPTS_LIMIT)
            .await?;
        let badges = self
            .store
            .badge_awards(user_id)
            .await?
            .iter()
            .map(EarnedBadge::from)
            .collect();

        Ok(UserDetails {
            profile: UserProfile::from(user),
            progress,
            attempts,
            badges,
        })
    }

    pub async fn update_user(
        &self,
        user_id: &str,
        req: UpdateUserRequest,
    ) -> AppResult<UserProfile> {
        let mut user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if let Some(email) = req.email.as_deref().map(normalize_email) {
            if email != user.email {
                if let Some(other) = self.store.find_user_by_email(&email).await? {
                    if other.id != user.id {
                        return Err(AppError::bad_request("User with this email already exists"));
                    }
                }
                user.email = email;
            }
        }
        if let Some(name) = req.name {
            user.name = name;
        }
        if let Some(grade) = req.grade {
            user.grade = Some(grade);
        }
        if let Some(password) = req.password {
            user.password_hash = bcrypt::hash(&password, self.bcrypt_cost)
                .map_err(|e| AppError::internal(format!("Failed to hash password: {}", e)))?;
        }
        user.updated_at = Utc::now();

        match self.store.update_user(&user).await {
            Ok(true) => {}
            Ok(false) => return Err(AppError::not_found("User not found")),
            Err(StoreError::Duplicate(_)) => {
                return Err(AppError::bad_request("User with this email already exists"))
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id, "User profile updated");
        Ok(UserProfile::from(user))
    }

    pub async fn delete_user(&self, user_id: &str) -> AppResult<()> {
        if !self.store.delete_user(user_id).await? {
            return Err(AppError::not_found("User not found"));
        }
        tracing::info!(user_id, "User deleted with progress, attempts and badges");
        Ok(())
    }
}
