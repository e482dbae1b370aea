use std::sync::Arc;

use anyhow::Context;
use bcrypt::{hash, verify};
use chrono::Utc;
use uuid::Uuid;

use super::AppState;
use crate::cache::Cache;
use crate::error::{AppError, AppResult};
use crate::metrics::LOGINS_TOTAL;
use crate::middlewares::auth::JwtService;
use crate::models::user::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use crate::models::{User, UserProfile};
use crate::storage::{Store, StoreError};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub struct AuthService {
    store: Arc<dyn Store>,
    cache: Arc<dyn Cache>,
    jwt_service: JwtService,
    bcrypt_cost: u32,
    login_max_failures: i64,
    login_lockout_seconds: u64,
}

impl AuthService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            cache: state.cache.clone(),
            jwt_service: state.jwt.clone(),
            bcrypt_cost: state.config.bcrypt_cost,
            login_max_failures: state.config.login_max_failures,
            login_lockout_seconds: state.config.login_lockout_seconds,
        }
    }

    pub fn hash_password(&self, password: &str) -> anyhow::Result<String> {
        hash(password, self.bcrypt_cost).context("Failed to hash password")
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> anyhow::Result<bool> {
        verify(password, hash).context("Failed to verify password")
    }

    pub async fn register(&self, req: RegisterRequest) -> AppResult<RegisterResponse> {
        let email = normalize_email(&req.email);

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::bad_request("User with this email already exists"));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash: self.hash_password(&req.password)?,
            name: req.name,
            role: req.role.unwrap_or_default(),
            grade: req.grade,
            created_at: now,
            updated_at: now,
        };

        // unique index catches a concurrent registration with the same email
        match self.store.insert_user(&user).await {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => {
                return Err(AppError::bad_request("User with this email already exists"))
            }
            Err(e) => return Err(e.into()),
        }

        let token = self.issue_token(&user)?;

        tracing::info!(user_id = %user.id, role = user.role.as_str(), "User registered");

        Ok(RegisterResponse {
            user: UserProfile::from(user),
            token,
        })
    }

    pub async fn login(&self, req: LoginRequest) -> AppResult<LoginResponse> {
        let email = normalize_email(&req.email);
        let failures_key = login_failures_key(&email);

        if self.failure_count(&failures_key).await? >= self.login_max_failures {
            LOGINS_TOTAL.with_label_values(&["locked"]).inc();
            tracing::warn!(email = %email, "Login rejected: too many failed attempts");
            return Err(AppError::too_many_requests(
                "Too many failed login attempts, please try again later",
            ));
        }

        let user = match self.store.find_user_by_email(&email).await? {
            Some(user) if self.verify_password(&req.password, &user.password_hash)? => user,
            _ => {
                let failures = self
                    .cache
                    .incr_window(&failures_key, self.login_lockout_seconds)
                    .await?;
                LOGINS_TOTAL.with_label_values(&["failure"]).inc();
                tracing::warn!(email = %email, failures, "Failed login attempt");
                return Err(AppError::unauthorized(INVALID_CREDENTIALS));
            }
        };

        self.cache.del(&failures_key).await?;

        let progress = self
            .store
            .load_progress(&user.id)
            .await?
            .map(|versioned| versioned.progress);
        let token = self.issue_token(&user)?;

        LOGINS_TOTAL.with_label_values(&["success"]).inc();
        tracing::info!(user_id = %user.id, "Successful login");

        Ok(LoginResponse {
            user: UserProfile::from(user),
            progress,
            token,
        })
    }

    fn issue_token(&self, user: &User) -> AppResult<String> {
        self.jwt_service
            .issue(&user.id, user.role)
            .map_err(|e| AppError::internal(e.to_string()))
    }

    async fn failure_count(&self, key: &str) -> AppResult<i64> {
        let raw = self.cache.get(key).await?;
        Ok(raw.and_then(|value| value.parse().ok()).unwrap_or(0))
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn login_failures_key(email: &str) -> String {
    format!("login:failures:{}", email)
}
