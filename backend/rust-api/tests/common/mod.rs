#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use phonics_api::{
    cache::MemoryCache,
    config::Config,
    create_router,
    models::{Exercise, ExerciseCategory},
    services::AppState,
    storage::{MemoryStore, Store},
};

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
}

pub fn test_config() -> Config {
    Config {
        bcrypt_cost: 4,
        jwt_secret: "test-secret".to_string(),
        metrics_auth: "metrics:secret".to_string(),
        ..Config::default()
    }
}

pub fn create_test_app() -> TestApp {
    create_test_app_with_store(Arc::new(MemoryStore::new()))
}

/// Same router over a caller-supplied store, e.g. a live `MongoStore`.
pub fn create_test_app_with_store(store: Arc<dyn Store>) -> TestApp {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let state = Arc::new(AppState::with_backends(
        test_config(),
        store,
        Arc::new(MemoryCache::new()),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
    }
}

impl TestApp {
    pub fn store(&self) -> &dyn Store {
        self.state.store.as_ref()
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let body = match body {
            Some(body) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_string(&body).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// Registers a fresh account and returns `(user_id, token)`.
    pub async fn register(&self, role: &str) -> (String, String) {
        let email = format!("{}-{}@school.com", role, Uuid::new_v4());
        let (status, json) = self
            .request(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({
                    "email": email,
                    "password": "password123",
                    "name": "Test User",
                    "role": role,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", json);

        (
            json["user"]["id"].as_str().unwrap().to_string(),
            json["token"].as_str().unwrap().to_string(),
        )
    }

    /// Inserts an exercise with four options directly into the store.
    pub async fn add_exercise(
        &self,
        category: ExerciseCategory,
        correct_index: usize,
        difficulty: u32,
    ) -> Exercise {
        self.add_exercise_at(category, correct_index, difficulty, Utc::now())
            .await
    }

    pub async fn add_exercise_at(
        &self,
        category: ExerciseCategory,
        correct_index: usize,
        difficulty: u32,
        created_at: chrono::DateTime<Utc>,
    ) -> Exercise {
        let exercise = Exercise {
            id: Uuid::new_v4().to_string(),
            category,
            prompt: format!("{} question", category),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_index,
            difficulty,
            explanation: None,
            tags: vec![],
            created_at,
        };
        self.store().insert_exercise(&exercise).await.unwrap();
        exercise
    }

    pub async fn submit(
        &self,
        token: &str,
        user_id: &str,
        exercise_id: &str,
        selected_answer: usize,
        idempotency_key: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut body = json!({
            "userId": user_id,
            "selectedAnswer": selected_answer,
            "timeSpent": 12,
        });
        if let Some(key) = idempotency_key {
            body["idempotencyKey"] = json!(key);
        }
        self.request(
            "POST",
            &format!("/api/exercises/{}/submit", exercise_id),
            Some(token),
            Some(body),
        )
        .await
    }
}

pub fn minutes_ago(minutes: i64) -> chrono::DateTime<Utc> {
    Utc::now() - Duration::minutes(minutes)
}
