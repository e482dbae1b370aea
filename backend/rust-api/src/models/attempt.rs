use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::badge::BadgeId;
use super::progress::Progress;

/// One user answering one exercise. Never updated after insert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub id: String,
    pub user_id: String,
    pub exercise_id: String,
    pub selected_index: usize,
    pub is_correct: bool,
    pub time_spent_seconds: u32,
    pub created_at: DateTime<Utc>,
}

impl Attempt {
    pub fn new(
        user_id: &str,
        exercise_id: &str,
        selected_index: usize,
        is_correct: bool,
        time_spent_seconds: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            exercise_id: exercise_id.to_string(),
            selected_index,
            is_correct,
            time_spent_seconds,
            created_at,
        }
    }
}

/// Body of `POST /api/exercises/{id}/submit`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    pub user_id: String,
    pub selected_answer: usize,
    #[serde(default)]
    pub time_spent: u32,
    /// Replays with the same key return the first response.
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerResponse {
    pub is_correct: bool,
    pub points_earned: u64,
    pub new_badges: Vec<BadgeId>,
    pub progress: Progress,
}
