use axum::{response::IntoResponse, Json};

use crate::models::BADGES;

/// GET /api/badges
pub async fn list_badges() -> impl IntoResponse {
    Json(&BADGES[..])
}
