use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    extractors::AppJson,
    middlewares::auth::JwtClaims,
    models::user::UpdateUserRequest,
    services::{user_service::UserService, AppState},
};

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Extension(claims): Extension<JwtClaims>,
) -> AppResult<impl IntoResponse> {
    if !claims.can_view(&user_id) {
        return Err(AppError::forbidden("Not allowed to view this user"));
    }

    tracing::debug!(user_id = %user_id, viewer = %claims.sub, "Getting user profile");

    let details = UserService::new(&state).get_user(&user_id).await?;
    Ok(Json(details))
}

/// PUT /api/users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<UpdateUserRequest>,
) -> AppResult<impl IntoResponse> {
    if !claims.is_user(&user_id) {
        return Err(AppError::forbidden("Cannot modify another user"));
    }
    req.validate()?;

    let profile = UserService::new(&state).update_user(&user_id, req).await?;
    Ok(Json(profile))
}

/// DELETE /api/users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Extension(claims): Extension<JwtClaims>,
) -> AppResult<impl IntoResponse> {
    if !claims.is_user(&user_id) {
        return Err(AppError::forbidden("Cannot delete another user"));
    }

    UserService::new(&state).delete_user(&user_id).await?;
    Ok(Json(json!({ "message": "User deleted successfully" })))
}
