use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    extractors::AppJson,
    middlewares::auth::JwtClaims,
    models::{NewExercise, SubmitAnswerRequest},
    services::{
        exercise_service::ExerciseService, submission_service::SubmissionService, AppState,
    },
};

/// GET /api/exercises
pub async fn list_exercises(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let exercises = ExerciseService::new(&state).list_recent().await?;
    Ok(Json(exercises))
}

/// GET /api/exercises/{id}
pub async fn get_exercise(
    State(state): State<Arc<AppState>>,
    Path(exercise_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let exercise = ExerciseService::new(&state).get_exercise(&exercise_id).await?;
    Ok(Json(exercise))
}

/// POST /api/exercises (teacher only)
pub async fn create_exercise(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<NewExercise>,
) -> AppResult<impl IntoResponse> {
    tracing::info!(teacher_id = %claims.sub, "Creating exercise");

    let exercise = ExerciseService::new(&state).create_exercise(req).await?;
    Ok((StatusCode::CREATED, Json(exercise)))
}

/// POST /api/exercises/{id}/submit
pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Path(exercise_id): Path<String>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<SubmitAnswerRequest>,
) -> AppResult<impl IntoResponse> {
    if !claims.is_user(&req.user_id) {
        tracing::warn!(
            token_user = %claims.sub,
            body_user = %req.user_id,
            "Submission for another user rejected"
        );
        return Err(AppError::forbidden("Cannot submit answers for another user"));
    }

    let response = SubmissionService::new(&state)
        .submit_answer(&exercise_id, &req)
        .await?;
    Ok(Json(response))
}
