use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use super::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{Exercise, NewExercise};
use crate::storage::Store;

pub struct ExerciseService {
    store: Arc<dyn Store>,
    recent_limit: usize,
}

impl ExerciseService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            recent_limit: state.config.recent_exercises_limit,
        }
    }

    pub async fn get_exercise(&self, exercise_id: &str) -> AppResult<Exercise> {
        self.store
            .find_exercise(exercise_id)
            .await?
            .ok_or_else(|| AppError::not_found("Exercise not found"))
    }

    /// Newest exercises first, capped at the configured page size.
    pub async fn list_recent(&self) -> AppResult<Vec<Exercise>> {
        Ok(self.store.list_recent_exercises(self.recent_limit).await?)
    }

    pub async fn create_exercise(&self, new_exercise: NewExercise) -> AppResult<Exercise> {
        new_exercise.validate()?;

        let exercise = new_exercise.into_exercise(Utc::now());
        self.store.insert_exercise(&exercise).await?;

        tracing::info!(
            exercise_id = %exercise.id,
            category = exercise.category.as_str(),
            difficulty = exercise.difficulty,
            "Exercise created"
        );
        Ok(exercise)
    }
}
