use std::sync::Arc;

use chrono::Utc;

use super::progress_aggregator::{record_outcome, Outcome};
use super::AppState;
use crate::cache::Cache;
use crate::error::{AppError, AppResult};
use crate::metrics::{
    ANSWERS_SUBMITTED_TOTAL, BADGES_AWARDED_TOTAL, IDEMPOTENT_REPLAYS_TOTAL, POINTS_AWARDED_TOTAL,
    PROGRESS_CONFLICTS_TOTAL,
};
use crate::models::{
    Attempt, BadgeAward, Exercise, Progress, SubmitAnswerRequest, SubmitAnswerResponse,
};
use crate::storage::{Store, SubmissionCommit};
use crate::utils::retry::{retry_async_with_config, retry_when, RetryConfig};

pub struct SubmissionService {
    store: Arc<dyn Store>,
    cache: Arc<dyn Cache>,
    idempotency_ttl_seconds: u64,
}

impl SubmissionService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            cache: state.cache.clone(),
            idempotency_ttl_seconds: state.config.idempotency_ttl_seconds,
        }
    }

    pub async fn submit_answer(
        &self,
        exercise_id: &str,
        req: &SubmitAnswerRequest,
    ) -> AppResult<SubmitAnswerResponse> {
        tracing::info!(
            exercise_id,
            user_id = %req.user_id,
            selected = req.selected_answer,
            "Processing answer submission"
        );

        let idempotency_key = req
            .idempotency_key
            .as_deref()
            .map(|key| idempotency_cache_key(&req.user_id, key));

        if let Some(key) = &idempotency_key {
            if let Some(cached) = self.cached_response(key).await? {
                IDEMPOTENT_REPLAYS_TOTAL.inc();
                tracing::info!(idempotency_key = %key, "Returning cached submission response");
                return Ok(cached);
            }
        }

        let exercise = self
            .store
            .find_exercise(exercise_id)
            .await?
            .ok_or_else(|| AppError::not_found("Exercise not found"))?;

        if self.store.find_user(&req.user_id).await?.is_none() {
            return Err(AppError::not_found("User not found"));
        }

        if !exercise.is_valid_selection(req.selected_answer) {
            return Err(AppError::bad_request(format!(
                "Selected answer {} is out of range for {} options",
                req.selected_answer,
                exercise.options.len()
            )));
        }

        let outcome = retry_when(
            RetryConfig::default(),
            || self.apply_submission(&exercise, req),
            |err: &AppError| matches!(err, AppError::Conflict(_)),
        )
        .await
        .inspect_err(|err| {
            if matches!(err, AppError::Conflict(_)) {
                tracing::error!(user_id = %req.user_id, "Progress update kept conflicting");
            }
        })?;

        record_submission_metrics(&exercise, &outcome);

        tracing::info!(
            user_id = %req.user_id,
            exercise_id,
            is_correct = outcome.is_correct,
            points_earned = outcome.points_earned,
            new_badges = ?outcome.new_badges,
            "Submission recorded"
        );

        let response = SubmitAnswerResponse {
            is_correct: outcome.is_correct,
            points_earned: outcome.points_earned,
            new_badges: outcome.new_badges,
            progress: outcome.progress,
        };

        if let Some(key) = &idempotency_key {
            self.cache_response(key, &response).await;
        }

        Ok(response)
    }

    /// One read-aggregate-commit pass. A concurrent writer surfaces as
    /// [`AppError::Conflict`] so the caller can start over from the read.
    async fn apply_submission(
        &self,
        exercise: &Exercise,
        req: &SubmitAnswerRequest,
    ) -> AppResult<Outcome> {
        let now = Utc::now();

        let (current, expected_version) = match self.store.load_progress(&req.user_id).await? {
            Some(versioned) => (versioned.progress, Some(versioned.version)),
            None => (Progress::new(&req.user_id), None),
        };

        let outcome = record_outcome(current, exercise, req.selected_answer, now)?;

        let commit = SubmissionCommit {
            attempt: Attempt::new(
                &req.user_id,
                &exercise.id,
                req.selected_answer,
                outcome.is_correct,
                req.time_spent,
                now,
            ),
            progress: outcome.progress.clone(),
            awards: outcome
                .new_badges
                .iter()
                .map(|badge| BadgeAward {
                    user_id: req.user_id.clone(),
                    badge_id: *badge,
                    awarded_at: now,
                })
                .collect(),
            expected_version,
        };

        match self.store.commit_submission(&commit).await {
            Ok(version) => {
                tracing::debug!(user_id = %req.user_id, version, "Progress committed");
                Ok(outcome)
            }
            Err(err) if err.is_conflict() => {
                PROGRESS_CONFLICTS_TOTAL.inc();
                tracing::warn!(user_id = %req.user_id, "Progress conflict, retrying: {}", err);
                Err(AppError::Conflict(err.to_string()))
            }
            // any other failure, including an unconfirmed commit, ends the
            // request: the attempt may already be stored
            Err(err) => Err(err.into()),
        }
    }

    async fn cached_response(&self, key: &str) -> AppResult<Option<SubmitAnswerResponse>> {
        let raw = retry_async_with_config(RetryConfig::light(), || self.cache.get(key)).await?;

        match raw {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(response) => Ok(Some(response)),
                Err(e) => {
                    tracing::warn!(key, "Ignoring unreadable cached response: {}", e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Failures are logged, not returned: the submission is already committed.
    async fn cache_response(&self, key: &str, response: &SubmitAnswerResponse) {
        let payload = match serde_json::to_string(response) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(key, "Failed to serialize submission response: {}", e);
                return;
            }
        };

        let ttl = self.idempotency_ttl_seconds;
        if let Err(e) = retry_async_with_config(RetryConfig::light(), || {
            self.cache.set_ex(key, &payload, ttl)
        })
        .await
        {
            tracing::error!(key, "Failed to cache submission response: {:#}", e);
        }
    }
}

fn idempotency_cache_key(user_id: &str, key: &str) -> String {
    format!("idempotency:submit:{}:{}", user_id, key)
}

fn record_submission_metrics(exercise: &Exercise, outcome: &Outcome) {
    let correct_label = if outcome.is_correct { "true" } else { "false" };
    ANSWERS_SUBMITTED_TOTAL
        .with_label_values(&[correct_label, exercise.category.as_str()])
        .inc();
    POINTS_AWARDED_TOTAL.inc_by(outcome.points_earned);
    for badge in &outcome.new_badges {
        BADGES_AWARDED_TOTAL
            .with_label_values(&[badge.as_str()])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotency_keys_are_scoped_per_user() {
        assert_eq!(
            idempotency_cache_key("u1", "abc"),
            "idempotency:submit:u1:abc"
        );
        assert_ne!(
            idempotency_cache_key("u1", "abc"),
            idempotency_cache_key("u2", "abc")
        );
    }
}
