//! Progress and badge bookkeeping for a single submission.
//!
//! Pure: no I/O and no clock access. The submission service supplies the
//! current aggregate and `now`, and persists whatever comes back.

use chrono::{DateTime, Utc};

use crate::models::{BadgeId, CategoryStats, Exercise, Progress};

/// Base points for a correct answer, multiplied by exercise difficulty.
pub const POINTS_PER_DIFFICULTY: u64 = 10;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProgressError {
    #[error("Selected answer {selected} is out of range for {options} options")]
    InvalidSelection { selected: usize, options: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub progress: Progress,
    pub is_correct: bool,
    pub points_earned: u64,
    /// Badges added by this submission, in evaluation order.
    pub new_badges: Vec<BadgeId>,
}

pub fn record_outcome(
    mut progress: Progress,
    exercise: &Exercise,
    selected_index: usize,
    now: DateTime<Utc>,
) -> Result<Outcome, ProgressError> {
    if !exercise.is_valid_selection(selected_index) {
        return Err(ProgressError::InvalidSelection {
            selected: selected_index,
            options: exercise.options.len(),
        });
    }

    let is_correct = selected_index == exercise.correct_index;
    let points_earned = if is_correct {
        POINTS_PER_DIFFICULTY * u64::from(exercise.difficulty)
    } else {
        0
    };

    progress.exercises_completed += 1;
    progress.total_answers += 1;
    if is_correct {
        progress.correct_answers += 1;
    }
    progress.points += points_earned;
    progress.streak = if is_correct { progress.streak + 1 } else { 0 };
    progress.last_activity = Some(now);

    let previous = progress.category(exercise.category);
    progress
        .per_category_stats
        .insert(exercise.category, next_category_stats(previous, is_correct));

    let new_badges: Vec<BadgeId> = BadgeId::EVALUATION_ORDER
        .into_iter()
        .filter(|badge| !progress.badges.contains(badge) && badge.is_earned_by(&progress))
        .collect();
    progress.badges.extend(new_badges.iter().copied());

    Ok(Outcome {
        progress,
        is_correct,
        points_earned,
        new_badges,
    })
}

/// Folds one outcome into the running weighted average.
fn next_category_stats(previous: CategoryStats, is_correct: bool) -> CategoryStats {
    let completed = f64::from(previous.completed);
    let score = if is_correct { 100.0 } else { 0.0 };
    CategoryStats {
        completed: previous.completed + 1,
        accuracy: (previous.accuracy * completed + score) / (completed + 1.0),
    }
}
