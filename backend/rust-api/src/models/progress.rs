use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::badge::BadgeId;
use super::exercise::ExerciseCategory;

/// Completion count and running accuracy (0..=100) for one category.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub completed: u32,
    pub accuracy: f64,
}

/// Per-user running aggregate of all submissions.
///
/// Invariants maintained by the progress aggregator:
/// `correct_answers <= total_answers == exercises_completed`, `points` never
/// decreases, and `badges` only grows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub user_id: String,
    pub exercises_completed: u32,
    pub total_answers: u32,
    pub correct_answers: u32,
    pub points: u64,
    pub streak: u32,
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(default)]
    pub badges: BTreeSet<BadgeId>,
    #[serde(default)]
    pub per_category_stats: BTreeMap<ExerciseCategory, CategoryStats>,
}

impl Progress {
    /// Zero-valued aggregate for a user with no submissions yet.
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            exercises_completed: 0,
            total_answers: 0,
            correct_answers: 0,
            points: 0,
            streak: 0,
            last_activity: None,
            badges: BTreeSet::new(),
            per_category_stats: BTreeMap::new(),
        }
    }

    pub fn category(&self, category: ExerciseCategory) -> CategoryStats {
        self.per_category_stats
            .get(&category)
            .copied()
            .unwrap_or_default()
    }
}

/// Progress as loaded from the store, with the version used for
/// compare-and-set on commit.
#[derive(Debug, Clone)]
pub struct VersionedProgress {
    pub progress: Progress,
    pub version: u64,
}
