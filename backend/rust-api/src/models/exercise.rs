use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Phonics skill an exercise trains. Also the key of per-category stats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseCategory {
    #[serde(alias = "SYLLABLE")]
    Syllable,
    #[serde(alias = "RHYME")]
    Rhyme,
    #[serde(alias = "BLEND")]
    Blend,
    #[serde(alias = "SIGHT")]
    Sight,
    #[serde(alias = "SUFFIX")]
    Suffix,
}

impl ExerciseCategory {
    pub const ALL: [ExerciseCategory; 5] = [
        ExerciseCategory::Syllable,
        ExerciseCategory::Rhyme,
        ExerciseCategory::Blend,
        ExerciseCategory::Sight,
        ExerciseCategory::Suffix,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseCategory::Syllable => "syllable",
            ExerciseCategory::Rhyme => "rhyme",
            ExerciseCategory::Blend => "blend",
            ExerciseCategory::Sight => "sight",
            ExerciseCategory::Suffix => "suffix",
        }
    }
}

impl fmt::Display for ExerciseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown exercise category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for ExerciseCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        ExerciseCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == lowered)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Immutable catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub category: ExerciseCategory,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    /// Point multiplier, always >= 1.
    pub difficulty: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Exercise {
    pub fn is_valid_selection(&self, selected_index: usize) -> bool {
        selected_index < self.options.len()
    }
}

/// Payload for adding an exercise to the catalog.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_correct_index"))]
pub struct NewExercise {
    #[serde(alias = "type")]
    pub category: ExerciseCategory,

    #[serde(alias = "question")]
    #[validate(length(min = 1, max = 500, message = "Prompt must be between 1 and 500 characters"))]
    pub prompt: String,

    #[validate(length(min = 2, max = 10, message = "Exercise needs between 2 and 10 options"))]
    pub options: Vec<String>,

    #[serde(alias = "correctAnswer")]
    pub correct_index: usize,

    #[validate(range(min = 1, max = 10, message = "Difficulty must be between 1 and 10"))]
    pub difficulty: u32,

    pub explanation: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,
}

fn validate_correct_index(exercise: &NewExercise) -> Result<(), ValidationError> {
    if exercise.correct_index >= exercise.options.len() {
        let mut err = ValidationError::new("correct_index_out_of_range");
        err.message = Some("correctIndex must point at one of the options".into());
        return Err(err);
    }
    Ok(())
}

impl NewExercise {
    pub fn into_exercise(self, created_at: DateTime<Utc>) -> Exercise {
        Exercise {
            id: Uuid::new_v4().to_string(),
            category: self.category,
            prompt: self.prompt,
            options: self.options,
            correct_index: self.correct_index,
            difficulty: self.difficulty,
            explanation: self.explanation,
            tags: self.tags,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_exercise(options: &[&str], correct_index: usize, difficulty: u32) -> NewExercise {
        NewExercise {
            category: ExerciseCategory::Rhyme,
            prompt: "Which word rhymes with \"light\"?".to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_index,
            difficulty,
            explanation: None,
            tags: vec![],
        }
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("SYLLABLE".parse::<ExerciseCategory>().unwrap(), ExerciseCategory::Syllable);
        assert_eq!("blend".parse::<ExerciseCategory>().unwrap(), ExerciseCategory::Blend);
        assert!("vowel".parse::<ExerciseCategory>().is_err());
    }

    #[test]
    fn category_serializes_lowercase_and_accepts_legacy_uppercase() {
        assert_eq!(serde_json::to_string(&ExerciseCategory::Sight).unwrap(), "\"sight\"");
        let parsed: ExerciseCategory = serde_json::from_str("\"SUFFIX\"").unwrap();
        assert_eq!(parsed, ExerciseCategory::Suffix);
    }

    #[test]
    fn new_exercise_requires_two_options() {
        assert!(new_exercise(&["bite"], 0, 1).validate().is_err());
        assert!(new_exercise(&["bite", "cat"], 0, 1).validate().is_ok());
    }

    #[test]
    fn new_exercise_rejects_out_of_range_answer() {
        assert!(new_exercise(&["bite", "cat"], 2, 1).validate().is_err());
    }

    #[test]
    fn new_exercise_rejects_zero_difficulty() {
        assert!(new_exercise(&["bite", "cat"], 0, 0).validate().is_err());
    }

    #[test]
    fn selection_bounds_follow_options() {
        let exercise = new_exercise(&["2", "3", "4", "5"], 1, 1).into_exercise(Utc::now());
        assert!(exercise.is_valid_selection(3));
        assert!(!exercise.is_valid_selection(4));
    }
}
