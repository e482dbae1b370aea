pub mod attempt;
pub mod badge;
pub mod exercise;
pub mod progress;
pub mod user;

pub use attempt::{Attempt, SubmitAnswerRequest, SubmitAnswerResponse};
pub use badge::{BadgeAward, BadgeDefinition, BadgeId, EarnedBadge, BADGES};
pub use exercise::{Exercise, ExerciseCategory, NewExercise};
pub use progress::{CategoryStats, Progress, VersionedProgress};
pub use user::{User, UserProfile, UserRole};
