use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::progress::Progress;

/// Built-in badges, declared in evaluation order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum BadgeId {
    FirstSteps,
    TenDayStreak,
    Century,
    Master,
}

impl BadgeId {
    pub const EVALUATION_ORDER: [BadgeId; 4] = [
        BadgeId::FirstSteps,
        BadgeId::TenDayStreak,
        BadgeId::Century,
        BadgeId::Master,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeId::FirstSteps => "first-steps",
            BadgeId::TenDayStreak => "ten-day-streak",
            BadgeId::Century => "century",
            BadgeId::Master => "master",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::EVALUATION_ORDER
            .into_iter()
            .find(|badge| badge.as_str() == value)
    }

    pub fn definition(&self) -> &'static BadgeDefinition {
        // BADGES is indexed in declaration order
        &BADGES[*self as usize]
    }

    /// Whether an already-updated aggregate satisfies this badge.
    pub fn is_earned_by(&self, progress: &Progress) -> bool {
        let threshold = u64::from(self.definition().requirement_value);
        match self {
            // awarded on the very first completion only
            BadgeId::FirstSteps => u64::from(progress.exercises_completed) == threshold,
            BadgeId::TenDayStreak => u64::from(progress.streak) >= threshold,
            BadgeId::Century => progress.points >= threshold,
            BadgeId::Master => u64::from(progress.exercises_completed) >= threshold,
        }
    }
}

impl fmt::Display for BadgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RequirementType {
    ExerciseCount,
    StreakLength,
    PointTotal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeDefinition {
    pub id: BadgeId,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub requirement_type: RequirementType,
    pub requirement_value: u32,
}

pub static BADGES: [BadgeDefinition; 4] = [
    BadgeDefinition {
        id: BadgeId::FirstSteps,
        name: "First Steps",
        description: "Complete your first exercise",
        icon: "🎯",
        requirement_type: RequirementType::ExerciseCount,
        requirement_value: 1,
    },
    BadgeDefinition {
        id: BadgeId::TenDayStreak,
        name: "10 Day Streak",
        description: "Answer 10 exercises in a row correctly",
        icon: "🔥",
        requirement_type: RequirementType::StreakLength,
        requirement_value: 10,
    },
    BadgeDefinition {
        id: BadgeId::Century,
        name: "Century",
        description: "Earn 100 points",
        icon: "💯",
        requirement_type: RequirementType::PointTotal,
        requirement_value: 100,
    },
    BadgeDefinition {
        id: BadgeId::Master,
        name: "Phonics Master",
        description: "Complete 50 exercises",
        icon: "🏆",
        requirement_type: RequirementType::ExerciseCount,
        requirement_value: 50,
    },
];

/// Membership record written when a badge is first earned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BadgeAward {
    pub user_id: String,
    pub badge_id: BadgeId,
    pub awarded_at: DateTime<Utc>,
}

/// Earned badge as shown on a user profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnedBadge {
    #[serde(flatten)]
    pub badge: &'static BadgeDefinition,
    pub awarded_at: DateTime<Utc>,
}

impl From<&BadgeAward> for EarnedBadge {
    fn from(award: &BadgeAward) -> Self {
        EarnedBadge {
            badge: award.badge_id.definition(),
            awarded_at: award.awarded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definitions_follow_declaration_order() {
        for badge in BadgeId::EVALUATION_ORDER {
            assert_eq!(badge.definition().id, badge);
        }
    }

    #[test]
    fn badge_ids_use_kebab_case() {
        assert_eq!(
            serde_json::to_string(&BadgeId::TenDayStreak).unwrap(),
            "\"ten-day-streak\""
        );
        assert_eq!(BadgeId::parse("century"), Some(BadgeId::Century));
        assert_eq!(BadgeId::parse("hundred_points"), None);
    }

    #[test]
    fn first_steps_only_on_first_completion() {
        let mut progress = Progress::new("u1");
        progress.exercises_completed = 1;
        assert!(BadgeId::FirstSteps.is_earned_by(&progress));
        progress.exercises_completed = 2;
        assert!(!BadgeId::FirstSteps.is_earned_by(&progress));
    }

    #[test]
    fn thresholds_are_inclusive() {
        let mut progress = Progress::new("u1");
        progress.streak = 10;
        progress.points = 100;
        progress.exercises_completed = 50;
        assert!(BadgeId::TenDayStreak.is_earned_by(&progress));
        assert!(BadgeId::Century.is_earned_by(&progress));
        assert!(BadgeId::Master.is_earned_by(&progress));

        progress.streak = 9;
        progress.points = 90;
        progress.exercises_completed = 49;
        assert!(!BadgeId::TenDayStreak.is_earned_by(&progress));
        assert!(!BadgeId::Century.is_earned_by(&progress));
        assert!(!BadgeId::Master.is_earned_by(&progress));
    }
}
