//! Starter catalog and demo accounts for fresh installations.

use anyhow::Context;
use chrono::{Duration, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::models::{ExerciseCategory, NewExercise, User, UserRole};
use crate::storage::{Store, StoreError};

pub const DEMO_TEACHER_EMAIL: &str = "teacher@school.com";
pub const DEMO_TEACHER_PASSWORD: &str = "teacher123";
pub const DEMO_TEACHER_NAME: &str = "Ms. Johnson";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub exercises_inserted: usize,
    pub teacher_created: bool,
}

fn sample(
    category: ExerciseCategory,
    prompt: &str,
    options: &[&str],
    correct_index: usize,
    difficulty: u32,
    explanation: Option<&str>,
    tags: &[&str],
) -> NewExercise {
    NewExercise {
        category,
        prompt: prompt.to_string(),
        options: options.iter().map(|s| s.to_string()).collect(),
        correct_index,
        difficulty,
        explanation: explanation.map(str::to_string),
        tags: tags.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn sample_exercises() -> Vec<NewExercise> {
    use ExerciseCategory::{Blend, Rhyme, Sight, Suffix, Syllable};

    vec![
        sample(
            Syllable,
            "How many syllables are in \"computer\"?",
            &["2", "3", "4", "5"],
            1,
            1,
            Some("Computer has 3 syllables: com-pu-ter"),
            &["syllable-counting", "beginner"],
        ),
        sample(
            Syllable,
            "How many syllables are in \"elephant\"?",
            &["2", "3", "4", "5"],
            1,
            1,
            Some("Elephant has 3 syllables: el-e-phant"),
            &["syllable-counting", "beginner"],
        ),
        sample(
            Syllable,
            "How many syllables are in \"incredible\"?",
            &["2", "3", "4", "5"],
            2,
            2,
            Some("Incredible has 4 syllables: in-cred-i-ble"),
            &["syllable-counting"],
        ),
        sample(
            Rhyme,
            "Which word rhymes with \"light\"?",
            &["bite", "might", "fight", "all of these"],
            3,
            1,
            None,
            &["rhyming", "beginner"],
        ),
        sample(
            Rhyme,
            "Which word rhymes with \"cake\"?",
            &["make", "cat", "car", "cap"],
            0,
            1,
            None,
            &["rhyming", "beginner"],
        ),
        sample(
            Blend,
            "What sound does \"ch\" make in \"chair\"?",
            &["/k/", "/ch/", "/sh/", "/th/"],
            1,
            1,
            None,
            &["digraphs"],
        ),
        sample(
            Blend,
            "What blend do you hear at the start of \"street\"?",
            &["st", "str", "tr", "sr"],
            1,
            2,
            None,
            &["consonant-blends"],
        ),
        sample(
            Sight,
            "Which is the correct spelling?",
            &["becuz", "because", "becaus", "becuase"],
            1,
            1,
            None,
            &["spelling"],
        ),
        sample(
            Sight,
            "Which is the correct spelling?",
            &["definitly", "definately", "definitely", "definatley"],
            2,
            2,
            None,
            &["spelling"],
        ),
        sample(
            Suffix,
            "What is the suffix in \"hopeless\"?",
            &["-hope", "-less", "-ess", "-le"],
            1,
            1,
            None,
            &["suffixes"],
        ),
        sample(
            Suffix,
            "What does the suffix \"-ful\" mean in \"beautiful\"?",
            &["without", "full of", "before", "after"],
            1,
            2,
            None,
            &["suffixes", "meaning"],
        ),
    ]
}

/// Inserts the starter catalog into an empty store and creates the demo
/// teacher if the email is free. Safe to run repeatedly.
pub async fn seed(store: &dyn Store, bcrypt_cost: u32) -> anyhow::Result<SeedReport> {
    let mut report = SeedReport::default();

    if store.list_recent_exercises(1).await?.is_empty() {
        // spaced a second apart so listing order matches catalog order
        let base = Utc::now();
        for (offset, new_exercise) in sample_exercises().into_iter().enumerate() {
            new_exercise
                .validate()
                .with_context(|| format!("Sample exercise {} is invalid", offset))?;
            let exercise = new_exercise.into_exercise(base + Duration::seconds(offset as i64));
            store.insert_exercise(&exercise).await?;
            report.exercises_inserted += 1;
        }
        tracing::info!(count = report.exercises_inserted, "Seeded exercise catalog");
    } else {
        tracing::info!("Exercise catalog already populated, skipping");
    }

    if store.find_user_by_email(DEMO_TEACHER_EMAIL).await?.is_none() {
        let now = Utc::now();
        let teacher = User {
            id: Uuid::new_v4().to_string(),
            email: DEMO_TEACHER_EMAIL.to_string(),
            password_hash: bcrypt::hash(DEMO_TEACHER_PASSWORD, bcrypt_cost)
                .context("Failed to hash demo teacher password")?,
            name: DEMO_TEACHER_NAME.to_string(),
            role: UserRole::Teacher,
            grade: None,
            created_at: now,
            updated_at: now,
        };
        match store.insert_user(&teacher).await {
            Ok(()) => {
                report.teacher_created = true;
                tracing::info!(email = DEMO_TEACHER_EMAIL, "Created demo teacher");
            }
            Err(StoreError::Duplicate(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn every_category_has_samples() {
        let samples = sample_exercises();
        for category in ExerciseCategory::ALL {
            assert!(samples.iter().any(|e| e.category == category), "{}", category);
        }
        assert!(samples.iter().all(|e| e.validate().is_ok()));
    }

    #[tokio::test]
    async fn seeding_twice_is_a_no_op() {
        let store = MemoryStore::new();

        let first = seed(&store, 4).await.unwrap();
        assert_eq!(first.exercises_inserted, sample_exercises().len());
        assert!(first.teacher_created);

        let second = seed(&store, 4).await.unwrap();
        assert_eq!(second, SeedReport::default());

        let teacher = store
            .find_user_by_email(DEMO_TEACHER_EMAIL)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(teacher.role, UserRole::Teacher);
        assert!(bcrypt::verify(DEMO_TEACHER_PASSWORD, &teacher.password_hash).unwrap());
    }
}
