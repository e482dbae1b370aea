use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    error::{ErrorKind, WriteFailure, TRANSIENT_TRANSACTION_ERROR, UNKNOWN_TRANSACTION_COMMIT_RESULT},
    options::IndexOptions,
    Client, ClientSession, Collection, Database, IndexModel,
};
use serde::{Deserialize, Serialize};

use super::{Store, StoreError, SubmissionCommit};
use crate::metrics::track_db_operation;
use crate::models::{
    Attempt, BadgeAward, BadgeId, CategoryStats, Exercise, ExerciseCategory, Progress, User,
    UserRole, VersionedProgress,
};

const EXERCISES: &str = "exercises";
const USERS: &str = "users";
const PROGRESS: &str = "progress";
const ATTEMPTS: &str = "attempts";
const BADGE_AWARDS: &str = "badge_awards";

const DUPLICATE_KEY: i32 = 11000;
const WRITE_CONFLICT: i32 = 112;

/// Extra `commitTransaction` calls after an unknown commit result.
const COMMIT_RETRIES: u32 = 3;

/// MongoDB-backed store. Submission commits run inside a client session
/// transaction, which requires a replica set (a single-node one is enough).
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    pub fn new(client: Client, database: &str) -> Self {
        let db = client.database(database);
        Self { client, db }
    }

    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self::new(client, database))
    }

    pub async fn ensure_indexes(&self) -> Result<(), StoreError> {
        self.users()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;
        self.attempts()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "userId": 1, "createdAt": -1 })
                    .build(),
            )
            .await?;
        self.exercises()
            .create_index(IndexModel::builder().keys(doc! { "createdAt": -1 }).build())
            .await?;
        self.awards()
            .create_index(IndexModel::builder().keys(doc! { "userId": 1 }).build())
            .await?;

        tracing::info!("MongoDB indexes ensured");
        Ok(())
    }

    fn exercises(&self) -> Collection<ExerciseDocument> {
        self.db.collection(EXERCISES)
    }

    fn users(&self) -> Collection<UserDocument> {
        self.db.collection(USERS)
    }

    fn progress(&self) -> Collection<ProgressDocument> {
        self.db.collection(PROGRESS)
    }

    fn attempts(&self) -> Collection<AttemptDocument> {
        self.db.collection(ATTEMPTS)
    }

    fn awards(&self) -> Collection<BadgeAwardDocument> {
        self.db.collection(BADGE_AWARDS)
    }

    async fn write_submission(
        &self,
        session: &mut ClientSession,
        commit: &SubmissionCommit,
    ) -> Result<u64, StoreError> {
        let user_id = commit.progress.user_id.as_str();

        let version = match commit.expected_version {
            Some(expected) => {
                let next = expected + 1;
                let document = ProgressDocument::from_progress(&commit.progress, next);
                let result = self
                    .progress()
                    .replace_one(doc! { "_id": user_id, "version": expected as i64 }, &document)
                    .session(&mut *session)
                    .await
                    .map_err(|e| transaction_error(e, user_id))?;
                if result.matched_count == 0 {
                    return Err(StoreError::Conflict(format!("progress {}", user_id)));
                }
                next
            }
            None => {
                let document = ProgressDocument::from_progress(&commit.progress, 1);
                self.progress()
                    .insert_one(&document)
                    .session(&mut *session)
                    .await
                    .map_err(|e| transaction_error(e, user_id))?;
                1
            }
        };

        self.attempts()
            .insert_one(AttemptDocument::from(&commit.attempt))
            .session(&mut *session)
            .await
            .map_err(|e| transaction_error(e, user_id))?;

        for award in &commit.awards {
            let document = BadgeAwardDocument::from(award);
            let mut on_insert = mongodb::bson::to_document(&document)
                .map_err(|e| corrupt(BADGE_AWARDS, e.to_string()))?;
            on_insert.remove("_id");
            self.awards()
                .update_one(doc! { "_id": &document.id }, doc! { "$setOnInsert": on_insert })
                .upsert(true)
                .session(&mut *session)
                .await
                .map_err(|e| transaction_error(e, user_id))?;
        }

        Ok(version)
    }

    async fn delete_user_records(
        &self,
        session: &mut ClientSession,
        id: &str,
    ) -> Result<bool, StoreError> {
        self.attempts()
            .delete_many(doc! { "userId": id })
            .session(&mut *session)
            .await?;
        self.awards()
            .delete_many(doc! { "userId": id })
            .session(&mut *session)
            .await?;
        self.progress()
            .delete_one(doc! { "_id": id })
            .session(&mut *session)
            .await?;
        let result = self
            .users()
            .delete_one(doc! { "_id": id })
            .session(&mut *session)
            .await?;
        Ok(result.deleted_count > 0)
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn find_exercise(&self, id: &str) -> Result<Option<Exercise>, StoreError> {
        track_db_operation("find_one", EXERCISES, async {
            self.exercises()
                .find_one(doc! { "_id": id })
                .await?
                .map(Exercise::try_from)
                .transpose()
        })
        .await
    }

    async fn list_recent_exercises(&self, limit: usize) -> Result<Vec<Exercise>, StoreError> {
        track_db_operation("find", EXERCISES, async {
            let documents: Vec<ExerciseDocument> = self
                .exercises()
                .find(doc! {})
                .sort(doc! { "createdAt": -1 })
                .limit(limit as i64)
                .await?
                .try_collect()
                .await?;
            documents
                .into_iter()
                .map(Exercise::try_from)
                .collect::<Result<Vec<_>, StoreError>>()
        })
        .await
    }

    async fn insert_exercise(&self, exercise: &Exercise) -> Result<(), StoreError> {
        track_db_operation("insert_one", EXERCISES, async {
            self.exercises()
                .insert_one(ExerciseDocument::from(exercise))
                .await
                .map_err(|e| duplicate_or(e, "exercise id"))?;
            Ok::<(), StoreError>(())
        })
        .await
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        track_db_operation("find_one", USERS, async {
            self.users()
                .find_one(doc! { "_id": id })
                .await?
                .map(User::try_from)
                .transpose()
        })
        .await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        track_db_operation("find_one", USERS, async {
            self.users()
                .find_one(doc! { "email": email })
                .await?
                .map(User::try_from)
                .transpose()
        })
        .await
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        track_db_operation("insert_one", USERS, async {
            self.users()
                .insert_one(UserDocument::from(user))
                .await
                .map_err(|e| duplicate_or(e, "email"))?;
            Ok::<(), StoreError>(())
        })
        .await
    }

    async fn update_user(&self, user: &User) -> Result<bool, StoreError> {
        track_db_operation("replace_one", USERS, async {
            let result = self
                .users()
                .replace_one(doc! { "_id": &user.id }, UserDocument::from(user))
                .await
                .map_err(|e| duplicate_or(e, "email"))?;
            Ok::<bool, StoreError>(result.matched_count > 0)
        })
        .await
    }

    async fn delete_user(&self, id: &str) -> Result<bool, StoreError> {
        track_db_operation("transaction", USERS, async {
            let mut session = self.client.start_session().await?;
            session.start_transaction().await?;

            match self.delete_user_records(&mut session, id).await {
                Ok(deleted) => {
                    commit_with_retry(&mut session, id).await?;
                    tracing::info!(user_id = %id, deleted, "User records removed");
                    Ok::<bool, StoreError>(deleted)
                }
                Err(err) => {
                    if let Err(abort_err) = session.abort_transaction().await {
                        tracing::warn!("Failed to abort delete transaction: {}", abort_err);
                    }
                    Err(err)
                }
            }
        })
        .await
    }

    async fn load_progress(&self, user_id: &str) -> Result<Option<VersionedProgress>, StoreError> {
        track_db_operation("find_one", PROGRESS, async {
            self.progress()
                .find_one(doc! { "_id": user_id })
                .await?
                .map(VersionedProgress::try_from)
                .transpose()
        })
        .await
    }

    async fn commit_submission(&self, commit: &SubmissionCommit) -> Result<u64, StoreError> {
        let user_id = commit.progress.user_id.as_str();

        track_db_operation("transaction", PROGRESS, async {
            let mut session = self.client.start_session().await?;
            session.start_transaction().await?;

            match self.write_submission(&mut session, commit).await {
                Ok(version) => {
                    commit_with_retry(&mut session, user_id).await?;
                    Ok::<u64, StoreError>(version)
                }
                Err(err) => {
                    if let Err(abort_err) = session.abort_transaction().await {
                        tracing::warn!("Failed to abort submission transaction: {}", abort_err);
                    }
                    Err(err)
                }
            }
        })
        .await
    }

    async fn recent_attempts(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Attempt>, StoreError> {
        track_db_operation("find", ATTEMPTS, async {
            let documents: Vec<AttemptDocument> = self
                .attempts()
                .find(doc! { "userId": user_id })
                .sort(doc! { "createdAt": -1 })
                .limit(limit as i64)
                .await?
                .try_collect()
                .await?;
            documents
                .into_iter()
                .map(Attempt::try_from)
                .collect::<Result<Vec<_>, StoreError>>()
        })
        .await
    }

    async fn badge_awards(&self, user_id: &str) -> Result<Vec<BadgeAward>, StoreError> {
        track_db_operation("find", BADGE_AWARDS, async {
            let documents: Vec<BadgeAwardDocument> = self
                .awards()
                .find(doc! { "userId": user_id })
                .sort(doc! { "awardedAt": 1 })
                .await?
                .try_collect()
                .await?;
            documents
                .into_iter()
                .map(BadgeAward::try_from)
                .collect::<Result<Vec<_>, StoreError>>()
        })
        .await
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    server_code(err) == Some(DUPLICATE_KEY)
}

fn duplicate_or(err: mongodb::error::Error, what: &str) -> StoreError {
    if is_duplicate_key(&err) {
        StoreError::Duplicate(what.to_string())
    } else {
        StoreError::Database(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransactionFailure {
    /// Nothing was written; the whole read-modify-commit may run again.
    Conflict,
    /// Only the commit itself may be retried.
    CommitUnknown,
    Fatal,
}

fn server_code(err: &mongodb::error::Error) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(we)) => Some(we.code),
        ErrorKind::Command(ce) => Some(ce.code),
        _ => None,
    }
}

fn classify_failure(code: Option<i32>, labels: &HashSet<String>) -> TransactionFailure {
    // checked first: a commit may carry both labels and must never be replayed
    if labels.contains(UNKNOWN_TRANSACTION_COMMIT_RESULT) {
        return TransactionFailure::CommitUnknown;
    }
    if labels.contains(TRANSIENT_TRANSACTION_ERROR)
        || matches!(code, Some(DUPLICATE_KEY) | Some(WRITE_CONFLICT))
    {
        return TransactionFailure::Conflict;
    }
    TransactionFailure::Fatal
}

/// Errors inside the transaction body. Nothing is committed yet, so
/// "another submission got there first" is reported as a conflict.
fn transaction_error(err: mongodb::error::Error, user_id: &str) -> StoreError {
    match classify_failure(server_code(&err), err.labels()) {
        TransactionFailure::Fatal => StoreError::Database(err),
        _ => StoreError::Conflict(format!("progress {}", user_id)),
    }
}

/// Commits the open transaction. An unknown commit result is resolved by
/// re-sending `commitTransaction`, which the server applies at most once.
async fn commit_with_retry(session: &mut ClientSession, user_id: &str) -> Result<(), StoreError> {
    let mut retries = 0;
    loop {
        let err = match session.commit_transaction().await {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };

        match classify_failure(server_code(&err), err.labels()) {
            TransactionFailure::CommitUnknown if retries < COMMIT_RETRIES => {
                retries += 1;
                tracing::warn!(user_id, retries, "Commit result unknown, retrying commit: {}", err);
            }
            TransactionFailure::CommitUnknown => {
                tracing::error!(user_id, "Commit result still unknown: {}", err);
                return Err(StoreError::CommitUnknown(format!("progress {}", user_id)));
            }
            TransactionFailure::Conflict => {
                return Err(StoreError::Conflict(format!("progress {}", user_id)))
            }
            TransactionFailure::Fatal => return Err(StoreError::Database(err)),
        }
    }
}

fn corrupt(collection: &'static str, message: impl Into<String>) -> StoreError {
    StoreError::Corrupt {
        collection,
        message: message.into(),
    }
}

fn to_u32(value: i64, collection: &'static str, field: &str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| corrupt(collection, format!("{} out of range: {}", field, value)))
}

fn to_usize(value: i64, collection: &'static str, field: &str) -> Result<usize, StoreError> {
    usize::try_from(value)
        .map_err(|_| corrupt(collection, format!("{} out of range: {}", field, value)))
}

// Serde converters for chrono::DateTime <-> mongodb::bson::DateTime
mod bson_datetime_as_chrono {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        bson::DateTime::from_millis(date.timestamp_millis()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bson_dt = bson::DateTime::deserialize(deserializer)?;
        DateTime::from_timestamp_millis(bson_dt.timestamp_millis())
            .ok_or_else(|| serde::de::Error::custom("timestamp out of range"))
    }
}

mod bson_datetime_as_chrono_option {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_some(&bson::DateTime::from_millis(d.timestamp_millis())),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt_bson_dt: Option<bson::DateTime> = Option::deserialize(deserializer)?;
        opt_bson_dt
            .map(|bson_dt| {
                DateTime::from_timestamp_millis(bson_dt.timestamp_millis())
                    .ok_or_else(|| serde::de::Error::custom("timestamp out of range"))
            })
            .transpose()
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExerciseDocument {
    #[serde(rename = "_id")]
    id: String,
    category: String,
    prompt: String,
    options: Vec<String>,
    correct_index: i64,
    difficulty: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(with = "bson_datetime_as_chrono")]
    created_at: DateTime<Utc>,
}

impl From<&Exercise> for ExerciseDocument {
    fn from(exercise: &Exercise) -> Self {
        Self {
            id: exercise.id.clone(),
            category: exercise.category.as_str().to_string(),
            prompt: exercise.prompt.clone(),
            options: exercise.options.clone(),
            correct_index: exercise.correct_index as i64,
            difficulty: i64::from(exercise.difficulty),
            explanation: exercise.explanation.clone(),
            tags: exercise.tags.clone(),
            created_at: exercise.created_at,
        }
    }
}

impl TryFrom<ExerciseDocument> for Exercise {
    type Error = StoreError;

    fn try_from(doc: ExerciseDocument) -> Result<Self, Self::Error> {
        let category = doc
            .category
            .parse::<ExerciseCategory>()
            .map_err(|e| corrupt(EXERCISES, e.to_string()))?;
        Ok(Exercise {
            id: doc.id,
            category,
            prompt: doc.prompt,
            options: doc.options,
            correct_index: to_usize(doc.correct_index, EXERCISES, "correctIndex")?,
            difficulty: to_u32(doc.difficulty, EXERCISES, "difficulty")?,
            explanation: doc.explanation,
            tags: doc.tags,
            created_at: doc.created_at,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDocument {
    #[serde(rename = "_id")]
    id: String,
    email: String,
    password_hash: String,
    name: String,
    role: String,
    #[serde(default)]
    grade: Option<i32>,
    #[serde(with = "bson_datetime_as_chrono")]
    created_at: DateTime<Utc>,
    #[serde(with = "bson_datetime_as_chrono")]
    updated_at: DateTime<Utc>,
}

impl From<&User> for UserDocument {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            name: user.name.clone(),
            role: user.role.as_str().to_string(),
            grade: user.grade.map(i32::from),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl TryFrom<UserDocument> for User {
    type Error = StoreError;

    fn try_from(doc: UserDocument) -> Result<Self, Self::Error> {
        let role = UserRole::parse(&doc.role)
            .ok_or_else(|| corrupt(USERS, format!("unknown role {}", doc.role)))?;
        let grade = doc
            .grade
            .map(|g| u8::try_from(g).map_err(|_| corrupt(USERS, format!("grade out of range: {}", g))))
            .transpose()?;
        Ok(User {
            id: doc.id,
            email: doc.email,
            password_hash: doc.password_hash,
            name: doc.name,
            role,
            grade,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressDocument {
    #[serde(rename = "_id")]
    user_id: String,
    version: i64,
    exercises_completed: i64,
    total_answers: i64,
    correct_answers: i64,
    points: i64,
    streak: i64,
    #[serde(default, with = "bson_datetime_as_chrono_option")]
    last_activity: Option<DateTime<Utc>>,
    #[serde(default)]
    badges: Vec<String>,
    #[serde(default)]
    per_category_stats: BTreeMap<String, CategoryStatsDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CategoryStatsDocument {
    completed: i64,
    accuracy: f64,
}

impl ProgressDocument {
    fn from_progress(progress: &Progress, version: u64) -> Self {
        Self {
            user_id: progress.user_id.clone(),
            version: version as i64,
            exercises_completed: i64::from(progress.exercises_completed),
            total_answers: i64::from(progress.total_answers),
            correct_answers: i64::from(progress.correct_answers),
            points: progress.points as i64,
            streak: i64::from(progress.streak),
            last_activity: progress.last_activity,
            badges: progress
                .badges
                .iter()
                .map(|b| b.as_str().to_string())
                .collect(),
            per_category_stats: progress
                .per_category_stats
                .iter()
                .map(|(category, stats)| {
                    (
                        category.as_str().to_string(),
                        CategoryStatsDocument {
                            completed: i64::from(stats.completed),
                            accuracy: stats.accuracy,
                        },
                    )
                })
                .collect(),
        }
    }
}

impl TryFrom<ProgressDocument> for VersionedProgress {
    type Error = StoreError;

    fn try_from(doc: ProgressDocument) -> Result<Self, Self::Error> {
        let badges = doc
            .badges
            .iter()
            .map(|b| BadgeId::parse(b).ok_or_else(|| corrupt(PROGRESS, format!("unknown badge {}", b))))
            .collect::<Result<_, _>>()?;

        let mut per_category_stats = BTreeMap::new();
        for (key, stats) in doc.per_category_stats {
            let category = key
                .parse::<ExerciseCategory>()
                .map_err(|e| corrupt(PROGRESS, e.to_string()))?;
            per_category_stats.insert(
                category,
                CategoryStats {
                    completed: to_u32(stats.completed, PROGRESS, "completed")?,
                    accuracy: stats.accuracy,
                },
            );
        }

        let progress = Progress {
            user_id: doc.user_id,
            exercises_completed: to_u32(doc.exercises_completed, PROGRESS, "exercisesCompleted")?,
            total_answers: to_u32(doc.total_answers, PROGRESS, "totalAnswers")?,
            correct_answers: to_u32(doc.correct_answers, PROGRESS, "correctAnswers")?,
            points: u64::try_from(doc.points)
                .map_err(|_| corrupt(PROGRESS, format!("points out of range: {}", doc.points)))?,
            streak: to_u32(doc.streak, PROGRESS, "streak")?,
            last_activity: doc.last_activity,
            badges,
            per_category_stats,
        };

        Ok(VersionedProgress {
            progress,
            version: u64::try_from(doc.version)
                .map_err(|_| corrupt(PROGRESS, format!("version out of range: {}", doc.version)))?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttemptDocument {
    #[serde(rename = "_id")]
    id: String,
    user_id: String,
    exercise_id: String,
    selected_index: i64,
    is_correct: bool,
    time_spent_seconds: i64,
    #[serde(with = "bson_datetime_as_chrono")]
    created_at: DateTime<Utc>,
}

impl From<&Attempt> for AttemptDocument {
    fn from(attempt: &Attempt) -> Self {
        Self {
            id: attempt.id.clone(),
            user_id: attempt.user_id.clone(),
            exercise_id: attempt.exercise_id.clone(),
            selected_index: attempt.selected_index as i64,
            is_correct: attempt.is_correct,
            time_spent_seconds: i64::from(attempt.time_spent_seconds),
            created_at: attempt.created_at,
        }
    }
}

impl TryFrom<AttemptDocument> for Attempt {
    type Error = StoreError;

    fn try_from(doc: AttemptDocument) -> Result<Self, Self::Error> {
        Ok(Attempt {
            id: doc.id,
            user_id: doc.user_id,
            exercise_id: doc.exercise_id,
            selected_index: to_usize(doc.selected_index, ATTEMPTS, "selectedIndex")?,
            is_correct: doc.is_correct,
            time_spent_seconds: to_u32(doc.time_spent_seconds, ATTEMPTS, "timeSpentSeconds")?,
            created_at: doc.created_at,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BadgeAwardDocument {
    /// `{userId}:{badgeId}`, so a badge can be held once per user.
    #[serde(rename = "_id")]
    id: String,
    user_id: String,
    badge_id: String,
    #[serde(with = "bson_datetime_as_chrono")]
    awarded_at: DateTime<Utc>,
}

impl From<&BadgeAward> for BadgeAwardDocument {
    fn from(award: &BadgeAward) -> Self {
        Self {
            id: format!("{}:{}", award.user_id, award.badge_id),
            user_id: award.user_id.clone(),
            badge_id: award.badge_id.as_str().to_string(),
            awarded_at: award.awarded_at,
        }
    }
}

impl TryFrom<BadgeAwardDocument> for BadgeAward {
    type Error = StoreError;

    fn try_from(doc: BadgeAwardDocument) -> Result<Self, Self::Error> {
        let badge_id = BadgeId::parse(&doc.badge_id)
            .ok_or_else(|| corrupt(BADGE_AWARDS, format!("unknown badge {}", doc.badge_id)))?;
        Ok(BadgeAward {
            user_id: doc.user_id,
            badge_id,
            awarded_at: doc.awarded_at,
        })
    }
}
