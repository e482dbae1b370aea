use anyhow::Context;
use phonics_api::{config::Config, seed, storage::MongoStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::load().context("Failed to load configuration")?;

    let store = MongoStore::connect(&config.mongo_uri, &config.mongo_database).await?;
    store.ensure_indexes().await?;

    let report = seed::seed(&store, config.bcrypt_cost).await?;
    tracing::info!(
        exercises = report.exercises_inserted,
        teacher_created = report.teacher_created,
        "Database seeded"
    );

    Ok(())
}
