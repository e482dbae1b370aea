use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app_env: String,
    pub port: u16,
    pub mongo_uri: String,
    pub mongo_database: String,
    pub redis_uri: String,
    pub jwt_secret: String,
    pub jwt_ttl_seconds: i64,
    pub bcrypt_cost: u32,
    /// Size of the `GET /api/exercises` page.
    pub recent_exercises_limit: usize,
    pub login_max_failures: i64,
    pub login_lockout_seconds: u64,
    pub idempotency_ttl_seconds: u64,
    /// `username:password` for the `/metrics` endpoint.
    pub metrics_auth: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_env: "dev".to_string(),
            port: 3001,
            mongo_uri: "mongodb://localhost:27017/?replicaSet=rs0".to_string(),
            mongo_database: "phonics".to_string(),
            redis_uri: "redis://127.0.0.1:6379/0".to_string(),
            jwt_secret: "dev-secret-only-for-local-testing".to_string(),
            jwt_ttl_seconds: 7 * 24 * 3600,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            recent_exercises_limit: 10,
            login_max_failures: 5,
            login_lockout_seconds: 15 * 60,
            idempotency_ttl_seconds: 24 * 3600,
            metrics_auth: "admin:changeme".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", app_env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let defaults = Config::default();

        let lookup = |key: &str, var: &str| -> Option<String> {
            settings.get_string(key).ok().or_else(|| env::var(var).ok())
        };

        let jwt_secret = match lookup("auth.jwt_secret", "JWT_SECRET") {
            Some(secret) => secret,
            None if app_env == "prod" => {
                return Err(config::ConfigError::Message(
                    "JWT_SECRET must be set in production".to_string(),
                ))
            }
            None => {
                eprintln!("WARNING: Using default JWT_SECRET (dev mode only!)");
                defaults.jwt_secret.clone()
            }
        };

        Ok(Config {
            port: parse_or(lookup("server.port", "PORT"), "PORT", defaults.port)?,
            mongo_uri: lookup("database.mongo_uri", "MONGO_URI").unwrap_or(defaults.mongo_uri),
            mongo_database: lookup("database.mongo_database", "MONGO_DATABASE")
                .unwrap_or(defaults.mongo_database),
            redis_uri: lookup("redis.uri", "REDIS_URI").unwrap_or(defaults.redis_uri),
            jwt_secret,
            jwt_ttl_seconds: parse_or(
                lookup("auth.jwt_ttl_seconds", "JWT_TTL_SECONDS"),
                "JWT_TTL_SECONDS",
                defaults.jwt_ttl_seconds,
            )?,
            bcrypt_cost: parse_or(
                lookup("auth.bcrypt_cost", "BCRYPT_COST"),
                "BCRYPT_COST",
                defaults.bcrypt_cost,
            )?,
            recent_exercises_limit: parse_or(
                lookup("catalog.recent_limit", "RECENT_EXERCISES_LIMIT"),
                "RECENT_EXERCISES_LIMIT",
                defaults.recent_exercises_limit,
            )?,
            login_max_failures: parse_or(
                lookup("auth.login_max_failures", "LOGIN_MAX_FAILURES"),
                "LOGIN_MAX_FAILURES",
                defaults.login_max_failures,
            )?,
            login_lockout_seconds: parse_or(
                lookup("auth.login_lockout_seconds", "LOGIN_LOCKOUT_SECONDS"),
                "LOGIN_LOCKOUT_SECONDS",
                defaults.login_lockout_seconds,
            )?,
            idempotency_ttl_seconds: parse_or(
                lookup("submissions.idempotency_ttl_seconds", "IDEMPOTENCY_TTL_SECONDS"),
                "IDEMPOTENCY_TTL_SECONDS",
                defaults.idempotency_ttl_seconds,
            )?,
            metrics_auth: lookup("metrics.auth", "METRICS_AUTH").unwrap_or(defaults.metrics_auth),
            app_env,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    name: &str,
    default: T,
) -> Result<T, config::ConfigError> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| config::ConfigError::Message(format!("{} has an invalid value: {}", name, raw))),
        None => Ok(default),
    }
}
