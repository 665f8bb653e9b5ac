use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: String,
    pub expire_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub default_model: String,
}

/// One default account created by the bootstrap seeder.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SeedUser {
    pub username: String,
    pub display_name: String,
    pub role: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    pub app_env: String,
    pub database_url: String,
    pub jwt: JwtConfig,
    pub ai: AiConfig,
    pub seed_users: Vec<SeedUser>,
    /// True when `seed_users` is the built-in list rather than `SEED_USERS_FILE`.
    #[serde(default)]
    pub builtin_seed_users: bool,
}

pub const DEFAULT_JWT_SECRET: &str = "change_me";
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_EXPIRE_MINUTES: i64 = 60 * 24;

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET_KEY").unwrap_or_else(|_| DEFAULT_JWT_SECRET.into()),
            algorithm: std::env::var("JWT_ALGORITHM").unwrap_or_else(|_| "HS256".into()),
            expire_minutes: parse_expire_minutes(
                std::env::var("JWT_EXPIRE_MINUTES").ok().as_deref(),
            )?,
        };
        let ai = AiConfig {
            api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            api_base: std::env::var("GEMINI_API_BASE").unwrap_or_else(|_| {
                "https://generativelanguage.googleapis.com/v1beta".into()
            }),
            default_model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
        };
        let (seed_users, builtin_seed_users) = match std::env::var("SEED_USERS_FILE") {
            Ok(path) => (load_seed_users(&path)?, false),
            Err(_) => (default_seed_users(), true),
        };
        Ok(Self {
            app_name: std::env::var("APP_NAME").unwrap_or_else(|_| "Gozu Backend".into()),
            app_env: std::env::var("APP_ENV").unwrap_or_else(|_| "local".into()),
            database_url,
            jwt,
            ai,
            seed_users,
            builtin_seed_users,
        })
    }

    pub fn is_local(&self) -> bool {
        self.app_env == "local"
    }

    /// Built-in accounts share a well-known password; only acceptable locally.
    pub fn seeds_builtin_outside_local(&self) -> bool {
        self.builtin_seed_users && !self.is_local()
    }
}

/// Token TTL in minutes; unset means one day, anything unparsable is an error.
pub fn parse_expire_minutes(raw: Option<&str>) -> anyhow::Result<i64> {
    match raw {
        None => Ok(DEFAULT_EXPIRE_MINUTES),
        Some(v) => v
            .trim()
            .parse::<i64>()
            .with_context(|| format!("JWT_EXPIRE_MINUTES must be an integer, got {v:?}")),
    }
}

/// Reads a JSON array of seed accounts.
pub fn load_seed_users(path: &str) -> anyhow::Result<Vec<SeedUser>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read seed users file {path}"))?;
    parse_seed_users(&raw).with_context(|| format!("parse seed users file {path}"))
}

pub fn parse_seed_users(raw: &str) -> anyhow::Result<Vec<SeedUser>> {
    Ok(serde_json::from_str(raw)?)
}

pub fn default_seed_users() -> Vec<SeedUser> {
    [
        ("creator", "Pattern Designer", "creator"),
        ("manufacturer", "Workshop Manufacturer", "manufacturer"),
        ("buyer", "Roaming Buyer", "buyer"),
        ("admin", "System Administrator", "admin"),
    ]
    .into_iter()
    .map(|(username, display_name, role)| SeedUser {
        username: username.into(),
        display_name: display_name.into(),
        role: role.into(),
        password: "123456".into(),
    })
    .collect()
}
