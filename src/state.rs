use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::ai::client::GenerativeClient;
use crate::auth::{
    jwt::TokenIssuer,
    repo::{MemoryUserStore, PgUserStore, UserStore},
    services::AuthService,
};
use crate::config::{AppConfig, DEFAULT_JWT_SECRET};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub tokens: TokenIssuer,
    pub auth: AuthService,
    pub ai: Arc<GenerativeClient>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        if config.jwt.secret == DEFAULT_JWT_SECRET {
            warn!("JWT_SECRET_KEY is unset; tokens are signed with the built-in development secret");
        }
        let users = connect_store(&config.database_url).await?;
        Self::from_parts(config, users)
    }

    pub fn from_parts(config: AppConfig, users: Arc<dyn UserStore>) -> anyhow::Result<Self> {
        let tokens = TokenIssuer::new(&config.jwt)?;
        let ai = Arc::new(GenerativeClient::new(&config.ai)?);
        let auth = AuthService::new(users.clone(), tokens.clone());
        Ok(Self {
            config: Arc::new(config),
            users,
            tokens,
            auth,
            ai,
        })
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::{default_seed_users, AiConfig, JwtConfig, DEFAULT_MODEL};

        let config = AppConfig {
            app_name: "test".into(),
            app_env: "local".into(),
            database_url: "memory".into(),
            jwt: JwtConfig {
                secret: "test".into(),
                algorithm: "HS256".into(),
                expire_minutes: 5,
            },
            ai: AiConfig {
                api_key: None,
                api_base: "http://127.0.0.1:9".into(),
                default_model: DEFAULT_MODEL.into(),
            },
            seed_users: default_seed_users(),
            builtin_seed_users: true,
        };
        Self::from_parts(config, Arc::new(MemoryUserStore::new())).expect("fake state")
    }
}

/// `memory` selects the in-process store; anything else is a Postgres URL.
async fn connect_store(database_url: &str) -> anyhow::Result<Arc<dyn UserStore>> {
    if database_url == "memory" {
        warn!("using in-memory user store; accounts are lost on restart");
        return Ok(Arc::new(MemoryUserStore::new()));
    }

    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")?;
    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("run database migrations")?;
    info!("database migrations applied");
    Ok(Arc::new(PgUserStore::new(db)))
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
