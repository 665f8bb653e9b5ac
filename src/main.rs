mod ai;
mod app;
mod auth;
mod config;
mod error;
mod state;

use anyhow::Context;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "gozu=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;
    tracing::info!(
        app = %app_state.config.app_name,
        env = %app_state.config.app_env,
        generative = app_state.ai.is_configured(),
        "starting"
    );

    if app_state.config.seeds_builtin_outside_local() {
        tracing::warn!("seeding built-in default accounts outside the local environment");
    }
    let created = auth::seed::ensure_defaults(app_state.users.as_ref(), &app_state.config.seed_users)
        .await
        .context("seed default accounts")?;
    let total = app_state
        .users
        .count()
        .await
        .context("count users after seeding")?;
    tracing::info!(created, total, "default accounts ensured");

    app::serve(app::build_app(app_state)).await
}
