use std::sync::Arc;

use axum::{extract::FromRef, Router};

use crate::state::AppState;

pub mod client;
pub mod handlers;

pub fn router() -> Router<AppState> {
    handlers::ai_routes()
}

impl FromRef<AppState> for Arc<client::GenerativeClient> {
    fn from_ref(state: &AppState) -> Self {
        state.ai.clone()
    }
}
