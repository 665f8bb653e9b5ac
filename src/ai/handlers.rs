use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};

use crate::{
    ai::client::GenerativeClient,
    error::{api_error, ApiError},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub output: Option<String>,
    pub provider: String,
}

pub fn ai_routes() -> Router<AppState> {
    Router::new().route("/ai/generate", post(generate))
}

#[instrument(skip(client, payload))]
pub async fn generate(
    State(client): State<Arc<GenerativeClient>>,
    Json(payload): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let model = payload
        .model
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(client.default_model());

    let output = client.generate(&payload.prompt, model).await.map_err(|e| {
        error!(error = %e, model, "generative call failed");
        api_error(StatusCode::BAD_GATEWAY, "Upstream generation failed")
    })?;

    Ok(Json(GenerateResponse {
        output,
        provider: "gemini".into(),
    }))
}
