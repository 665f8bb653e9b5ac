use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{LoginRequest, MeResponse, RegisterRequest, TokenResponse, UserResponse},
        extractors::AuthUser,
        services::AuthService,
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me))
}

#[instrument(skip(auth, payload))]
pub async fn register(
    State(auth): State<AuthService>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = auth
        .register(
            &payload.username,
            &payload.password,
            &payload.display_name,
            &payload.role,
        )
        .await?;

    info!(user_id = user.id, username = %user.username, role = %user.role, "user registered");
    Ok(Json(user.into()))
}

#[instrument(skip(auth, payload))]
pub async fn login(
    State(auth): State<AuthService>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let (user, token) = auth.login(&payload.username, &payload.password).await?;

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(Json(TokenResponse::bearer(token, user)))
}

#[instrument(skip(auth, claims))]
pub async fn get_me(
    State(auth): State<AuthService>,
    AuthUser(claims): AuthUser,
) -> Result<Json<MeResponse>, ApiError> {
    let user = auth.current_user(&claims).await?;
    let created_at = user.created_at;
    Ok(Json(MeResponse {
        user: user.into(),
        created_at,
    }))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{app::build_app, state::AppState};

    fn app() -> Router {
        build_app(AppState::fake())
    }

    async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn get_with_token(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut req = Request::builder().uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let response = app
            .clone()
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn register_returns_public_user() {
        let app = app();
        let (status, body) = post_json(
            &app,
            "/auth/register",
            json!({"username": "Alice", "password": "pw1", "displayName": "Alice A", "role": "buyer"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 1);
        assert_eq!(body["username"], "alice");
        assert_eq!(body["display_name"], "Alice A");
        assert!(body.get("hashed_password").is_none());
    }

    #[tokio::test]
    async fn duplicate_register_is_bad_request() {
        let app = app();
        let payload = json!({"username": "alice", "password": "pw1", "display_name": "A", "role": "buyer"});
        post_json(&app, "/auth/register", payload).await;
        let (status, body) = post_json(
            &app,
            "/auth/register",
            json!({"username": "ALICE ", "password": "pw2", "display_name": "B", "role": "creator"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Username already exists");
    }

    #[tokio::test]
    async fn login_returns_bearer_token_usable_on_me() {
        let app = app();
        post_json(
            &app,
            "/auth/register",
            json!({"username": "dora", "password": "pw", "display_name": "Dora", "role": "creator"}),
        )
        .await;

        let (status, body) =
            post_json(&app, "/auth/login", json!({"username": "Dora", "password": "pw"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token_type"], "bearer");
        assert_eq!(body["user"]["role"], "creator");

        let token = body["access_token"].as_str().expect("token string");
        let (status, me) = get_with_token(&app, "/auth/me", Some(token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["username"], "dora");
        assert!(me["created_at"].is_string());
    }

    #[tokio::test]
    async fn login_failures_share_one_message() {
        let app = app();
        post_json(
            &app,
            "/auth/register",
            json!({"username": "eve", "password": "right", "display_name": "Eve", "role": "buyer"}),
        )
        .await;
        let (s1, wrong) =
            post_json(&app, "/auth/login", json!({"username": "eve", "password": "wrong"})).await;
        let (s2, unknown) =
            post_json(&app, "/auth/login", json!({"username": "ghost", "password": "right"})).await;
        assert_eq!(s1, StatusCode::BAD_REQUEST);
        assert_eq!(s2, StatusCode::BAD_REQUEST);
        assert_eq!(wrong["detail"], unknown["detail"]);
    }

    #[tokio::test]
    async fn me_requires_valid_bearer() {
        let app = app();
        let (status, _) = get_with_token(&app, "/auth/me", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, body) = get_with_token(&app, "/auth/me", Some("garbage")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Invalid or expired token");
    }
}
