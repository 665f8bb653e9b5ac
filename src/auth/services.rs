use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::{
    claims::Claims,
    jwt::{TokenError, TokenIssuer},
    password::{hash_password, verify_password},
    repo::{StoreError, UserStore},
    repo_types::{NewUser, User},
};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username already exists")]
    DuplicateUsername,
    /// Shared by "unknown user" and "wrong password" so callers cannot tell them apart.
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("store error: {0}")]
    Store(#[source] StoreError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => AuthError::DuplicateUsername,
            other => AuthError::Store(other),
        }
    }
}

impl AuthError {
    /// Errors caused by the client's input rather than by the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AuthError::DuplicateUsername | AuthError::InvalidCredentials)
    }
}

/// The one place usernames are canonicalized before any store access.
pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenIssuer) -> Self {
        Self { users, tokens }
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        display_name: &str,
        role: &str,
    ) -> Result<User, AuthError> {
        let username = normalize_username(username);
        if self.users.find_by_username(&username).await?.is_some() {
            warn!(username = %username, "username already registered");
            return Err(AuthError::DuplicateUsername);
        }

        let hashed_password = hash_password(password)?;
        // A concurrent registration can still win between lookup and insert;
        // the store reports that as a conflict, which maps to DuplicateUsername.
        let user = self
            .users
            .create(NewUser {
                username,
                display_name: display_name.to_owned(),
                role: role.to_owned(),
                hashed_password,
            })
            .await?;
        debug!(user_id = user.id, "user record created");
        Ok(user)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<(User, String), AuthError> {
        let username = normalize_username(username);
        let Some(user) = self.users.find_by_username(&username).await? else {
            warn!(username = %username, "login unknown username");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &user.hashed_password)? {
            warn!(username = %username, user_id = user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user.username, &user.role)?;
        Ok((user, token))
    }

    /// Resolves the account a decoded token refers to.
    pub async fn current_user(&self, claims: &Claims) -> Result<User, AuthError> {
        self.users
            .find_by_username(&claims.sub)
            .await?
            .ok_or(AuthError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::repo::{MemoryUserStore, RacingStore},
        config::JwtConfig,
    };

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&JwtConfig {
            secret: "test-secret".into(),
            algorithm: "HS256".into(),
            expire_minutes: 60,
        })
        .expect("jwt config")
    }

    fn service() -> AuthService {
        AuthService::new(Arc::new(MemoryUserStore::new()), issuer())
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_username("  Alice "), "alice");
        assert_eq!(normalize_username("BOB"), "bob");
    }

    #[tokio::test]
    async fn register_returns_first_id_and_normalized_username() {
        let auth = service();
        let user = auth
            .register("Alice", "pw1", "Alice A", "buyer")
            .await
            .expect("register");
        assert_eq!(user.id, 1);
        assert_eq!(user.username, "alice");
        assert_eq!(user.display_name, "Alice A");
        assert_eq!(user.role, "buyer");
        assert_ne!(user.hashed_password, "pw1");
    }

    #[tokio::test]
    async fn register_is_case_insensitive_on_duplicates() {
        let auth = service();
        auth.register("Alice", "pw1", "Alice A", "buyer").await.unwrap();
        let err = auth
            .register("  alice", "pw2", "Other", "creator")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateUsername));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn login_issues_token_with_username_and_role() {
        let auth = service();
        auth.register("Alice", "pw1", "Alice A", "buyer").await.unwrap();
        let (user, token) = auth.login("ALICE", "pw1").await.expect("login");
        assert_eq!(user.username, "alice");
        let claims = issuer().decode(&token).expect("decode");
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, "buyer");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_identical() {
        let auth = service();
        auth.register("alice", "pw1", "Alice A", "buyer").await.unwrap();
        let wrong = auth.login("alice", "nope").await.unwrap_err();
        let unknown = auth.login("nobody", "pw1").await.unwrap_err();
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn current_user_follows_token_subject() {
        let auth = service();
        auth.register("carol", "pw", "Carol", "creator").await.unwrap();
        let (_, token) = auth.login("carol", "pw").await.unwrap();
        let claims = issuer().decode(&token).unwrap();
        let me = auth.current_user(&claims).await.unwrap();
        assert_eq!(me.username, "carol");
    }

    #[tokio::test]
    async fn insert_conflict_after_empty_lookup_is_duplicate_username() {
        let auth = AuthService::new(Arc::new(RacingStore), issuer());
        let err = auth
            .register("alice", "pw1", "Alice A", "buyer")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateUsername));
        assert_eq!(err.to_string(), "Username already exists");
    }
}
