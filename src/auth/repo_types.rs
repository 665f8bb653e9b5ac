use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,                      // assigned by the store
    pub username: String,             // normalized, unique
    pub display_name: String,
    pub role: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,      // Argon2 PHC string, not exposed in JSON
    pub created_at: OffsetDateTime,
}

/// Fields supplied when creating a user; `id` and `created_at` come from the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub display_name: String,
    pub role: String,
    pub hashed_password: String,
}
