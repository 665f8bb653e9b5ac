use anyhow::Context;
use tracing::{debug, info};

use crate::{
    auth::{
        password::hash_password,
        repo::{StoreError, UserStore},
        repo_types::NewUser,
        services::normalize_username,
    },
    config::SeedUser,
};

/// Creates every seed account that does not exist yet. Returns how many were created.
pub async fn ensure_defaults(store: &dyn UserStore, seeds: &[SeedUser]) -> anyhow::Result<usize> {
    let mut created = 0;
    for seed in seeds {
        let username = normalize_username(&seed.username);
        if store
            .find_by_username(&username)
            .await
            .with_context(|| format!("look up seed user {username}"))?
            .is_some()
        {
            debug!(username = %username, "seed user already present");
            continue;
        }

        let hashed_password = hash_password(&seed.password)?;
        let result = store
            .create(NewUser {
                username: username.clone(),
                display_name: seed.display_name.clone(),
                role: seed.role.clone(),
                hashed_password,
            })
            .await;
        match result {
            Ok(user) => {
                info!(username = %user.username, role = %user.role, "seed user created");
                created += 1;
            }
            Err(StoreError::Conflict) => {
                debug!(username = %username, "seed user created concurrently");
            }
            Err(e) => return Err(e).with_context(|| format!("create seed user {username}")),
        }
    }
    Ok(created)
}
