//! bcrypt password hashes.
//!
//! Hashing is CPU-bound, so both operations run on the blocking pool.

use anyhow::{Context, Result};

/// Work factor used when none is configured.
pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

/// Hash a password with a fresh random salt.
pub async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .context("password hashing task failed")?
        .context("hashing password")
}

/// Check a password against a stored hash. Malformed hashes never match.
pub async fn verify_password(password: &str, stored: &str) -> Result<bool> {
    let password = password.to_owned();
    let stored = stored.to_owned();
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &stored))
        .await
        .context("password verification task failed")?;
    match verified {
        Ok(matches) => Ok(matches),
        Err(err) => {
            tracing::warn!(error = %err, "Stored password hash is not valid bcrypt");
            Ok(false)
        }
    }
}
