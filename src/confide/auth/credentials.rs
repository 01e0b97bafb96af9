//! Username/password verification and registration.

use anyhow::{anyhow, Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use sqlx::PgPool;
use std::sync::OnceLock;
use tracing::warn;

use super::storage::{insert_local_user, lookup_user_by_username, InsertOutcome};
use super::types::{Credential, User};

/// Result of a registration attempt.
#[derive(Debug)]
pub enum RegisterOutcome {
    Created(User),
    /// The username is already taken; nothing was written.
    Duplicate,
}

/// Result of a login attempt. The two failure causes (unknown username,
/// wrong password) are deliberately collapsed into one variant.
#[derive(Debug)]
pub enum LoginOutcome {
    Verified(User),
    InvalidCredentials,
}

/// Hash a password with a fresh random salt, returning the PHC string.
pub(crate) fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {err}"))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC string.
pub(crate) fn verify_password(phc: &str, password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(phc) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// PHC string verified for usernames that don't exist, so a miss costs the
/// same hash work as a wrong password.
fn dummy_phc() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| {
        hash_password("confide-dummy-password").unwrap_or_else(|_| String::new())
    })
}

/// Register a new local account.
///
/// Duplicates are detected by the unique index on insert, not a prior
/// existence check, so two racing registrations cannot both succeed.
pub async fn register(pool: &PgPool, username: &str, password: &str) -> Result<RegisterOutcome> {
    let password_hash = hash_password(password)?;

    match insert_local_user(pool, username, &password_hash).await? {
        InsertOutcome::Created(id) => Ok(RegisterOutcome::Created(User {
            id,
            username: Some(username.to_string()),
            credential: Credential::Local { password_hash },
            secret: None,
        })),
        InsertOutcome::Conflict => Ok(RegisterOutcome::Duplicate),
    }
}

/// Verify a username/password pair against the store.
pub async fn login(pool: &PgPool, username: &str, password: &str) -> Result<LoginOutcome> {
    let user = lookup_user_by_username(pool, username)
        .await
        .context("login lookup failed")?;

    let Some(user) = user else {
        // Unknown username: burn the same verification work anyway.
        let _ = verify_password(dummy_phc(), password);
        return Ok(LoginOutcome::InvalidCredentials);
    };

    let Credential::Local { ref password_hash } = user.credential else {
        // Federated accounts have no password to check.
        warn!("password login attempted for federated user");
        let _ = verify_password(dummy_phc(), password);
        return Ok(LoginOutcome::InvalidCredentials);
    };

    if verify_password(password_hash, password) {
        Ok(LoginOutcome::Verified(user))
    } else {
        Ok(LoginOutcome::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() -> Result<()> {
        let phc = hash_password("correct horse battery staple")?;
        assert!(phc.starts_with("$argon2id$"));
        assert!(verify_password(&phc, "correct horse battery staple"));
        assert!(!verify_password(&phc, "correct horse battery stapl"));
        Ok(())
    }

    #[test]
    fn salts_are_fresh_per_hash() -> Result<()> {
        let first = hash_password("same password")?;
        let second = hash_password("same password")?;
        assert_ne!(first, second);
        Ok(())
    }

    #[test]
    fn verify_rejects_malformed_phc() {
        assert!(!verify_password("not a phc string", "anything"));
        assert!(!verify_password("", "anything"));
    }

    #[test]
    fn dummy_phc_is_a_valid_hash() {
        assert!(dummy_phc().starts_with("$argon2id$"));
        assert!(!verify_password(dummy_phc(), "some guess"));
    }

    #[test]
    fn outcome_debug_names() {
        assert_eq!(format!("{:?}", RegisterOutcome::Duplicate), "Duplicate");
        assert_eq!(
            format!("{:?}", LoginOutcome::InvalidCredentials),
            "InvalidCredentials"
        );
    }
}
