//! Find-or-create for federated identities.

use anyhow::{anyhow, Result};
use sqlx::PgPool;
use tracing::debug;

use super::storage::{insert_federated_user, lookup_user_by_subject, InsertOutcome};
use super::types::{Credential, User};

/// Whether `resolve` found an existing user or created one.
#[derive(Debug)]
pub enum ResolveOutcome {
    Existing(User),
    Created(User),
}

impl ResolveOutcome {
    #[must_use]
    pub fn into_user(self) -> User {
        match self {
            Self::Existing(user) | Self::Created(user) => user,
        }
    }
}

/// Resolve a provider subject id to a local user.
///
/// Explicit three-step machine: lookup, insert on miss, re-lookup when the
/// insert loses the race on the unique index. Two concurrent logins with the
/// same subject therefore converge on a single row without any locking.
pub async fn resolve(pool: &PgPool, subject: &str) -> Result<ResolveOutcome> {
    if let Some(user) = lookup_user_by_subject(pool, subject).await? {
        return Ok(ResolveOutcome::Existing(user));
    }

    match insert_federated_user(pool, subject).await? {
        InsertOutcome::Created(id) => {
            debug!("created federated user");
            Ok(ResolveOutcome::Created(User {
                id,
                username: None,
                credential: Credential::Federated {
                    subject: subject.to_string(),
                },
                secret: None,
            }))
        }
        InsertOutcome::Conflict => {
            // Lost the race: the winner's row must exist now.
            lookup_user_by_subject(pool, subject)
                .await?
                .map(ResolveOutcome::Existing)
                .ok_or_else(|| anyhow!("federated user vanished after insert conflict"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_user() -> User {
        User {
            id: Uuid::nil(),
            username: None,
            credential: Credential::Federated {
                subject: "1234567890".to_string(),
            },
            secret: None,
        }
    }

    #[test]
    fn into_user_unwraps_both_variants() {
        let existing = ResolveOutcome::Existing(sample_user()).into_user();
        let created = ResolveOutcome::Created(sample_user()).into_user();
        assert_eq!(existing.id, created.id);
        assert_eq!(existing.credential, created.credential);
    }

    #[test]
    fn outcome_debug_names() {
        let outcome = ResolveOutcome::Created(sample_user());
        assert!(format!("{outcome:?}").starts_with("Created"));
    }
}
