//! User records and the credential variant.

use anyhow::{bail, Result};
use uuid::Uuid;

/// How a user proves who they are. Exactly one per user, mirrored by a
/// `CHECK` constraint in the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Argon2id PHC string; the salt is embedded in the string.
    Local { password_hash: String },
    /// Stable subject id issued by the OAuth provider.
    Federated { subject: String },
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: Option<String>,
    pub credential: Credential,
    pub secret: Option<String>,
}

impl User {
    /// Assemble a user from raw store columns, rejecting rows that violate
    /// the exactly-one-credential invariant.
    pub(crate) fn from_columns(
        id: Uuid,
        username: Option<String>,
        password_hash: Option<String>,
        google_subject: Option<String>,
        secret: Option<String>,
    ) -> Result<Self> {
        let credential = match (password_hash, google_subject) {
            (Some(password_hash), None) => Credential::Local { password_hash },
            (None, Some(subject)) => Credential::Federated { subject },
            (Some(_), Some(_)) => bail!("user {id} has both credential kinds"),
            (None, None) => bail!("user {id} has no credential"),
        };

        Ok(Self {
            id,
            username,
            credential,
            secret,
        })
    }
}
