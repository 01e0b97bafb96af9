//! Authentication and session management.
//!
//! Three cooperating pieces live here:
//!
//! - [`credentials`] verifies and registers username/password accounts
//!   (Argon2id, salt embedded in the PHC string).
//! - [`federated`] resolves a Google subject id to a local user with an
//!   insert-or-refetch state machine backed by a unique index.
//! - [`session`] issues and resolves the opaque session tokens browsers hold
//!   in an `HttpOnly` cookie. Only SHA-256 hashes of tokens are stored.
//!
//! A request is either **anonymous** (no valid, unexpired token) or
//! **authenticated** (token resolves to a live user row). Expiry is lazy: the
//! lookup filters on `expires_at`, nothing sweeps the table.

pub mod credentials;
pub mod federated;
pub mod google;
pub mod session;
mod state;
pub(crate) mod storage;
pub mod types;
mod utils;

pub use google::GoogleConfig;
pub use state::{AuthConfig, AuthState};
