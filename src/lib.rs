//! # Confide
//!
//! `confide` is a small web service where people share one secret each,
//! anonymously. Visitors sign up with a username and password or sign in with
//! their Google account, submit a secret, and browse everything submitted so
//! far on a public page.
//!
//! ## Identity
//!
//! A user record carries exactly one credential: an Argon2id password hash for
//! local accounts, or the Google subject id for federated accounts. The
//! exactly-one rule is enforced twice — a `CHECK` constraint in the schema and
//! a tagged `Credential` variant in code — so a half-initialized row can never
//! be authenticated.
//!
//! ## Sessions
//!
//! Browsers hold an opaque 32-byte token in an `HttpOnly` cookie; the
//! database stores only its SHA-256 hash. Sessions expire 24 hours after
//! issuance (lazy check on lookup, no background sweeper) and are deleted on
//! logout. A request without a valid token is simply anonymous: protected
//! routes redirect it to `/login` rather than erroring.
//!
//! ## Database
//!
//! The schema lives in `db/sql/` and is applied by the operator; the service
//! never migrates it. Concurrency around duplicate identities (two
//! simultaneous federated logins, two registrations racing on one username)
//! is resolved by unique indexes and SQLSTATE 23505, never by locking.

pub mod cli;
pub mod confide;
