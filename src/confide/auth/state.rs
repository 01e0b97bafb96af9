//! Application auth context: configuration plus the shared Google client.

use anyhow::Result;

use super::google::{GoogleClient, GoogleConfig};

const DEFAULT_SESSION_TTL_SECONDS: i64 = 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    session_ttl_seconds: i64,
    cookie_secure: bool,
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            cookie_secure: false,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared per-process auth state.
///
/// Constructed once at startup, wrapped in an `Arc`, and handed to every
/// request through an axum `Extension`; dropped with the process.
#[derive(Debug)]
pub struct AuthState {
    config: AuthConfig,
    google: GoogleClient,
}

impl AuthState {
    /// # Errors
    /// Returns an error if the Google HTTP client cannot be built.
    pub fn new(config: AuthConfig, google: GoogleConfig) -> Result<Self> {
        Ok(Self {
            google: GoogleClient::new(google)?,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn google(&self) -> &GoogleClient {
        &self.google
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_24_hours() {
        let config = AuthConfig::new();
        assert_eq!(config.session_ttl_seconds(), 86_400);
        assert!(!config.cookie_secure());
    }

    #[test]
    fn builders_override_defaults() {
        let config = AuthConfig::new()
            .with_session_ttl_seconds(3_600)
            .with_cookie_secure(true);
        assert_eq!(config.session_ttl_seconds(), 3_600);
        assert!(config.cookie_secure());
    }
}
