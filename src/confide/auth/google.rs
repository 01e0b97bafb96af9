//! Google OAuth client: authorization URL, code exchange, profile fetch.

use anyhow::{bail, Context, Result};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use crate::confide::APP_USER_AGENT;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

// openid is required for the userinfo endpoint; profile matches what the
// original consent screen asks for.
const OAUTH_SCOPE: &str = "openid profile";

#[derive(Clone, Debug)]
pub struct GoogleConfig {
    client_id: String,
    client_secret: SecretString,
    callback_url: String,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
}

impl GoogleConfig {
    #[must_use]
    pub fn new(client_id: String, client_secret: SecretString, callback_url: String) -> Self {
        Self {
            client_id,
            client_secret,
            callback_url,
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_auth_url(mut self, url: String) -> Self {
        self.auth_url = url;
        self
    }

    #[must_use]
    pub fn with_token_url(mut self, url: String) -> Self {
        self.token_url = url;
        self
    }

    #[must_use]
    pub fn with_userinfo_url(mut self, url: String) -> Self {
        self.userinfo_url = url;
        self
    }

    #[must_use]
    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }
}

/// HTTP client for the provider round-trips. Built once at startup and shared
/// through the application context.
#[derive(Debug)]
pub struct GoogleClient {
    http: Client,
    config: GoogleConfig,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UserInfo {
    sub: String,
}

impl GoogleClient {
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: GoogleConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .context("failed to build Google OAuth client")?;
        Ok(Self { http, config })
    }

    /// URL the browser is sent to, carrying the CSRF `state` value.
    /// # Errors
    /// Returns an error if the configured authorization URL is invalid.
    pub fn authorize_url(&self, state: &str) -> Result<String> {
        let mut url =
            Url::parse(&self.config.auth_url).context("invalid Google authorization URL")?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.callback_url)
            .append_pair("response_type", "code")
            .append_pair("scope", OAUTH_SCOPE)
            .append_pair("state", state);
        Ok(url.into())
    }

    /// Exchange the callback authorization code for an access token.
    /// # Errors
    /// Returns an error on transport failure or a non-200 provider response.
    pub async fn exchange_code(&self, code: &str) -> Result<String> {
        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
            ("redirect_uri", self.config.callback_url.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .context("Google token request failed")?;

        if response.status() != StatusCode::OK {
            bail!("Google token endpoint returned {}", response.status());
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("invalid Google token response")?;

        Ok(token.access_token)
    }

    /// Fetch the OpenID profile and return the stable subject id.
    /// # Errors
    /// Returns an error on transport failure or a non-200 provider response.
    pub async fn fetch_subject(&self, access_token: &str) -> Result<String> {
        let response = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .context("Google userinfo request failed")?;

        if response.status() != StatusCode::OK {
            bail!("Google userinfo endpoint returned {}", response.status());
        }

        let profile: UserInfo = response
            .json()
            .await
            .context("invalid Google userinfo response")?;

        Ok(profile.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    fn test_client() -> Result<GoogleClient> {
        let config = GoogleConfig::new(
            "client-id".to_string(),
            SecretString::from("client-secret".to_string()),
            "http://localhost:3000/auth/google/secrets".to_string(),
        );
        GoogleClient::new(config)
    }

    #[test]
    fn authorize_url_carries_expected_parameters() -> Result<()> {
        let client = test_client()?;
        let url = client.authorize_url("random-state")?;
        let parsed = Url::parse(&url)?;

        assert_eq!(parsed.host_str(), Some("accounts.google.com"));

        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let get = |key: &str| -> Option<&str> {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("client_id"), Some("client-id"));
        assert_eq!(
            get("redirect_uri"),
            Some("http://localhost:3000/auth/google/secrets")
        );
        assert_eq!(get("response_type"), Some("code"));
        assert_eq!(get("scope"), Some("openid profile"));
        assert_eq!(get("state"), Some("random-state"));
        Ok(())
    }

    #[test]
    fn authorize_url_rejects_bad_base() -> Result<()> {
        let config = GoogleConfig::new(
            "client-id".to_string(),
            SecretString::from("client-secret".to_string()),
            "http://localhost:3000/auth/google/secrets".to_string(),
        )
        .with_auth_url("not a url".to_string());
        let client = GoogleClient::new(config)?;
        assert!(client.authorize_url("state").is_err());
        Ok(())
    }

    #[test]
    fn token_response_parses() -> Result<()> {
        let token: TokenResponse = serde_json::from_str(
            r#"{"access_token":"ya29.token","expires_in":3599,"token_type":"Bearer"}"#,
        )
        .context("token response should parse")?;
        assert_eq!(token.access_token, "ya29.token");
        Ok(())
    }

    #[test]
    fn userinfo_parses_subject() -> Result<()> {
        let profile: UserInfo = serde_json::from_str(
            r#"{"sub":"110169484474386276334","name":"Alice","picture":"https://example.com/p.jpg"}"#,
        )
        .context("userinfo should parse")?;
        assert_eq!(profile.sub, "110169484474386276334");
        Ok(())
    }

    #[test]
    fn config_debug_redacts_secret() -> Result<()> {
        let client = test_client()?;
        let debug = format!("{:?}", client.config);
        assert!(!debug.contains("client-secret"));
        Ok(())
    }
}
