use secrecy::SecretString;

/// Google OAuth credentials shared by the server action.
///
/// Initialized once from the CLI/environment at process start and handed to
/// the application context; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub google_client_id: String,
    pub google_client_secret: SecretString,
    pub google_callback_url: String,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(client_id: String, client_secret: SecretString, callback_url: String) -> Self {
        Self {
            google_client_id: client_id,
            google_client_secret: client_secret,
            google_callback_url: callback_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(
            "client-id".to_string(),
            SecretString::from("client-secret".to_string()),
            "https://confide.tld/auth/google/secrets".to_string(),
        );
        assert_eq!(args.google_client_id, "client-id");
        assert_eq!(args.google_client_secret.expose_secret(), "client-secret");
        assert_eq!(
            args.google_callback_url,
            "https://confide.tld/auth/google/secrets"
        );
    }
}
