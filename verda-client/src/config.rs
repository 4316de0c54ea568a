//! Client configuration

use crate::auth::{AuthClient, TokenCell};
use crate::error::{ClientError, ClientResult};
use crate::rest::RestClient;
use crate::storage::StorageClient;

/// Environment variable holding the remote service base URL.
pub const ENV_BASE_URL: &str = "VERDA_SUPABASE_URL";
/// Environment variable holding the anonymous API key.
pub const ENV_ANON_KEY: &str = "VERDA_SUPABASE_ANON_KEY";

/// Client configuration for connecting to the Remote Data Service
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service base URL (e.g. "https://project.example.co")
    pub base_url: String,

    /// Anonymous API key, sent on every request
    pub api_key: String,

    /// Request timeout in seconds
    pub timeout: u64,
}

impl ClientConfig {
    /// Create a new client configuration.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout: 30,
        }
    }

    /// Read the configuration from the environment.
    pub fn from_env() -> ClientResult<Self> {
        let base_url = std::env::var(ENV_BASE_URL)
            .map_err(|_| ClientError::Validation(format!("{ENV_BASE_URL} is not set")))?;
        let api_key = std::env::var(ENV_ANON_KEY)
            .map_err(|_| ClientError::Validation(format!("{ENV_ANON_KEY} is not set")))?;
        Ok(Self::new(base_url, api_key))
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Build the connected client bundle. The row, auth and storage
    /// clients share one token cell, so a sign-in through the auth client
    /// authenticates the other two.
    pub fn connect(&self) -> ClientResult<RemoteService> {
        let token = TokenCell::default();
        Ok(RemoteService {
            rows: RestClient::new(self, token.clone())?,
            auth: AuthClient::new(self, token.clone())?,
            storage: StorageClient::new(self, token)?,
        })
    }
}

/// Connected clients for one remote service
pub struct RemoteService {
    pub rows: RestClient,
    pub auth: AuthClient,
    pub storage: StorageClient,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthApi, AuthSession, AuthUser};

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = ClientConfig::new("https://db.example.co/", "anon-key");
        assert_eq!(config.base_url, "https://db.example.co");
    }

    #[test]
    fn connected_clients_share_the_token_cell() {
        let config = ClientConfig::new("https://db.example.co", "anon-key");
        let service = config.connect().unwrap();
        assert!(service.rows.token_cell().get().is_none());

        service.auth.restore(&AuthSession {
            access_token: "tok-1".into(),
            refresh_token: None,
            user: AuthUser {
                id: "u1".into(),
                email: "a@b.c".into(),
            },
        });
        assert_eq!(service.rows.token_cell().get().as_deref(), Some("tok-1"));
    }
}
