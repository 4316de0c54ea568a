//! Auth session lifecycle
//!
//! Wraps the remote service's auth subsystem: password sign-up/sign-in,
//! sign-out, password recovery. The current access token lives in a
//! [`TokenCell`] shared with the row and storage clients, and sign-in /
//! sign-out events are broadcast to subscribers.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Shared access-token slot
///
/// Cloning shares the underlying slot; setting the token on one handle is
/// visible to every client holding a clone.
#[derive(Debug, Clone, Default)]
pub struct TokenCell(Arc<RwLock<Option<String>>>);

impl TokenCell {
    pub fn get(&self) -> Option<String> {
        self.0.read().expect("token cell poisoned").clone()
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.0.write().expect("token cell poisoned") = Some(token.into());
    }

    pub fn clear(&self) {
        *self.0.write().expect("token cell poisoned") = None;
    }
}

/// Authenticated identity issued by the auth subsystem
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

/// Auth session (token + identity)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: AuthUser,
}

/// Session-change notification
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn(AuthUser),
    SignedOut,
}

/// Auth subsystem interface
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> ClientResult<AuthSession>;
    async fn sign_in(&self, email: &str, password: &str) -> ClientResult<AuthSession>;
    async fn sign_out(&self) -> ClientResult<()>;
    async fn reset_password(&self, email: &str) -> ClientResult<()>;

    /// Adopt a previously persisted session without a network round trip.
    fn restore(&self, session: &AuthSession);

    /// Subscribe to sign-in/sign-out events.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "error_description", alias = "msg")]
    message: Option<String>,
}

/// Network auth client
pub struct AuthClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    token: TokenCell,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthClient {
    pub fn new(config: &ClientConfig, token: TokenCell) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;
        let (events, _) = broadcast::channel(16);
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            token,
            events,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    async fn post_grant(&self, path: &str, body: &PasswordGrant<'_>) -> ClientResult<AuthSession> {
        let response = self
            .client
            .post(self.url(path))
            .header("apikey", &self.api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await?;
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or(text);
            return Err(ClientError::Auth(message));
        }

        let session: AuthSession = response.json().await?;
        self.token.set(&session.access_token);
        let _ = self.events.send(AuthEvent::SignedIn(session.user.clone()));
        Ok(session)
    }
}

#[async_trait]
impl AuthApi for AuthClient {
    async fn sign_up(&self, email: &str, password: &str) -> ClientResult<AuthSession> {
        tracing::debug!(email, "signing up");
        self.post_grant("signup", &PasswordGrant { email, password })
            .await
    }

    async fn sign_in(&self, email: &str, password: &str) -> ClientResult<AuthSession> {
        tracing::debug!(email, "signing in");
        self.post_grant("token?grant_type=password", &PasswordGrant { email, password })
            .await
    }

    async fn sign_out(&self) -> ClientResult<()> {
        let request = self
            .client
            .post(self.url("logout"))
            .header("apikey", &self.api_key);
        let request = match self.token.get() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        // Drop the local session even if the server-side revoke failed.
        self.token.clear();
        let _ = self.events.send(AuthEvent::SignedOut);
        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "remote sign-out failed");
        }
        Ok(())
    }

    async fn reset_password(&self, email: &str) -> ClientResult<()> {
        let response = self
            .client
            .post(self.url("recover"))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await?;
        if !response.status().is_success() {
            let text = response.text().await?;
            return Err(ClientError::Auth(text));
        }
        Ok(())
    }

    fn restore(&self, session: &AuthSession) {
        self.token.set(&session.access_token);
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_cell_is_shared_across_clones() {
        let cell = TokenCell::default();
        let clone = cell.clone();
        cell.set("abc");
        assert_eq!(clone.get().as_deref(), Some("abc"));
        clone.clear();
        assert!(cell.get().is_none());
    }
}
