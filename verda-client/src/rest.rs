//! Row store client
//!
//! [`RowStore`] is the seam every storefront store is written against;
//! [`RestClient`] is the network implementation over the remote service's
//! REST row API.

use crate::auth::TokenCell;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::query::SelectQuery;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Error body the row API sends on non-success statuses
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    code: Option<String>,
    hint: Option<String>,
}

/// Flatten an error response body to a one-line detail string,
/// `code: message (hint)` when the JSON shape is present, the raw text
/// otherwise.
fn error_detail(text: &str) -> String {
    let Ok(body) = serde_json::from_str::<ApiErrorBody>(text) else {
        return text.to_string();
    };
    let Some(message) = body.message else {
        return text.to_string();
    };
    let mut detail = match body.code {
        Some(code) => format!("{code}: {message}"),
        None => message,
    };
    if let Some(hint) = body.hint {
        detail.push_str(&format!(" ({hint})"));
    }
    detail
}

/// Row-filtered access to the remote service's named collections
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Fetch all rows matching the query.
    async fn select<T: DeserializeOwned + Send>(
        &self,
        table: &str,
        query: SelectQuery,
    ) -> ClientResult<Vec<T>>;

    /// Fetch exactly one row; `NotFound` when nothing matches.
    async fn select_one<T: DeserializeOwned + Send>(
        &self,
        table: &str,
        query: SelectQuery,
    ) -> ClientResult<T> {
        self.select(table, query.limit(1))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::NotFound(table.to_string()))
    }

    /// Insert one or more rows, returning the stored representations.
    async fn insert<T, B>(&self, table: &str, body: &B) -> ClientResult<Vec<T>>
    where
        T: DeserializeOwned + Send,
        B: serde::Serialize + Sync;

    /// Insert a single row and return it.
    async fn insert_one<T, B>(&self, table: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned + Send,
        B: serde::Serialize + Sync,
    {
        self.insert(table, body)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::InvalidResponse(format!("{table}: empty insert response")))
    }

    /// Patch all rows matching the query, returning the updated rows.
    async fn update<T, B>(&self, table: &str, query: SelectQuery, patch: &B) -> ClientResult<Vec<T>>
    where
        T: DeserializeOwned + Send,
        B: serde::Serialize + Sync;

    /// Delete all rows matching the query.
    async fn delete(&self, table: &str, query: SelectQuery) -> ClientResult<()>;
}

/// Network row client
#[derive(Debug, Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    token: TokenCell,
}

impl RestClient {
    pub fn new(config: &ClientConfig, token: TokenCell) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            token,
        })
    }

    pub fn token_cell(&self) -> &TokenCell {
        &self.token
    }

    fn url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        // The anon key doubles as the bearer token before sign-in.
        let bearer = self.token.get().unwrap_or_else(|| self.api_key.clone());
        request
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> ClientResult<T> {
        let status = response.status();
        if !status.is_success() {
            let detail = error_detail(&response.text().await?);
            return match status {
                StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
                StatusCode::FORBIDDEN => Err(ClientError::Forbidden(detail)),
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(detail)),
                StatusCode::BAD_REQUEST => Err(ClientError::Validation(detail)),
                _ => Err(ClientError::Internal(detail)),
            };
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl RowStore for RestClient {
    async fn select<T: DeserializeOwned + Send>(
        &self,
        table: &str,
        query: SelectQuery,
    ) -> ClientResult<Vec<T>> {
        let request = self
            .authed(self.client.get(self.url(table)))
            .query(&query.to_query_pairs());
        let response = request.send().await?;
        self.handle_response(response).await
    }

    async fn insert<T, B>(&self, table: &str, body: &B) -> ClientResult<Vec<T>>
    where
        T: DeserializeOwned + Send,
        B: serde::Serialize + Sync,
    {
        let request = self
            .authed(self.client.post(self.url(table)))
            .header("Prefer", "return=representation")
            .json(body);
        let response = request.send().await?;
        self.handle_response(response).await
    }

    async fn update<T, B>(&self, table: &str, query: SelectQuery, patch: &B) -> ClientResult<Vec<T>>
    where
        T: DeserializeOwned + Send,
        B: serde::Serialize + Sync,
    {
        let request = self
            .authed(self.client.patch(self.url(table)))
            .header("Prefer", "return=representation")
            .query(&query.to_query_pairs())
            .json(patch);
        let response = request.send().await?;
        self.handle_response(response).await
    }

    async fn delete(&self, table: &str, query: SelectQuery) -> ClientResult<()> {
        let request = self
            .authed(self.client.delete(self.url(table)))
            .query(&query.to_query_pairs());
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = error_detail(&response.text().await?);
            return match status {
                StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(detail)),
                _ => Err(ClientError::Internal(detail)),
            };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_detail_flattens_the_api_body() {
        let body = r#"{"code":"23505","message":"duplicate key value violates unique constraint","details":null,"hint":null}"#;
        assert_eq!(
            error_detail(body),
            "23505: duplicate key value violates unique constraint"
        );

        let with_hint = r#"{"message":"column cart_items.qty does not exist","hint":"Perhaps you meant quantity"}"#;
        assert_eq!(
            error_detail(with_hint),
            "column cart_items.qty does not exist (Perhaps you meant quantity)"
        );
    }

    #[test]
    fn error_detail_passes_non_json_through() {
        assert_eq!(error_detail("upstream timed out"), "upstream timed out");
        assert_eq!(error_detail(r#"{"error":"nope"}"#), r#"{"error":"nope"}"#);
    }
}
