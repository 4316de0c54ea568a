//! Client error types
//!
//! The row API reports failures as a JSON body carrying `message`,
//! `code`, `details` and `hint` (Postgres error codes pass through
//! verbatim). The response handler flattens that body into the variant
//! messages below, so callers see `23505: duplicate key value ...`
//! instead of a raw body dump.

use thiserror::Error;

/// Failure talking to the remote data service
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never completed (connect, TLS, timeout)
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered, but not with the promised row shape
    #[error("unexpected response shape: {0}")]
    InvalidResponse(String),

    /// Access token missing, stale or revoked (401)
    #[error("session expired, sign in again")]
    Unauthorized,

    /// The auth subsystem rejected the request
    /// (bad credentials, duplicate sign-up, unknown email)
    #[error("{0}")]
    Auth(String),

    /// Row-level security denied the operation (403)
    #[error("row access denied: {0}")]
    Forbidden(String),

    /// No row matched where exactly one was required
    #[error("no matching row: {0}")]
    NotFound(String),

    /// The filter or write payload was rejected (400)
    #[error("rejected by the row API: {0}")]
    Validation(String),

    /// Unclassified service failure
    #[error("remote service error: {0}")]
    Internal(String),

    /// Row payload would not encode, or a row would not decode
    #[error("row serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
