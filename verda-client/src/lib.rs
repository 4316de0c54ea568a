//! Verda Client - client for the hosted Remote Data Service
//!
//! Provides row-filtered select/insert/update/delete against named
//! collections, the auth session lifecycle, and blob storage access.
//! The [`RowStore`] and [`AuthApi`] traits have a network implementation
//! ([`RestClient`] / [`AuthClient`]) and an in-process one
//! ([`LocalStore`] / [`LocalAuth`]) used by tests and demos.

pub mod auth;
pub mod config;
pub mod error;
pub mod local;
pub mod query;
pub mod rest;
pub mod storage;

pub use auth::{AuthApi, AuthClient, AuthEvent, AuthSession, AuthUser, TokenCell};
pub use config::{ClientConfig, RemoteService};
pub use error::{ClientError, ClientResult};
pub use local::{LocalAuth, LocalStore};
pub use query::SelectQuery;
pub use rest::{RestClient, RowStore};
pub use storage::StorageClient;
