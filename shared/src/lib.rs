//! Shared types for the Verda storefront
//!
//! Domain models and serde boundary helpers used by both the
//! remote-service client and the storefront stores.

pub mod models;
pub mod serde_util;

// Re-exports
pub use serde::{Deserialize, Serialize};
