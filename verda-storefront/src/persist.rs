//! Device persistence
//!
//! Stores keep a JSON snapshot of their state on the device so the app
//! opens with the last known cart/wishlist/session before any network
//! round trip. One file per key under the data directory. Persistence
//! is best-effort: a corrupt or missing file loads as the default, and
//! write failures are logged, never surfaced.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Persisted cart snapshot key.
pub const CART_KEY: &str = "verda.cart";
/// Persisted wishlist snapshot key.
pub const WISHLIST_KEY: &str = "verda.wishlist";
/// Persisted auth session key.
pub const SESSION_KEY: &str = "verda.session";

/// JSON-file key/value storage under a data directory
#[derive(Debug, Clone)]
pub struct DeviceStorage {
    dir: PathBuf,
}

impl DeviceStorage {
    pub fn new(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Load a value, or `None` when the file is missing or unreadable.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path(key);
        let text = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding corrupt device snapshot");
                None
            }
        }
    }

    /// Load a value, falling back to its default.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.load(key).unwrap_or_default()
    }

    /// Write a value. Failures are logged only.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) {
        let path = self.path(key);
        let result = serde_json::to_string(value)
            .map_err(std::io::Error::other)
            .and_then(|text| std::fs::write(&path, text));
        if let Err(e) = result {
            tracing::warn!(key, error = %e, "failed to persist device snapshot");
        }
    }

    /// Delete a key. Missing files are fine.
    pub fn remove(&self, key: &str) {
        let _ = std::fs::remove_file(self.path(key));
    }
}
