//! Wishlist Set
//!
//! A per-user set of bookmarked products, unique per (user, product).
//! The local cache mirrors the remote rows after every successful call
//! and is snapshotted to device storage.

use crate::error::StoreResult;
use crate::persist::{DeviceStorage, WISHLIST_KEY};
use crate::session::Session;
use serde::Deserialize;
use shared::models::{Product, WishlistEntry, WishlistInsert, WishlistRow};
use std::sync::Arc;
use tokio::sync::RwLock;
use verda_client::{RowStore, SelectQuery};

const WISHLIST_SELECT: &str = "*, product:products(*)";

/// Freshly inserted `wishlist` row
#[derive(Debug, Deserialize)]
struct WishlistCreated {
    id: String,
    #[serde(default)]
    created_at: Option<String>,
}

/// Wishlist store
pub struct WishlistSet<R> {
    rows: Arc<R>,
    session: Session,
    storage: Arc<DeviceStorage>,
    entries: RwLock<Vec<WishlistEntry>>,
}

impl<R: RowStore> WishlistSet<R> {
    pub fn new(rows: Arc<R>, session: Session, storage: Arc<DeviceStorage>) -> Self {
        let entries: Vec<WishlistEntry> = storage.load_or_default(WISHLIST_KEY);
        Self {
            rows,
            session,
            storage,
            entries: RwLock::new(entries),
        }
    }

    /// Re-read the remote wishlist and replace the local entries.
    pub async fn fetch(&self) -> StoreResult<Vec<WishlistEntry>> {
        let user_id = self.session.require_user_id().await?;
        let rows: Vec<WishlistRow> = self
            .rows
            .select(
                "wishlist",
                SelectQuery::new()
                    .select(WISHLIST_SELECT)
                    .eq("user_id", &user_id)
                    .order_by("created_at", false),
            )
            .await?;
        let fetched: Vec<WishlistEntry> = rows.into_iter().map(WishlistRow::into_entry).collect();

        let mut entries = self.entries.write().await;
        *entries = fetched.clone();
        self.persist(&entries);
        Ok(fetched)
    }

    /// Add a product. Returns `false` without a remote write when the
    /// product is already bookmarked.
    pub async fn add(&self, product: &Product) -> StoreResult<bool> {
        let user_id = self.session.require_user_id().await?;
        if self.contains(&product.id).await {
            return Ok(false);
        }

        let insert = WishlistInsert {
            user_id,
            product_id: product.id.clone(),
        };
        let created: WishlistCreated = self.rows.insert_one("wishlist", &insert).await?;

        let mut entries = self.entries.write().await;
        entries.insert(
            0,
            WishlistEntry::from_product(created.id, product, created.created_at),
        );
        self.persist(&entries);
        Ok(true)
    }

    pub async fn remove(&self, entry_id: &str) -> StoreResult<()> {
        self.rows
            .delete("wishlist", SelectQuery::new().eq("id", entry_id))
            .await?;

        let mut entries = self.entries.write().await;
        entries.retain(|e| e.id != entry_id);
        self.persist(&entries);
        Ok(())
    }

    pub async fn remove_by_product(&self, product_id: &str) -> StoreResult<()> {
        let user_id = self.session.require_user_id().await?;
        self.rows
            .delete(
                "wishlist",
                SelectQuery::new()
                    .eq("user_id", &user_id)
                    .eq("product_id", product_id),
            )
            .await?;

        let mut entries = self.entries.write().await;
        entries.retain(|e| e.product_id != product_id);
        self.persist(&entries);
        Ok(())
    }

    /// Flip a product's bookmark. Returns `true` when the product ends
    /// up in the wishlist.
    pub async fn toggle(&self, product: &Product) -> StoreResult<bool> {
        if self.contains(&product.id).await {
            self.remove_by_product(&product.id).await?;
            Ok(false)
        } else {
            self.add(product).await?;
            Ok(true)
        }
    }

    pub async fn clear(&self) -> StoreResult<()> {
        let user_id = self.session.require_user_id().await?;
        self.rows
            .delete("wishlist", SelectQuery::new().eq("user_id", &user_id))
            .await?;

        let mut entries = self.entries.write().await;
        entries.clear();
        self.persist(&entries);
        Ok(())
    }

    pub async fn contains(&self, product_id: &str) -> bool {
        self.entries
            .read()
            .await
            .iter()
            .any(|e| e.product_id == product_id)
    }

    pub async fn entry_for(&self, product_id: &str) -> Option<WishlistEntry> {
        self.entries
            .read()
            .await
            .iter()
            .find(|e| e.product_id == product_id)
            .cloned()
    }

    pub async fn entries(&self) -> Vec<WishlistEntry> {
        self.entries.read().await.clone()
    }

    fn persist(&self, entries: &[WishlistEntry]) {
        self.storage.save(WISHLIST_KEY, &entries);
    }
}
