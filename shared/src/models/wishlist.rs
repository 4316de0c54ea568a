//! Wishlist Model

use crate::models::Product;
use serde::{Deserialize, Serialize};

/// Wishlist entry — denormalized product bookmark, unique per
/// (user, product)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishlistEntry {
    /// Remote `wishlist` row id
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub slug: String,
    pub price: f64,
    pub mrp: f64,
    pub discount_percentage: f64,
    pub image: Option<String>,
    pub unit: String,
    pub is_available: bool,
    pub quantity_available: i32,
    pub brand: Option<String>,
    pub added_at: Option<String>,
}

impl WishlistEntry {
    pub fn from_product(
        id: impl Into<String>,
        product: &Product,
        added_at: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            product_id: product.id.clone(),
            name: product.name.clone(),
            slug: product.slug.clone(),
            price: product.price,
            mrp: product.mrp,
            discount_percentage: product.effective_discount_percentage(),
            image: product.image_url.clone(),
            unit: product.unit.clone(),
            is_available: product.is_available,
            quantity_available: product.quantity_available,
            brand: product.brand.clone(),
            added_at,
        }
    }
}

/// Remote `wishlist` row with the joined product
#[derive(Debug, Clone, Deserialize)]
pub struct WishlistRow {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    pub product: Product,
}

impl WishlistRow {
    pub fn into_entry(self) -> WishlistEntry {
        WishlistEntry::from_product(self.id, &self.product, self.created_at)
    }
}

/// Insert payload for `wishlist`
#[derive(Debug, Clone, Serialize)]
pub struct WishlistInsert {
    pub user_id: String,
    pub product_id: String,
}
