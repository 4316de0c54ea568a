//! Product Model

use crate::serde_util::{f64_from_decimal, opt_f64_from_decimal};
use serde::{Deserialize, Serialize};

/// Category reference embedded in product rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: String,
    pub name: String,
    pub slug: String,
}

/// Product entity
///
/// Invariant: `price <= mrp`. The stored discount percentage is optional;
/// use [`Product::effective_discount_percentage`] to get a display value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// URL key
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    /// Selling price
    #[serde(deserialize_with = "f64_from_decimal")]
    pub price: f64,
    /// List price before discount
    #[serde(deserialize_with = "f64_from_decimal")]
    pub mrp: f64,
    #[serde(default, deserialize_with = "opt_f64_from_decimal")]
    pub discount_percentage: Option<f64>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Unit label (e.g. "500 g", "1 L")
    pub unit: String,
    pub is_available: bool,
    pub quantity_available: i32,
    pub max_order_qty: i32,
    #[serde(default)]
    pub category_id: Option<String>,
    /// Embedded category (present when the query joins `categories`)
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_bestseller: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Product {
    /// Discount percentage for display, derived from price/MRP when the
    /// row does not carry one.
    pub fn effective_discount_percentage(&self) -> f64 {
        match self.discount_percentage {
            Some(p) => p,
            None if self.mrp > 0.0 => ((self.mrp - self.price) / self.mrp * 100.0).round(),
            None => 0.0,
        }
    }
}
