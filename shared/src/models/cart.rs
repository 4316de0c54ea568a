//! Cart Model
//!
//! A cart line denormalizes the product display fields at add time.
//! Totals are derived state: recomputed from scratch after every cart
//! mutation, never stored remotely.

use crate::models::Product;
use crate::serde_util::f64_from_decimal;
use serde::{Deserialize, Serialize};

/// Free delivery kicks in at this subtotal.
pub const FREE_DELIVERY_THRESHOLD: f64 = 199.0;
/// Flat delivery fee below the threshold.
pub const DELIVERY_FEE: f64 = 40.0;

/// A single cart entry pairing a product with a quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Remote `cart_items` row id
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub slug: String,
    pub price: f64,
    pub mrp: f64,
    pub discount_percentage: f64,
    pub image: Option<String>,
    pub unit: String,
    pub quantity: i32,
    pub is_available: bool,
    pub quantity_available: i32,
    pub max_order_qty: i32,
}

impl CartLine {
    /// Build a line from a product, snapshotting its display fields.
    pub fn from_product(id: impl Into<String>, product: &Product, quantity: i32) -> Self {
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
            quantity,
            is_available: product.is_available,
            quantity_available: product.quantity_available,
            max_order_qty: product.max_order_qty,
        }
    }

    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

/// Remote `cart_items` row with the joined product
#[derive(Debug, Clone, Deserialize)]
pub struct CartItemRow {
    pub id: String,
    pub quantity: i32,
    pub product: Product,
}

impl CartItemRow {
    /// Collapse the joined row into a denormalized cart line.
    pub fn into_line(self) -> CartLine {
        let mut line = CartLine::from_product(self.id, &self.product, self.quantity);
        line.product_id = self.product.id;
        line
    }
}

/// Insert payload for `cart_items`
#[derive(Debug, Clone, Serialize)]
pub struct CartItemInsert {
    pub user_id: String,
    pub product_id: String,
    pub quantity: i32,
}

/// Update payload for `cart_items`
#[derive(Debug, Clone, Serialize)]
pub struct CartItemUpdate {
    pub quantity: i32,
}

/// Derived cart totals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CartTotals {
    pub total_items: i32,
    #[serde(deserialize_with = "f64_from_decimal")]
    pub subtotal: f64,
    #[serde(deserialize_with = "f64_from_decimal")]
    pub discount: f64,
    #[serde(deserialize_with = "f64_from_decimal")]
    pub delivery_fee: f64,
    #[serde(deserialize_with = "f64_from_decimal")]
    pub total: f64,
}

impl CartTotals {
    /// Pure recomputation over the current lines and active discount.
    ///
    /// `total` is floored at zero so a discount larger than the order
    /// never produces a negative amount due.
    pub fn compute(lines: &[CartLine], discount: f64) -> Self {
        let subtotal: f64 = lines.iter().map(CartLine::line_total).sum();
        let total_items: i32 = lines.iter().map(|l| l.quantity).sum();
        let delivery_fee = if subtotal >= FREE_DELIVERY_THRESHOLD {
            0.0
        } else {
            DELIVERY_FEE
        };
        Self {
            total_items,
            subtotal,
            discount,
            delivery_fee,
            total: (subtotal + delivery_fee - discount).max(0.0),
        }
    }
}
