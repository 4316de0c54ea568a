//! Order Model
//!
//! Orders snapshot the cart's pricing at placement time and own a set of
//! denormalized order lines that are never mutated afterwards. Only the
//! fulfillment status moves, along the state machine below.

use crate::models::Address;
use crate::serde_util::{f64_from_decimal, opt_f64_from_decimal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fulfillment status
///
/// `pending → {confirmed, cancelled}`, then
/// `confirmed → preparing → out_for_delivery → delivered`.
/// Cancellation is reachable from `pending` only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether the end user may still cancel.
    pub fn can_cancel(self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Whether `next` is a legal transition from this status.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Preparing)
                | (Preparing, OutForDelivery)
                | (OutForDelivery, Delivered)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

/// Payment method (a label only; no gateway integration)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on delivery
    Cod,
    Upi,
    Card,
}

/// Payment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(default)]
    pub order_number: Option<String>,
    pub user_id: String,
    pub address_id: String,
    #[serde(deserialize_with = "f64_from_decimal")]
    pub subtotal: f64,
    #[serde(deserialize_with = "f64_from_decimal")]
    pub delivery_fee: f64,
    #[serde(deserialize_with = "f64_from_decimal")]
    pub discount: f64,
    #[serde(deserialize_with = "f64_from_decimal")]
    pub total: f64,
    #[serde(default)]
    pub coupon_code: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    #[serde(default)]
    pub delivery_instructions: Option<String>,
    #[serde(default)]
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Embedded address (present when the query joins `addresses`)
    #[serde(default)]
    pub address: Option<Address>,
    /// Embedded lines (present on detail fetches)
    #[serde(default)]
    pub order_items: Option<Vec<OrderLine>>,
}

/// Insert payload for `orders`
#[derive(Debug, Clone, Serialize)]
pub struct OrderInsert {
    pub user_id: String,
    pub address_id: String,
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub discount: f64,
    pub total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// Order line — immutable denormalized copy of a cart line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: String,
    #[serde(default)]
    pub order_id: Option<String>,
    pub product_id: String,
    pub product_name: String,
    #[serde(default)]
    pub product_image: Option<String>,
    pub quantity: i32,
    #[serde(deserialize_with = "f64_from_decimal")]
    pub unit_price: f64,
    #[serde(deserialize_with = "f64_from_decimal")]
    pub total_price: f64,
}

/// Insert payload for `order_items`
#[derive(Debug, Clone, Serialize)]
pub struct OrderLineInsert {
    pub order_id: String,
    pub product_id: String,
    pub product_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_image: Option<String>,
    pub quantity: i32,
    pub unit_price: f64,
    pub total_price: f64,
}

/// Narrow projection used by order tracking
#[derive(Debug, Clone, Deserialize)]
pub struct OrderTracking {
    pub status: OrderStatus,
    #[serde(default)]
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
}

/// Client-side aggregation over a user's order history
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderStats {
    pub total: usize,
    pub pending: usize,
    pub delivered: usize,
    pub cancelled: usize,
    /// Total spend across non-cancelled orders
    pub total_spent: f64,
}
