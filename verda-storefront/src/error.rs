//! Store error types

use thiserror::Error;
use verda_client::ClientError;

/// Store error type
#[derive(Debug, Error)]
pub enum StoreError {
    /// Operation requires a signed-in user
    #[error("Not signed in")]
    Unauthenticated,

    /// Checkout attempted with an empty cart
    #[error("Cart is empty")]
    EmptyCart,

    /// Requested quantity exceeds the per-order ceiling
    #[error("Maximum {max} per order")]
    QuantityExceedsOrderLimit { max: i32 },

    /// Requested quantity exceeds available stock
    #[error("Only {available} in stock")]
    InsufficientStock { available: i32 },

    /// No cart line with the given id
    #[error("Cart line not found: {0}")]
    LineNotFound(String),

    /// No active coupon with the given code
    #[error("Invalid coupon code: {0}")]
    CouponNotFound(String),

    /// Coupon validity window has not opened yet
    #[error("Coupon is not active yet")]
    CouponNotYetActive,

    /// Coupon validity window has closed
    #[error("Coupon has expired")]
    CouponExpired,

    /// Cart subtotal below the coupon's minimum order value
    #[error("Minimum order of {min} required")]
    MinimumOrderNotMet { min: f64 },

    /// No order with the given id for this user
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Order is past the point where the user may cancel
    #[error("Order can no longer be cancelled")]
    OrderNotCancellable,

    /// Remote service failure
    #[error(transparent)]
    Remote(#[from] ClientError),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
