//! Data models
//!
//! Shared between the remote-service client and the storefront stores.
//! Entity structs mirror remote rows; `*Insert` / `*Update` structs are
//! write payloads. All IDs are `String` (remote UUIDs).

pub mod address;
pub mod cart;
pub mod category;
pub mod coupon;
pub mod notification;
pub mod order;
pub mod product;
pub mod profile;
pub mod wishlist;

// Re-exports
pub use address::*;
pub use cart::*;
pub use category::*;
pub use coupon::*;
pub use notification::*;
pub use order::*;
pub use product::*;
pub use profile::*;
pub use wishlist::*;
