//! Verda Storefront - client-side stores for the Verda grocery app
//!
//! The stores hold the app's working state (session, catalog, cart,
//! wishlist, orders) behind `tokio::sync::RwLock` and talk to the remote
//! service through the `verda-client` seams. Every store takes its
//! clients by injection, so the in-process implementations plug in for
//! tests and demos.

pub mod cart;
pub mod catalog;
pub mod error;
pub mod orders;
pub mod persist;
pub mod session;
pub mod wishlist;

pub use cart::CartLedger;
pub use catalog::{CatalogCache, ProductQuery};
pub use error::{StoreError, StoreResult};
pub use orders::{OrderLedger, PlaceOrder, PlacedOrder};
pub use persist::DeviceStorage;
pub use session::{Session, SessionContext};
pub use wishlist::WishlistSet;
