#![allow(dead_code)]

use shared::models::{Coupon, DiscountType, Product};
use std::sync::Arc;
use tempfile::TempDir;
use verda_client::{LocalAuth, LocalStore};
use verda_storefront::{
    CartLedger, CatalogCache, DeviceStorage, OrderLedger, SessionContext, WishlistSet,
};

pub struct Harness {
    pub store: Arc<LocalStore>,
    pub auth: Arc<LocalAuth>,
    pub storage: Arc<DeviceStorage>,
    pub context: SessionContext<LocalAuth, LocalStore>,
    pub cart: Arc<CartLedger<LocalStore>>,
    pub wishlist: WishlistSet<LocalStore>,
    pub orders: OrderLedger<LocalStore>,
    pub catalog: CatalogCache<LocalStore>,
    _dir: TempDir,
}

/// Fresh stores over in-process clients, nobody signed in.
pub async fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(DeviceStorage::new(dir.path()).unwrap());
    let store = Arc::new(LocalStore::new());
    let auth = Arc::new(LocalAuth::new());

    let context = SessionContext::new(Arc::clone(&auth), Arc::clone(&store), Arc::clone(&storage));
    context.initialize().await.unwrap();
    let session = context.session();

    let cart = Arc::new(CartLedger::new(
        Arc::clone(&store),
        session.clone(),
        Arc::clone(&storage),
    ));
    let wishlist = WishlistSet::new(Arc::clone(&store), session.clone(), Arc::clone(&storage));
    let orders = OrderLedger::new(Arc::clone(&store), session, Arc::clone(&cart));
    let catalog = CatalogCache::new(Arc::clone(&store));

    Harness {
        store,
        auth,
        storage,
        context,
        cart,
        wishlist,
        orders,
        catalog,
        _dir: dir,
    }
}

/// Harness with a signed-up shopper.
pub async fn signed_in() -> Harness {
    let h = harness().await;
    h.context
        .sign_up("shopper@example.com", "secret", Some("Test Shopper"))
        .await
        .unwrap();
    h
}

pub fn product(id: &str, price: f64) -> Product {
    Product {
        id: id.to_string(),
        name: format!("Product {id}"),
        slug: format!("product-{id}"),
        description: None,
        brand: None,
        price,
        mrp: price,
        discount_percentage: None,
        image_url: None,
        unit: "1 pc".to_string(),
        is_available: true,
        quantity_available: 100,
        max_order_qty: 10,
        category_id: None,
        category: None,
        is_featured: false,
        is_bestseller: false,
        created_at: None,
    }
}

pub fn coupon(code: &str, discount_type: DiscountType, value: f64) -> Coupon {
    Coupon {
        id: format!("coupon-{code}"),
        coupon_code: code.to_string(),
        title: None,
        discount_type,
        discount_value: value,
        max_discount: None,
        min_order_value: None,
        start_date: None,
        end_date: None,
        is_active: true,
        display_order: 0,
    }
}
