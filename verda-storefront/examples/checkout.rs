//! End-to-end checkout walkthrough over the in-process clients.
//!
//! ```bash
//! cargo run -p verda-storefront --example checkout
//! ```

use anyhow::Result;
use shared::models::{Coupon, DiscountType, PaymentMethod, Product};
use std::sync::Arc;
use verda_client::{LocalAuth, LocalStore};
use verda_storefront::{CartLedger, DeviceStorage, OrderLedger, PlaceOrder, SessionContext};

fn product(id: &str, name: &str, price: f64) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        slug: id.to_string(),
        description: None,
        brand: None,
        price,
        mrp: price,
        discount_percentage: None,
        image_url: None,
        unit: "1 pc".to_string(),
        is_available: true,
        quantity_available: 50,
        max_order_qty: 10,
        category_id: None,
        category: None,
        is_featured: false,
        is_bestseller: false,
        created_at: None,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let dir = tempfile::tempdir()?;
    let storage = Arc::new(DeviceStorage::new(dir.path())?);
    let store = Arc::new(LocalStore::new());
    let auth = Arc::new(LocalAuth::new());

    store.seed(
        "offers",
        &[Coupon {
            id: "offer-1".to_string(),
            coupon_code: "FRESH50".to_string(),
            title: Some("Flat 50 off".to_string()),
            discount_type: DiscountType::Flat,
            discount_value: 50.0,
            max_discount: None,
            min_order_value: Some(150.0),
            start_date: None,
            end_date: None,
            is_active: true,
            display_order: 1,
        }],
    );

    let context = SessionContext::new(Arc::clone(&auth), Arc::clone(&store), Arc::clone(&storage));
    context.initialize().await?;
    context
        .sign_up("demo@example.com", "secret", Some("Demo Shopper"))
        .await?;

    let session = context.session();
    let cart = Arc::new(CartLedger::new(
        Arc::clone(&store),
        session.clone(),
        Arc::clone(&storage),
    ));
    let orders = OrderLedger::new(Arc::clone(&store), session, Arc::clone(&cart));

    cart.add_item(&product("milk", "Whole Milk", 42.5), 2).await?;
    cart.add_item(&product("rice", "Basmati Rice 1kg", 120.0), 1).await?;
    let totals = cart.apply_coupon("fresh50").await?;
    println!(
        "cart: {} items, subtotal {:.2}, delivery {:.2}, discount {:.2}, total {:.2}",
        totals.total_items, totals.subtotal, totals.delivery_fee, totals.discount, totals.total
    );

    let placed = orders
        .place_order(PlaceOrder {
            address_id: "addr-1".to_string(),
            payment_method: PaymentMethod::Upi,
            delivery_instructions: Some("Leave at the door".to_string()),
            estimated_delivery: None,
        })
        .await?;
    println!(
        "order {} placed, total {:.2}, cart cleared: {}",
        placed.order.id, placed.order.total, placed.cart_cleared
    );

    let tracking = orders.track_order(&placed.order.id).await?;
    println!("status: {:?}", tracking.status);
    Ok(())
}
