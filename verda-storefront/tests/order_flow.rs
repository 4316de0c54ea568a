//! Checkout, cancellation and order history.

mod common;

use common::{harness, product, signed_in};
use shared::models::{OrderStatus, PaymentMethod, PaymentStatus};
use verda_storefront::{PlaceOrder, StoreError};

fn checkout(payment_method: PaymentMethod) -> PlaceOrder {
    PlaceOrder {
        address_id: "addr-1".to_string(),
        payment_method,
        delivery_instructions: None,
        estimated_delivery: None,
    }
}

#[tokio::test]
async fn place_order_snapshots_the_cart_and_clears_it() {
    let h = signed_in().await;
    h.cart.add_item(&product("milk", 42.5), 2).await.unwrap();
    h.cart.add_item(&product("rice", 120.0), 1).await.unwrap();
    let totals = h.cart.totals().await;

    let placed = h.orders.place_order(checkout(PaymentMethod::Upi)).await.unwrap();
    assert!(placed.cart_cleared);
    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(placed.order.payment_status, PaymentStatus::Paid);
    assert_eq!(placed.order.subtotal, totals.subtotal);
    assert_eq!(placed.order.delivery_fee, totals.delivery_fee);
    assert_eq!(placed.order.total, totals.total);

    // Cart emptied, one order row, one line per cart line.
    assert!(h.cart.lines().await.is_empty());
    assert_eq!(h.store.rows("orders").len(), 1);
    assert_eq!(h.store.rows("order_items").len(), 2);
    assert_eq!(h.store.rows("notifications").len(), 1);
}

#[tokio::test]
async fn cash_on_delivery_stays_payment_pending() {
    let h = signed_in().await;
    h.cart.add_item(&product("milk", 42.5), 1).await.unwrap();
    let placed = h.orders.place_order(checkout(PaymentMethod::Cod)).await.unwrap();
    assert_eq!(placed.order.payment_status, PaymentStatus::Pending);
}

#[tokio::test]
async fn empty_cart_checkout_performs_no_writes() {
    let h = signed_in().await;
    let writes_before = h.store.writes();

    let err = h.orders.place_order(checkout(PaymentMethod::Upi)).await.unwrap_err();
    assert!(matches!(err, StoreError::EmptyCart));
    assert_eq!(h.store.writes(), writes_before);
    assert!(h.store.rows("orders").is_empty());
}

#[tokio::test]
async fn checkout_requires_a_session() {
    let h = harness().await;
    let err = h.orders.place_order(checkout(PaymentMethod::Upi)).await.unwrap_err();
    assert!(matches!(err, StoreError::Unauthenticated));
}

#[tokio::test]
async fn failed_line_insert_rolls_back_the_order() {
    let h = signed_in().await;
    h.cart.add_item(&product("milk", 42.5), 2).await.unwrap();

    h.store.fail_next_write("order_items");
    let err = h.orders.place_order(checkout(PaymentMethod::Upi)).await.unwrap_err();
    assert!(matches!(err, StoreError::Remote(_)));

    // The compensating delete removed the half-written order.
    assert!(h.store.rows("orders").is_empty());
    assert!(h.store.rows("order_items").is_empty());
    // The cart still holds its lines for a retry.
    assert_eq!(h.cart.lines().await.len(), 1);
}

#[tokio::test]
async fn failed_cart_clear_degrades_but_keeps_the_order() {
    let h = signed_in().await;
    h.cart.add_item(&product("milk", 42.5), 2).await.unwrap();

    // Next cart_items write is the post-checkout clear.
    h.store.fail_next_write("cart_items");
    let placed = h.orders.place_order(checkout(PaymentMethod::Upi)).await.unwrap();
    assert!(!placed.cart_cleared);
    assert_eq!(h.store.rows("orders").len(), 1);
    assert_eq!(h.cart.lines().await.len(), 1);

    // The clear is separately retryable.
    h.cart.clear().await.unwrap();
    assert!(h.cart.lines().await.is_empty());
}

#[tokio::test]
async fn cancellation_is_allowed_from_pending_only() {
    let h = signed_in().await;
    h.cart.add_item(&product("milk", 42.5), 2).await.unwrap();
    let placed = h.orders.place_order(checkout(PaymentMethod::Cod)).await.unwrap();

    let cancelled = h.orders.cancel_order(&placed.order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let err = h.orders.cancel_order(&placed.order.id).await.unwrap_err();
    assert!(matches!(err, StoreError::OrderNotCancellable));

    let err = h.orders.cancel_order("no-such-order").await.unwrap_err();
    assert!(matches!(err, StoreError::OrderNotFound(_)));
}

#[tokio::test]
async fn tracking_projects_status_and_delivery_fields() {
    let h = signed_in().await;
    h.cart.add_item(&product("milk", 42.5), 2).await.unwrap();
    let placed = h.orders.place_order(checkout(PaymentMethod::Upi)).await.unwrap();

    let tracking = h.orders.track_order(&placed.order.id).await.unwrap();
    assert_eq!(tracking.status, OrderStatus::Pending);
    assert!(tracking.delivered_at.is_none());
}

#[tokio::test]
async fn stats_exclude_cancelled_spend() {
    let h = signed_in().await;

    h.cart.add_item(&product("milk", 150.0), 2).await.unwrap();
    let first = h.orders.place_order(checkout(PaymentMethod::Upi)).await.unwrap();

    h.cart.add_item(&product("rice", 120.0), 2).await.unwrap();
    h.orders.place_order(checkout(PaymentMethod::Upi)).await.unwrap();

    h.orders.cancel_order(&first.order.id).await.unwrap();
    h.orders.fetch_orders().await.unwrap();

    let stats = h.orders.order_stats().await;
    assert_eq!(stats.total, 2);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.cancelled, 1);
    assert_eq!(stats.total_spent, 240.0);
}
