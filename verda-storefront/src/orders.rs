//! Order Ledger
//!
//! Checkout and order history. Placing an order snapshots the Cart
//! Ledger's pricing into an `orders` row plus denormalized `order_items`
//! rows; the remote store has no cross-call transactions, so a failed
//! line insert is compensated by deleting the freshly created order.

use crate::cart::CartLedger;
use crate::error::{StoreError, StoreResult};
use crate::session::Session;
use chrono::{DateTime, Utc};
use shared::models::{
    CartLine, NotificationCreate, Order, OrderInsert, OrderLineInsert, OrderStats, OrderStatus,
    OrderTracking, PaymentMethod, PaymentStatus,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use verda_client::{ClientError, RowStore, SelectQuery};

/// Projection joining the delivery address and the order lines.
const ORDER_SELECT: &str = "*, address:addresses(*), order_items(*)";

/// Checkout request
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub address_id: String,
    pub payment_method: PaymentMethod,
    pub delivery_instructions: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// Checkout outcome
///
/// `cart_cleared` is `false` when the order was stored but emptying the
/// cart failed; the order stands and the cart clear can be retried.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    pub cart_cleared: bool,
}

/// Order store
pub struct OrderLedger<R> {
    rows: Arc<R>,
    session: Session,
    cart: Arc<CartLedger<R>>,
    orders: RwLock<Vec<Order>>,
}

impl<R: RowStore> OrderLedger<R> {
    pub fn new(rows: Arc<R>, session: Session, cart: Arc<CartLedger<R>>) -> Self {
        Self {
            rows,
            session,
            cart,
            orders: RwLock::new(Vec::new()),
        }
    }

    /// Place an order from the current cart.
    pub async fn place_order(&self, request: PlaceOrder) -> StoreResult<PlacedOrder> {
        let user_id = self.session.require_user_id().await?;
        let lines = self.cart.lines().await;
        if lines.is_empty() {
            return Err(StoreError::EmptyCart);
        }
        let totals = self.cart.totals().await;
        let coupon_code = self.cart.coupon_code().await;

        // Payment is a label only: anything but cash on delivery is
        // recorded as already paid.
        let payment_status = match request.payment_method {
            PaymentMethod::Cod => PaymentStatus::Pending,
            _ => PaymentStatus::Paid,
        };

        let insert = OrderInsert {
            user_id: user_id.clone(),
            address_id: request.address_id,
            subtotal: totals.subtotal,
            delivery_fee: totals.delivery_fee,
            discount: totals.discount,
            total: totals.total,
            coupon_code,
            payment_method: request.payment_method,
            payment_status,
            status: OrderStatus::Pending,
            delivery_instructions: request.delivery_instructions,
            estimated_delivery: request.estimated_delivery,
        };
        let order: Order = self.rows.insert_one("orders", &insert).await?;
        tracing::info!(order_id = %order.id, total = order.total, "order created");

        let line_inserts: Vec<OrderLineInsert> = lines
            .iter()
            .map(|line| order_line(&order.id, line))
            .collect();
        if let Err(e) = self
            .rows
            .insert::<serde_json::Value, _>("order_items", &line_inserts)
            .await
        {
            // No transaction on the remote side; take back the order row
            // so a half-written order never surfaces in history.
            tracing::warn!(order_id = %order.id, error = %e, "order line insert failed, rolling back order");
            if let Err(del) = self
                .rows
                .delete("orders", SelectQuery::new().eq("id", &order.id))
                .await
            {
                tracing::error!(order_id = %order.id, error = %del, "orphan order row could not be removed");
            }
            return Err(e.into());
        }

        let cart_cleared = match self.cart.clear().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "cart clear failed after checkout");
                false
            }
        };

        let notification = NotificationCreate {
            user_id,
            title: "Order placed".to_string(),
            message: format!("Your order of \u{20b9}{:.2} is confirmed", order.total),
            kind: "order".to_string(),
            data: Some(serde_json::json!({ "order_id": order.id })),
        };
        if let Err(e) = self
            .rows
            .insert::<serde_json::Value, _>("notifications", &notification)
            .await
        {
            tracing::debug!(error = %e, "order notification not stored");
        }

        self.orders.write().await.insert(0, order.clone());
        Ok(PlacedOrder { order, cart_cleared })
    }

    /// Cancel a pending order.
    pub async fn cancel_order(&self, order_id: &str) -> StoreResult<Order> {
        let order = self.fetch_order_by_id(order_id).await?;
        if !order.status.can_cancel() {
            return Err(StoreError::OrderNotCancellable);
        }

        let updated: Order = self
            .rows
            .update(
                "orders",
                SelectQuery::new().eq("id", order_id),
                &serde_json::json!({ "status": OrderStatus::Cancelled }),
            )
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::OrderNotFound(order_id.to_string()))?;

        let mut orders = self.orders.write().await;
        if let Some(local) = orders.iter_mut().find(|o| o.id == order_id) {
            local.status = OrderStatus::Cancelled;
        }
        Ok(updated)
    }

    /// Re-read the user's order history, newest first.
    pub async fn fetch_orders(&self) -> StoreResult<Vec<Order>> {
        let user_id = self.session.require_user_id().await?;
        let fetched: Vec<Order> = self
            .rows
            .select(
                "orders",
                SelectQuery::new()
                    .select(ORDER_SELECT)
                    .eq("user_id", &user_id)
                    .order_by("created_at", false),
            )
            .await?;
        *self.orders.write().await = fetched.clone();
        Ok(fetched)
    }

    /// Fetch one order with its address and lines.
    pub async fn fetch_order_by_id(&self, order_id: &str) -> StoreResult<Order> {
        let user_id = self.session.require_user_id().await?;
        self.rows
            .select_one(
                "orders",
                SelectQuery::new()
                    .select(ORDER_SELECT)
                    .eq("id", order_id)
                    .eq("user_id", &user_id),
            )
            .await
            .map_err(|e| match e {
                ClientError::NotFound(_) => StoreError::OrderNotFound(order_id.to_string()),
                other => StoreError::Remote(other),
            })
    }

    /// Narrow status/delivery projection for the tracking screen.
    pub async fn track_order(&self, order_id: &str) -> StoreResult<OrderTracking> {
        let user_id = self.session.require_user_id().await?;
        self.rows
            .select_one(
                "orders",
                SelectQuery::new()
                    .select("status, estimated_delivery, delivered_at")
                    .eq("id", order_id)
                    .eq("user_id", &user_id),
            )
            .await
            .map_err(|e| match e {
                ClientError::NotFound(_) => StoreError::OrderNotFound(order_id.to_string()),
                other => StoreError::Remote(other),
            })
    }

    /// Aggregate the cached order history.
    pub async fn order_stats(&self) -> OrderStats {
        let orders = self.orders.read().await;
        let mut stats = OrderStats {
            total: orders.len(),
            ..Default::default()
        };
        for order in orders.iter() {
            match order.status {
                OrderStatus::Pending => stats.pending += 1,
                OrderStatus::Delivered => stats.delivered += 1,
                OrderStatus::Cancelled => stats.cancelled += 1,
                _ => {}
            }
            if order.status != OrderStatus::Cancelled {
                stats.total_spent += order.total;
            }
        }
        stats
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.orders.read().await.clone()
    }
}

fn order_line(order_id: &str, line: &CartLine) -> OrderLineInsert {
    OrderLineInsert {
        order_id: order_id.to_string(),
        product_id: line.product_id.clone(),
        product_name: line.name.clone(),
        product_image: line.image.clone(),
        quantity: line.quantity,
        unit_price: line.price,
        total_price: line.line_total(),
    }
}
