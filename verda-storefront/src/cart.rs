//! Cart Ledger
//!
//! Holds the cart lines, the applied coupon discount and the derived
//! totals. Every mutation completes its remote write before touching
//! local state and recomputes the totals from scratch afterwards, so a
//! failed remote call never leaves the cart half-updated.

use crate::error::{StoreError, StoreResult};
use crate::persist::{CART_KEY, DeviceStorage};
use crate::session::Session;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::models::{
    CartItemInsert, CartItemRow, CartItemUpdate, CartLine, CartTotals, Coupon, CouponValidity,
    Product,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use verda_client::{RowStore, SelectQuery};

/// Projection joining the full product snapshot onto each line.
const CART_SELECT: &str = "*, product:products(*)";

#[derive(Debug, Default, Serialize, Deserialize)]
struct CartState {
    lines: Vec<CartLine>,
    discount: f64,
    coupon_code: Option<String>,
    #[serde(skip)]
    totals: CartTotals,
}

impl CartState {
    fn recompute(&mut self) {
        self.totals = CartTotals::compute(&self.lines, self.discount);
    }
}

/// Freshly inserted `cart_items` row (no join on the write path)
#[derive(Debug, Deserialize)]
struct CartItemCreated {
    id: String,
}

/// Cart store
pub struct CartLedger<R> {
    rows: Arc<R>,
    session: Session,
    storage: Arc<DeviceStorage>,
    state: RwLock<CartState>,
}

impl<R: RowStore> CartLedger<R> {
    /// Build the ledger, restoring the persisted snapshot.
    pub fn new(rows: Arc<R>, session: Session, storage: Arc<DeviceStorage>) -> Self {
        let mut state: CartState = storage.load_or_default(CART_KEY);
        state.recompute();
        Self {
            rows,
            session,
            storage,
            state: RwLock::new(state),
        }
    }

    /// Re-read the remote cart rows and replace the local lines.
    pub async fn fetch(&self) -> StoreResult<Vec<CartLine>> {
        let user_id = self.session.require_user_id().await?;
        let rows: Vec<CartItemRow> = self
            .rows
            .select(
                "cart_items",
                SelectQuery::new()
                    .select(CART_SELECT)
                    .eq("user_id", &user_id)
                    .order_by("created_at", true),
            )
            .await?;
        let lines: Vec<CartLine> = rows.into_iter().map(CartItemRow::into_line).collect();

        let mut state = self.state.write().await;
        state.lines = lines.clone();
        state.recompute();
        self.persist(&state);
        Ok(lines)
    }

    /// Add a product to the cart. An existing line for the product gets
    /// its quantity bumped instead of a second line.
    pub async fn add_item(&self, product: &Product, quantity: i32) -> StoreResult<CartTotals> {
        let user_id = self.session.require_user_id().await?;

        let existing = {
            let state = self.state.read().await;
            state
                .lines
                .iter()
                .find(|l| l.product_id == product.id)
                .map(|l| (l.id.clone(), l.quantity))
        };
        if let Some((line_id, current)) = existing {
            return self.set_quantity(&line_id, current + quantity).await;
        }

        // Lines always carry a quantity of at least one; a non-positive
        // first add has nothing to create.
        if quantity < 1 {
            return Ok(self.totals().await);
        }

        check_ceilings(quantity, product.max_order_qty, product.quantity_available)?;

        let insert = CartItemInsert {
            user_id,
            product_id: product.id.clone(),
            quantity,
        };
        let created: CartItemCreated = self.rows.insert_one("cart_items", &insert).await?;
        tracing::debug!(product = %product.slug, quantity, "cart line added");

        let mut state = self.state.write().await;
        state
            .lines
            .push(CartLine::from_product(created.id, product, quantity));
        state.recompute();
        self.persist(&state);
        Ok(state.totals)
    }

    /// Set a line's quantity. Zero or less removes the line; quantities
    /// above the per-order ceiling or the available stock fail without
    /// touching local state.
    pub async fn set_quantity(&self, line_id: &str, quantity: i32) -> StoreResult<CartTotals> {
        if quantity < 1 {
            return self.remove_item(line_id).await;
        }

        {
            let state = self.state.read().await;
            let line = state
                .lines
                .iter()
                .find(|l| l.id == line_id)
                .ok_or_else(|| StoreError::LineNotFound(line_id.to_string()))?;
            check_ceilings(quantity, line.max_order_qty, line.quantity_available)?;
        }

        self.rows
            .update::<serde_json::Value, _>(
                "cart_items",
                SelectQuery::new().eq("id", line_id),
                &CartItemUpdate { quantity },
            )
            .await?;

        let mut state = self.state.write().await;
        if let Some(line) = state.lines.iter_mut().find(|l| l.id == line_id) {
            line.quantity = quantity;
        }
        state.recompute();
        self.persist(&state);
        Ok(state.totals)
    }

    pub async fn remove_item(&self, line_id: &str) -> StoreResult<CartTotals> {
        {
            let state = self.state.read().await;
            if !state.lines.iter().any(|l| l.id == line_id) {
                return Err(StoreError::LineNotFound(line_id.to_string()));
            }
        }

        self.rows
            .delete("cart_items", SelectQuery::new().eq("id", line_id))
            .await?;

        let mut state = self.state.write().await;
        state.lines.retain(|l| l.id != line_id);
        state.recompute();
        self.persist(&state);
        Ok(state.totals)
    }

    /// Empty the cart, dropping any applied coupon.
    pub async fn clear(&self) -> StoreResult<()> {
        let user_id = self.session.require_user_id().await?;
        self.rows
            .delete("cart_items", SelectQuery::new().eq("user_id", &user_id))
            .await?;

        let mut state = self.state.write().await;
        state.lines.clear();
        state.discount = 0.0;
        state.coupon_code = None;
        state.recompute();
        self.persist(&state);
        Ok(())
    }

    /// Look up an active coupon by code and apply its discount,
    /// replacing any previously applied coupon. Failed validation leaves
    /// the prior discount in place.
    pub async fn apply_coupon(&self, code: &str) -> StoreResult<CartTotals> {
        let code = code.trim().to_uppercase();
        let coupon: Coupon = self
            .rows
            .select(
                "offers",
                SelectQuery::new()
                    .eq("coupon_code", &code)
                    .eq("is_active", true),
            )
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::CouponNotFound(code.clone()))?;

        match coupon.validity(Utc::now()) {
            CouponValidity::Valid => {}
            CouponValidity::NotYetActive => return Err(StoreError::CouponNotYetActive),
            CouponValidity::Expired => return Err(StoreError::CouponExpired),
        }

        let mut state = self.state.write().await;
        let subtotal = CartTotals::compute(&state.lines, 0.0).subtotal;
        if let Some(min) = coupon.min_order_value {
            if subtotal < min {
                return Err(StoreError::MinimumOrderNotMet { min });
            }
        }

        state.discount = coupon.discount_for(subtotal);
        state.coupon_code = Some(code.clone());
        state.recompute();
        self.persist(&state);
        tracing::info!(%code, discount = state.discount, "coupon applied");
        Ok(state.totals)
    }

    pub async fn remove_coupon(&self) -> StoreResult<CartTotals> {
        let mut state = self.state.write().await;
        state.discount = 0.0;
        state.coupon_code = None;
        state.recompute();
        self.persist(&state);
        Ok(state.totals)
    }

    /// Quantity of a product across the cart, zero when absent.
    pub async fn item_quantity(&self, product_id: &str) -> i32 {
        self.state
            .read()
            .await
            .lines
            .iter()
            .find(|l| l.product_id == product_id)
            .map(|l| l.quantity)
            .unwrap_or(0)
    }

    pub async fn contains_product(&self, product_id: &str) -> bool {
        self.state
            .read()
            .await
            .lines
            .iter()
            .any(|l| l.product_id == product_id)
    }

    pub async fn totals(&self) -> CartTotals {
        self.state.read().await.totals
    }

    pub async fn lines(&self) -> Vec<CartLine> {
        self.state.read().await.lines.clone()
    }

    pub async fn coupon_code(&self) -> Option<String> {
        self.state.read().await.coupon_code.clone()
    }

    fn persist(&self, state: &CartState) {
        self.storage.save(CART_KEY, state);
    }
}

fn check_ceilings(quantity: i32, max_order_qty: i32, quantity_available: i32) -> StoreResult<()> {
    if quantity > max_order_qty {
        return Err(StoreError::QuantityExceedsOrderLimit { max: max_order_qty });
    }
    if quantity > quantity_available {
        return Err(StoreError::InsufficientStock {
            available: quantity_available,
        });
    }
    Ok(())
}
