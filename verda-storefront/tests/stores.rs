//! Wishlist, catalog and session behaviour.

mod common;

use common::{harness, product, signed_in};
use serde_json::json;
use shared::models::{ProfileUpdate, Role};
use verda_client::{AuthSession, AuthUser, LocalAuth, LocalStore, RowStore, SelectQuery};
use verda_storefront::{SessionContext, StoreError};

#[tokio::test]
async fn wishlist_toggle_twice_is_a_no_op() {
    let h = signed_in().await;
    let milk = product("milk", 42.5);

    assert!(h.wishlist.toggle(&milk).await.unwrap());
    assert!(h.wishlist.contains("milk").await);
    assert_eq!(h.store.rows("wishlist").len(), 1);

    assert!(!h.wishlist.toggle(&milk).await.unwrap());
    assert!(!h.wishlist.contains("milk").await);
    assert!(h.store.rows("wishlist").is_empty());
    assert!(h.wishlist.entries().await.is_empty());
}

#[tokio::test]
async fn duplicate_wishlist_add_skips_the_remote_write() {
    let h = signed_in().await;
    let milk = product("milk", 42.5);

    assert!(h.wishlist.add(&milk).await.unwrap());
    let writes_before = h.store.writes();
    assert!(!h.wishlist.add(&milk).await.unwrap());
    assert_eq!(h.store.writes(), writes_before);
    assert_eq!(h.store.rows("wishlist").len(), 1);
}

#[tokio::test]
async fn wishlist_fetch_collapses_joined_rows() {
    let h = signed_in().await;
    h.store.seed(
        "wishlist",
        &[json!({
            "id": "w1",
            "user_id": h.context.current_user().await.unwrap().id,
            "product_id": "milk",
            "created_at": "2026-08-01T10:00:00Z",
            "product": serde_json::to_value(product("milk", 42.5)).unwrap(),
        })],
    );

    let entries = h.wishlist.fetch().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].product_id, "milk");
    assert_eq!(entries[0].price, 42.5);
    assert!(h.wishlist.entry_for("milk").await.is_some());
}

#[tokio::test]
async fn blank_search_term_never_hits_the_remote() {
    let h = harness().await;
    h.store
        .seed("products", &[serde_json::to_value(product("milk", 42.5)).unwrap()]);

    let results = h.catalog.search_products("   ").await.unwrap();
    assert!(results.is_empty());
    assert!(h.catalog.search_results().await.is_empty());

    let results = h.catalog.search_products("Product milk").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(h.catalog.search_results().await.len(), 1);
}

#[tokio::test]
async fn categories_come_back_active_and_in_display_order() {
    let h = harness().await;
    h.store.seed(
        "categories",
        &[
            json!({"id": "c2", "name": "Dairy", "slug": "dairy", "display_order": 2, "is_active": true}),
            json!({"id": "c1", "name": "Fruit", "slug": "fruit", "display_order": 1, "is_active": true}),
            json!({"id": "c3", "name": "Legacy", "slug": "legacy", "display_order": 0, "is_active": false}),
        ],
    );

    let categories = h.catalog.fetch_categories().await.unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].slug, "fruit");
    assert_eq!(categories[1].slug, "dairy");
}

#[tokio::test]
async fn products_by_category_resolves_the_slug_first() {
    let h = harness().await;
    h.store.seed(
        "categories",
        &[json!({"id": "c1", "name": "Dairy", "slug": "dairy", "display_order": 1, "is_active": true})],
    );
    let mut milk = product("milk", 42.5);
    milk.category_id = Some("c1".to_string());
    let bread = product("bread", 30.0);
    h.store.seed(
        "products",
        &[
            serde_json::to_value(milk).unwrap(),
            serde_json::to_value(bread).unwrap(),
        ],
    );

    let products = h.catalog.products_by_category("dairy").await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, "milk");
}

#[tokio::test]
async fn cart_fetch_collapses_joined_rows() {
    let h = signed_in().await;
    h.store.seed(
        "cart_items",
        &[json!({
            "id": "l1",
            "user_id": h.context.current_user().await.unwrap().id,
            "quantity": 3,
            "product": serde_json::to_value(product("milk", 42.5)).unwrap(),
        })],
    );

    let lines = h.cart.fetch().await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].product_id, "milk");
    assert_eq!(lines[0].quantity, 3);
    assert_eq!(h.cart.totals().await.subtotal, 127.5);
}

#[tokio::test]
async fn sign_up_creates_the_profile_row() {
    let h = harness().await;
    assert!(!h.context.is_authenticated().await);

    let user = h
        .context
        .sign_up("new@example.com", "secret", Some("New Shopper"))
        .await
        .unwrap();
    assert!(h.context.is_authenticated().await);
    assert!(!h.context.is_admin().await);

    let profiles = h.store.rows("users");
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0]["id"], serde_json::Value::String(user.id));
    assert_eq!(profiles[0]["full_name"], "New Shopper");
    assert_eq!(profiles[0]["role"], "customer");
}

#[tokio::test]
async fn sign_out_clears_session_state() {
    let h = signed_in().await;
    h.context.sign_out().await.unwrap();
    assert!(!h.context.is_authenticated().await);
    assert!(h.context.current_user().await.is_none());

    let err = h.cart.add_item(&product("milk", 42.5), 1).await.unwrap_err();
    assert!(matches!(err, StoreError::Unauthenticated));
}

#[tokio::test]
async fn update_profile_patches_and_refreshes() {
    let h = signed_in().await;
    let updated = h
        .context
        .update_profile(ProfileUpdate {
            full_name: Some("Renamed Shopper".to_string()),
            phone: Some("9999999999".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(updated.full_name.as_deref(), Some("Renamed Shopper"));
    assert_eq!(updated.phone.as_deref(), Some("9999999999"));
}

#[tokio::test]
async fn initialize_restores_a_persisted_session_with_role() {
    let h = harness().await;
    let user = AuthUser {
        id: "admin-1".to_string(),
        email: "admin@example.com".to_string(),
    };
    h.store.seed(
        "users",
        &[json!({"id": "admin-1", "email": "admin@example.com", "role": Role::Admin})],
    );
    h.storage.save(
        "verda.session",
        &AuthSession {
            access_token: "tok-1".to_string(),
            refresh_token: None,
            user,
        },
    );

    let restored: SessionContext<LocalAuth, LocalStore> = SessionContext::new(
        std::sync::Arc::clone(&h.auth),
        std::sync::Arc::clone(&h.store),
        std::sync::Arc::clone(&h.storage),
    );
    restored.initialize().await.unwrap();

    assert!(restored.is_authenticated().await);
    assert!(restored.is_admin().await);
    assert!(h.auth.token_cell().get().is_some());

    // The adopted session authenticates row reads for its user.
    let rows: Vec<serde_json::Value> = h
        .store
        .select("users", SelectQuery::new().eq("id", "admin-1"))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}
