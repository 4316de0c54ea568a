//! Catalog Cache
//!
//! Read-through cache over the `products`, `categories` and `offers`
//! collections. Fetches replace the cached rows wholesale; accessors
//! hand out the last fetched state without touching the network.

use crate::error::{StoreError, StoreResult};
use shared::models::{Category, Coupon, Product};
use std::sync::Arc;
use tokio::sync::RwLock;
use verda_client::{ClientError, RowStore, SelectQuery};

/// Projection joining the product's category reference.
const PRODUCT_SELECT: &str = "*, category:categories(id,name,slug)";
/// Columns covered by free-text search.
const SEARCH_COLUMNS: &[&str] = &["name", "description", "brand"];

/// Filter/sort parameters for a product listing
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub category_id: Option<String>,
    pub featured: bool,
    pub bestseller: bool,
    pub search: Option<String>,
    /// Sort column, `created_at` descending when unset
    pub sort_by: Option<String>,
    pub ascending: bool,
    pub limit: Option<u32>,
}

impl ProductQuery {
    fn to_select(&self) -> SelectQuery {
        let mut query = SelectQuery::new()
            .select(PRODUCT_SELECT)
            .eq("is_available", true);
        if let Some(category_id) = &self.category_id {
            query = query.eq("category_id", category_id);
        }
        if self.featured {
            query = query.eq("is_featured", true);
        }
        if self.bestseller {
            query = query.eq("is_bestseller", true);
        }
        if let Some(term) = &self.search {
            query = query.search_any(SEARCH_COLUMNS, term.clone());
        }
        query = match &self.sort_by {
            Some(column) => query.order_by(column.clone(), self.ascending),
            None => query.order_by("created_at", false),
        };
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        query
    }
}

#[derive(Default)]
struct CatalogState {
    products: Vec<Product>,
    featured: Vec<Product>,
    bestsellers: Vec<Product>,
    categories: Vec<Category>,
    offers: Vec<Coupon>,
    search_results: Vec<Product>,
}

/// Catalog store
pub struct CatalogCache<R> {
    rows: Arc<R>,
    state: RwLock<CatalogState>,
}

impl<R: RowStore> CatalogCache<R> {
    pub fn new(rows: Arc<R>) -> Self {
        Self {
            rows,
            state: RwLock::new(CatalogState::default()),
        }
    }

    /// Fetch a product listing and cache it.
    pub async fn fetch_products(&self, query: ProductQuery) -> StoreResult<Vec<Product>> {
        let products: Vec<Product> = self.rows.select("products", query.to_select()).await?;
        self.state.write().await.products = products.clone();
        Ok(products)
    }

    pub async fn fetch_featured(&self, limit: u32) -> StoreResult<Vec<Product>> {
        let query = ProductQuery {
            featured: true,
            limit: Some(limit),
            ..Default::default()
        };
        let products: Vec<Product> = self.rows.select("products", query.to_select()).await?;
        self.state.write().await.featured = products.clone();
        Ok(products)
    }

    pub async fn fetch_bestsellers(&self, limit: u32) -> StoreResult<Vec<Product>> {
        let query = ProductQuery {
            bestseller: true,
            limit: Some(limit),
            ..Default::default()
        };
        let products: Vec<Product> = self.rows.select("products", query.to_select()).await?;
        self.state.write().await.bestsellers = products.clone();
        Ok(products)
    }

    pub async fn fetch_product_by_slug(&self, slug: &str) -> StoreResult<Product> {
        self.rows
            .select_one(
                "products",
                SelectQuery::new()
                    .select(PRODUCT_SELECT)
                    .eq("slug", slug)
                    .eq("is_available", true),
            )
            .await
            .map_err(StoreError::from)
    }

    /// Fetch active categories in display order and cache them.
    pub async fn fetch_categories(&self) -> StoreResult<Vec<Category>> {
        let categories: Vec<Category> = self
            .rows
            .select(
                "categories",
                SelectQuery::new()
                    .eq("is_active", true)
                    .order_by("display_order", true),
            )
            .await?;
        self.state.write().await.categories = categories.clone();
        Ok(categories)
    }

    /// Fetch active coupon offers in display order and cache them.
    pub async fn fetch_offers(&self) -> StoreResult<Vec<Coupon>> {
        let offers: Vec<Coupon> = self
            .rows
            .select(
                "offers",
                SelectQuery::new()
                    .eq("is_active", true)
                    .order_by("display_order", true),
            )
            .await?;
        self.state.write().await.offers = offers.clone();
        Ok(offers)
    }

    /// Free-text product search. A blank term short-circuits to empty
    /// results without a remote call.
    pub async fn search_products(&self, term: &str) -> StoreResult<Vec<Product>> {
        let term = term.trim();
        if term.is_empty() {
            self.state.write().await.search_results.clear();
            return Ok(Vec::new());
        }
        let query = ProductQuery {
            search: Some(term.to_string()),
            ..Default::default()
        };
        let products: Vec<Product> = self.rows.select("products", query.to_select()).await?;
        self.state.write().await.search_results = products.clone();
        Ok(products)
    }

    /// Resolve a category by slug, then list its products.
    pub async fn products_by_category(&self, slug: &str) -> StoreResult<Vec<Product>> {
        let category: Category = self
            .rows
            .select_one("categories", SelectQuery::new().eq("slug", slug))
            .await
            .map_err(|e| match e {
                ClientError::NotFound(_) => {
                    StoreError::Remote(ClientError::NotFound(format!("category {slug}")))
                }
                other => StoreError::Remote(other),
            })?;
        self.fetch_products(ProductQuery {
            category_id: Some(category.id),
            ..Default::default()
        })
        .await
    }

    pub async fn products(&self) -> Vec<Product> {
        self.state.read().await.products.clone()
    }

    pub async fn featured(&self) -> Vec<Product> {
        self.state.read().await.featured.clone()
    }

    pub async fn bestsellers(&self) -> Vec<Product> {
        self.state.read().await.bestsellers.clone()
    }

    pub async fn categories(&self) -> Vec<Category> {
        self.state.read().await.categories.clone()
    }

    pub async fn offers(&self) -> Vec<Coupon> {
        self.state.read().await.offers.clone()
    }

    pub async fn search_results(&self) -> Vec<Product> {
        self.state.read().await.search_results.clone()
    }

    pub async fn clear_search_results(&self) {
        self.state.write().await.search_results.clear();
    }
}
