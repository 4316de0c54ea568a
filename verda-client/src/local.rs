//! In-process store implementations
//!
//! [`LocalStore`] and [`LocalAuth`] implement the client seams over
//! in-memory state: row tables as JSON values with the same filter
//! semantics the network client renders, plus write counting and
//! scripted failure injection. They back the storefront's tests and
//! demos; no network is involved.

use crate::auth::{AuthApi, AuthEvent, AuthSession, AuthUser, TokenCell};
use crate::error::{ClientError, ClientResult};
use crate::query::{Filter, SelectQuery};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use tokio::sync::broadcast;

/// In-memory row store
///
/// Rows are stored verbatim; `select` projections are ignored, so seed
/// rows in the joined shape your queries expect.
#[derive(Default)]
pub struct LocalStore {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    writes: AtomicUsize,
    failures: Mutex<HashMap<String, u32>>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table with rows (serialized to their wire shape).
    pub fn seed<T: serde::Serialize>(&self, table: &str, rows: &[T]) {
        let mut tables = self.tables.lock().expect("tables poisoned");
        let entry = tables.entry(table.to_string()).or_default();
        for row in rows {
            entry.push(serde_json::to_value(row).expect("seed row must serialize"));
        }
    }

    /// Current rows of a table, for assertions.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .expect("tables poisoned")
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of write operations performed so far.
    pub fn writes(&self) -> usize {
        self.writes.load(AtomicOrdering::SeqCst)
    }

    /// Make the next write on `table` fail with an internal error.
    pub fn fail_next_write(&self, table: &str) {
        *self
            .failures
            .lock()
            .expect("failures poisoned")
            .entry(table.to_string())
            .or_insert(0) += 1;
    }

    fn take_failure(&self, table: &str) -> ClientResult<()> {
        let mut failures = self.failures.lock().expect("failures poisoned");
        if let Some(count) = failures.get_mut(table) {
            if *count > 0 {
                *count -= 1;
                return Err(ClientError::Internal(format!(
                    "injected write failure on {table}"
                )));
            }
        }
        Ok(())
    }

    fn matches(row: &Value, filters: &[Filter]) -> bool {
        filters.iter().all(|filter| match filter {
            Filter::Eq(column, value) => match row.get(column) {
                Some(Value::String(s)) => s == value,
                Some(v) => v.to_string() == *value,
                None => false,
            },
            Filter::SearchAny(columns, term) => {
                let term = term.to_lowercase();
                columns.iter().any(|column| {
                    row.get(column)
                        .and_then(Value::as_str)
                        .is_some_and(|s| s.to_lowercase().contains(&term))
                })
            }
        })
    }

    fn compare(a: &Value, b: &Value) -> Ordering {
        match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => {
                let x = a.as_str().map(str::to_string).unwrap_or_else(|| a.to_string());
                let y = b.as_str().map(str::to_string).unwrap_or_else(|| b.to_string());
                x.cmp(&y)
            }
        }
    }

    fn apply(query: &SelectQuery, rows: &[Value]) -> Vec<Value> {
        let mut selected: Vec<Value> = rows
            .iter()
            .filter(|row| Self::matches(row, query.filters()))
            .cloned()
            .collect();

        if let Some((column, ascending)) = query.ordering() {
            selected.sort_by(|a, b| {
                let ord = Self::compare(
                    a.get(column).unwrap_or(&Value::Null),
                    b.get(column).unwrap_or(&Value::Null),
                );
                if ascending { ord } else { ord.reverse() }
            });
        }

        let offset = query.row_offset() as usize;
        let selected: Vec<Value> = selected.into_iter().skip(offset).collect();
        match query.row_limit() {
            Some(limit) => selected.into_iter().take(limit as usize).collect(),
            None => selected,
        }
    }

    fn enrich(mut row: Map<String, Value>) -> Map<String, Value> {
        row.entry("id")
            .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
        row.entry("created_at")
            .or_insert_with(|| Value::String(chrono::Utc::now().to_rfc3339()));
        row
    }
}

#[async_trait]
impl super::RowStore for LocalStore {
    async fn select<T: DeserializeOwned + Send>(
        &self,
        table: &str,
        query: SelectQuery,
    ) -> ClientResult<Vec<T>> {
        let tables = self.tables.lock().expect("tables poisoned");
        let rows = tables.get(table).map(Vec::as_slice).unwrap_or(&[]);
        Self::apply(&query, rows)
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(ClientError::from))
            .collect()
    }

    async fn insert<T, B>(&self, table: &str, body: &B) -> ClientResult<Vec<T>>
    where
        T: DeserializeOwned + Send,
        B: serde::Serialize + Sync,
    {
        self.take_failure(table)?;
        let value = serde_json::to_value(body)?;
        let rows = match value {
            Value::Array(rows) => rows,
            single => vec![single],
        };

        let mut inserted = Vec::with_capacity(rows.len());
        {
            let mut tables = self.tables.lock().expect("tables poisoned");
            let entry = tables.entry(table.to_string()).or_default();
            for row in rows {
                let Value::Object(map) = row else {
                    return Err(ClientError::Validation(format!(
                        "{table}: insert body must be an object or array of objects"
                    )));
                };
                let row = Value::Object(Self::enrich(map));
                entry.push(row.clone());
                inserted.push(row);
            }
        }
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);

        inserted
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(ClientError::from))
            .collect()
    }

    async fn update<T, B>(&self, table: &str, query: SelectQuery, patch: &B) -> ClientResult<Vec<T>>
    where
        T: DeserializeOwned + Send,
        B: serde::Serialize + Sync,
    {
        self.take_failure(table)?;
        let Value::Object(patch) = serde_json::to_value(patch)? else {
            return Err(ClientError::Validation(format!(
                "{table}: update patch must be an object"
            )));
        };

        let mut updated = Vec::new();
        {
            let mut tables = self.tables.lock().expect("tables poisoned");
            if let Some(rows) = tables.get_mut(table) {
                for row in rows.iter_mut() {
                    if Self::matches(row, query.filters()) {
                        if let Value::Object(map) = row {
                            for (key, value) in &patch {
                                map.insert(key.clone(), value.clone());
                            }
                        }
                        updated.push(row.clone());
                    }
                }
            }
        }
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);

        updated
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(ClientError::from))
            .collect()
    }

    async fn delete(&self, table: &str, query: SelectQuery) -> ClientResult<()> {
        self.take_failure(table)?;
        let mut tables = self.tables.lock().expect("tables poisoned");
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|row| !Self::matches(row, query.filters()));
        }
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(())
    }
}

/// In-process auth with a fixed user registry
pub struct LocalAuth {
    users: Mutex<HashMap<String, (String, AuthUser)>>,
    token: TokenCell,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for LocalAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalAuth {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            users: Mutex::new(HashMap::new()),
            token: TokenCell::default(),
            events,
        }
    }

    pub fn token_cell(&self) -> &TokenCell {
        &self.token
    }

    /// Pre-register a user without signing in.
    pub fn with_user(self, email: &str, password: &str) -> Self {
        let user = AuthUser {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
        };
        self.users
            .lock()
            .expect("users poisoned")
            .insert(email.to_string(), (password.to_string(), user));
        self
    }

    fn issue(&self, user: AuthUser) -> AuthSession {
        let session = AuthSession {
            access_token: uuid::Uuid::new_v4().to_string(),
            refresh_token: None,
            user: user.clone(),
        };
        self.token.set(&session.access_token);
        let _ = self.events.send(AuthEvent::SignedIn(user));
        session
    }
}

#[async_trait]
impl AuthApi for LocalAuth {
    async fn sign_up(&self, email: &str, password: &str) -> ClientResult<AuthSession> {
        let user = {
            let mut users = self.users.lock().expect("users poisoned");
            if users.contains_key(email) {
                return Err(ClientError::Auth(format!("{email} is already registered")));
            }
            let user = AuthUser {
                id: uuid::Uuid::new_v4().to_string(),
                email: email.to_string(),
            };
            users.insert(email.to_string(), (password.to_string(), user.clone()));
            user
        };
        Ok(self.issue(user))
    }

    async fn sign_in(&self, email: &str, password: &str) -> ClientResult<AuthSession> {
        let user = {
            let users = self.users.lock().expect("users poisoned");
            match users.get(email) {
                Some((stored, user)) if stored == password => user.clone(),
                _ => return Err(ClientError::Auth("invalid login credentials".into())),
            }
        };
        Ok(self.issue(user))
    }

    async fn sign_out(&self) -> ClientResult<()> {
        self.token.clear();
        let _ = self.events.send(AuthEvent::SignedOut);
        Ok(())
    }

    async fn reset_password(&self, email: &str) -> ClientResult<()> {
        let users = self.users.lock().expect("users poisoned");
        if users.contains_key(email) {
            Ok(())
        } else {
            Err(ClientError::Auth(format!("no user for {email}")))
        }
    }

    fn restore(&self, session: &AuthSession) {
        self.token.set(&session.access_token);
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RowStore;
    use serde_json::json;

    #[tokio::test]
    async fn select_applies_filters_order_and_limit() {
        let store = LocalStore::new();
        store.seed(
            "products",
            &[
                json!({"id": "p1", "name": "Milk", "price": 42, "is_available": true}),
                json!({"id": "p2", "name": "Bread", "price": 30, "is_available": true}),
                json!({"id": "p3", "name": "Butter", "price": 55, "is_available": false}),
            ],
        );

        let rows: Vec<Value> = store
            .select(
                "products",
                SelectQuery::new()
                    .eq("is_available", true)
                    .order_by("price", true),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], "p2");

        let rows: Vec<Value> = store
            .select("products", SelectQuery::new().order_by("price", false).limit(1))
            .await
            .unwrap();
        assert_eq!(rows[0]["id"], "p3");
    }

    #[tokio::test]
    async fn search_any_is_case_insensitive() {
        let store = LocalStore::new();
        store.seed(
            "products",
            &[
                json!({"id": "p1", "name": "Whole Milk", "description": null}),
                json!({"id": "p2", "name": "Bread", "description": "with milk solids"}),
                json!({"id": "p3", "name": "Eggs", "description": "farm fresh"}),
            ],
        );

        let rows: Vec<Value> = store
            .select(
                "products",
                SelectQuery::new().search_any(&["name", "description"], "MILK"),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn insert_mints_id_and_counts_writes() {
        let store = LocalStore::new();
        let rows: Vec<Value> = store
            .insert("cart_items", &json!({"product_id": "p1", "quantity": 2}))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0]["id"].is_string());
        assert!(rows[0]["created_at"].is_string());
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn update_merges_patch_into_matching_rows() {
        let store = LocalStore::new();
        store.seed("cart_items", &[json!({"id": "l1", "quantity": 1})]);
        let rows: Vec<Value> = store
            .update(
                "cart_items",
                SelectQuery::new().eq("id", "l1"),
                &json!({"quantity": 4}),
            )
            .await
            .unwrap();
        assert_eq!(rows[0]["quantity"], 4);
        assert_eq!(store.rows("cart_items")[0]["quantity"], 4);
    }

    #[tokio::test]
    async fn delete_removes_matching_rows_only() {
        let store = LocalStore::new();
        store.seed(
            "wishlist",
            &[
                json!({"id": "w1", "user_id": "u1"}),
                json!({"id": "w2", "user_id": "u2"}),
            ],
        );
        store
            .delete("wishlist", SelectQuery::new().eq("user_id", "u1"))
            .await
            .unwrap();
        let remaining = store.rows("wishlist");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0]["id"], "w2");
    }

    #[tokio::test]
    async fn injected_failure_fires_once() {
        let store = LocalStore::new();
        store.fail_next_write("orders");
        let result: ClientResult<Vec<Value>> =
            store.insert("orders", &json!({"total": 100})).await;
        assert!(result.is_err());
        assert_eq!(store.rows("orders").len(), 0);

        let result: ClientResult<Vec<Value>> =
            store.insert("orders", &json!({"total": 100})).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn local_auth_round_trip() {
        let auth = LocalAuth::new().with_user("a@b.c", "secret");
        let mut events = auth.subscribe();

        assert!(auth.sign_in("a@b.c", "wrong").await.is_err());
        let session = auth.sign_in("a@b.c", "secret").await.unwrap();
        assert_eq!(session.user.email, "a@b.c");
        assert!(auth.token_cell().get().is_some());
        assert!(matches!(events.try_recv(), Ok(AuthEvent::SignedIn(_))));

        auth.sign_out().await.unwrap();
        assert!(auth.token_cell().get().is_none());
        assert!(matches!(events.try_recv(), Ok(AuthEvent::SignedOut)));
    }
}
