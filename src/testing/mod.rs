// testing/mod.rs - router-level test harness over an in-memory store

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::app::app;
use crate::auth::PasswordHasher;
use crate::config::AppConfig;
use crate::database::models::{
    Ledger, LedgerChanges, LedgerEntry, LedgerKind, NewLedgerEntry, NewUser, User, UserChanges, Users,
};
use crate::database::{MemoryStore, Repository, Store, StoreError};
use crate::state::AppState;

/// Cheapest work factor bcrypt allows; keeps tests fast
const TEST_BCRYPT_COST: u32 = 4;

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::development())
    }

    pub fn with_bcrypt_cost(cost: u32) -> Self {
        Self::build(AppConfig::development(), cost)
    }

    /// App over a store that misbehaves as `fault` says, with a one second
    /// request deadline
    pub fn faulty(fault: Fault) -> (Self, FaultyStore) {
        let mut config = AppConfig::development();
        config.server.request_timeout_secs = 1;
        let faulty = FaultyStore::new(fault);
        let state = AppState::new(faulty.clone(), PasswordHasher::new(TEST_BCRYPT_COST));
        let app = Self {
            router: app(state, &config),
            store: faulty.inner.clone(),
        };
        (app, faulty)
    }

    pub fn with_body_limit(bytes: usize) -> Self {
        let mut config = AppConfig::development();
        config.api.max_request_size_bytes = bytes;
        Self::with_config(config)
    }

    fn with_config(config: AppConfig) -> Self {
        Self::build(config, TEST_BCRYPT_COST)
    }

    fn build(config: AppConfig, bcrypt_cost: u32) -> Self {
        let store = MemoryStore::new();
        let state = AppState::new(store.clone(), PasswordHasher::new(bcrypt_cost));
        Self {
            router: app(state, &config),
            store,
        }
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.send(Method::GET, path, Body::empty()).await
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, path, Body::from(body.to_string())).await
    }

    pub async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, path, Body::from(body.to_string())).await
    }

    pub async fn delete(&self, path: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, path, Body::empty()).await
    }

    /// Send an arbitrary body, e.g. malformed JSON
    pub async fn send_raw(&self, method: &str, path: &str, body: &str) -> (StatusCode, Value) {
        let method = Method::from_bytes(method.as_bytes()).unwrap();
        self.send(method, path, Body::from(body.to_string())).await
    }

    /// Status, content type and raw body text
    pub async fn get_text(&self, path: &str) -> (StatusCode, Option<String>, String) {
        let response = self.call(Method::GET, path, Body::empty()).await;
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// JSON body, or `Value::Null` when the body is not JSON
    async fn send(&self, method: Method, path: &str, body: Body) -> (StatusCode, Value) {
        let response = self.call(method, path, body).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn call(&self, method: Method, path: &str, body: Body) -> axum::response::Response {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// How a [`FaultyStore`] misbehaves on every call
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    /// Sleep before answering
    Slow(Duration),
    /// The server cannot be reached
    Unreachable,
    /// No pooled connection frees up in time
    PoolExhausted,
    /// A statement fails outright
    Broken,
}

/// `MemoryStore` wrapper that injects one [`Fault`] into every call.
/// Records whether a slow call finished or was dropped part way through.
#[derive(Clone)]
pub struct FaultyStore {
    inner: MemoryStore,
    fault: Fault,
    pub finished: Arc<AtomicBool>,
    pub abandoned: Arc<AtomicBool>,
}

/// Flags the call as abandoned when dropped before it finishes
struct InFlight {
    done: bool,
    abandoned: Arc<AtomicBool>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.done {
            self.abandoned.store(true, Ordering::SeqCst);
        }
    }
}

impl FaultyStore {
    pub fn new(fault: Fault) -> Self {
        Self {
            inner: MemoryStore::new(),
            fault,
            finished: Arc::new(AtomicBool::new(false)),
            abandoned: Arc::new(AtomicBool::new(false)),
        }
    }

    async fn gate(&self) -> Result<(), StoreError> {
        match self.fault {
            Fault::Slow(delay) => {
                let mut call = InFlight {
                    done: false,
                    abandoned: self.abandoned.clone(),
                };
                tokio::time::sleep(delay).await;
                call.done = true;
                self.finished.store(true, Ordering::SeqCst);
                Ok(())
            }
            Fault::Unreachable => Err(StoreError::Unreachable(sqlx::Error::PoolClosed)),
            Fault::PoolExhausted => Err(StoreError::Sqlx(sqlx::Error::PoolTimedOut)),
            Fault::Broken => Err(StoreError::Sqlx(sqlx::Error::Protocol(
                "relation \"users\" does not exist".to_string(),
            ))),
        }
    }
}

#[async_trait]
impl Store for FaultyStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.gate().await
    }

    async fn close(&self) {}
}

#[async_trait]
impl Repository<Users> for FaultyStore {
    async fn insert(&self, new: &NewUser) -> Result<i32, StoreError> {
        self.gate().await?;
        Repository::<Users>::insert(&self.inner, new).await
    }

    async fn find(&self, id: i32) -> Result<Option<User>, StoreError> {
        self.gate().await?;
        Repository::<Users>::find(&self.inner, id).await
    }

    async fn list(&self, owner: Option<i32>) -> Result<Vec<User>, StoreError> {
        self.gate().await?;
        Repository::<Users>::list(&self.inner, owner).await
    }

    async fn update(&self, id: i32, changes: &UserChanges) -> Result<u64, StoreError> {
        self.gate().await?;
        Repository::<Users>::update(&self.inner, id, changes).await
    }

    async fn delete(&self, id: i32) -> Result<u64, StoreError> {
        self.gate().await?;
        Repository::<Users>::delete(&self.inner, id).await
    }
}

#[async_trait]
impl<K: LedgerKind> Repository<Ledger<K>> for FaultyStore {
    async fn insert(&self, new: &NewLedgerEntry) -> Result<i32, StoreError> {
        self.gate().await?;
        Repository::<Ledger<K>>::insert(&self.inner, new).await
    }

    async fn find(&self, id: i32) -> Result<Option<LedgerEntry>, StoreError> {
        self.gate().await?;
        Repository::<Ledger<K>>::find(&self.inner, id).await
    }

    async fn list(&self, owner: Option<i32>) -> Result<Vec<LedgerEntry>, StoreError> {
        self.gate().await?;
        Repository::<Ledger<K>>::list(&self.inner, owner).await
    }

    async fn update(&self, id: i32, changes: &LedgerChanges) -> Result<u64, StoreError> {
        self.gate().await?;
        Repository::<Ledger<K>>::update(&self.inner, id, changes).await
    }

    async fn delete(&self, id: i32) -> Result<u64, StoreError> {
        self.gate().await?;
        Repository::<Ledger<K>>::delete(&self.inner, id).await
    }
}
