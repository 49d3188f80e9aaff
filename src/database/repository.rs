use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use crate::database::manager::StoreError;

/// An entity kind persisted by a store: its public record shape plus the
/// inputs needed to create and to overwrite one.
pub trait Entity: Send + Sync + 'static {
    type Record: Serialize + Send + Sync + 'static;
    type New: Send + Sync + 'static;
    type Changes: Send + Sync + 'static;
}

/// CRUD access to one entity table. Every method maps onto exactly one
/// parameterized statement.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// Insert a row and return the id the store assigned
    async fn insert(&self, new: &E::New) -> Result<i32, StoreError>;

    async fn find(&self, id: i32) -> Result<Option<E::Record>, StoreError>;

    /// All rows, restricted to one owning user when `owner` is set.
    /// Entities without an owner ignore the filter.
    async fn list(&self, owner: Option<i32>) -> Result<Vec<E::Record>, StoreError>;

    /// Overwrite the mutable fields; returns the number of rows touched
    async fn update(&self, id: i32, changes: &E::Changes) -> Result<u64, StoreError>;

    /// Returns the number of rows removed
    async fn delete(&self, id: i32) -> Result<u64, StoreError>;
}

pub type DynRepository<E> = Arc<dyn Repository<E>>;

/// Lifecycle and liveness of the backing store
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    /// Release held resources. Safe to call more than once.
    async fn close(&self);
}

pub type DynStore = Arc<dyn Store>;
