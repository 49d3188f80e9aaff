pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod schema;

pub use manager::{PgStore, StoreError};
pub use memory::MemoryStore;
pub use repository::{DynRepository, DynStore, Entity, Repository, Store};
