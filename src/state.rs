use std::sync::Arc;

use crate::auth::PasswordHasher;
use crate::database::models::{Income, Ledger, Spending, Users};
use crate::database::{DynRepository, DynStore, Repository, Store};

/// Everything a handler may touch, injected through axum `State`
#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,
    pub users: DynRepository<Users>,
    pub spending: DynRepository<Ledger<Spending>>,
    pub income: DynRepository<Ledger<Income>>,
    pub hasher: PasswordHasher,
}

impl AppState {
    /// Wire every repository to one backing store
    pub fn new<S>(store: S, hasher: PasswordHasher) -> Self
    where
        S: Store
            + Repository<Users>
            + Repository<Ledger<Spending>>
            + Repository<Ledger<Income>>
            + 'static,
    {
        let store = Arc::new(store);
        Self {
            store: store.clone(),
            users: store.clone(),
            spending: store.clone(),
            income: store,
            hasher,
        }
    }
}
