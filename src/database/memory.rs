// database/memory.rs - in-process store for tests
//
// Implements the same repositories as PgStore and enforces the same
// constraints: unique usernames, ledger rows need an existing owner, and
// deleting a user cascades to their ledger rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::database::manager::StoreError;
use crate::database::models::{
    Ledger, LedgerChanges, LedgerEntry, LedgerKind, NewLedgerEntry, NewUser, User, UserChanges,
    Users,
};
use crate::database::repository::{Repository, Store};

#[derive(Debug, Clone)]
struct StoredUser {
    username: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl StoredUser {
    fn to_record(&self, id: i32) -> User {
        User {
            id,
            username: self.username.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Default)]
struct LedgerTable {
    last_id: i32,
    rows: BTreeMap<i32, LedgerEntry>,
}

#[derive(Debug, Default)]
struct Tables {
    last_user_id: i32,
    users: BTreeMap<i32, StoredUser>,
    ledgers: HashMap<&'static str, LedgerTable>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored hash for a user; lets tests observe what responses never show
    pub fn password_hash(&self, id: i32) -> Option<String> {
        self.lock().users.get(&id).map(|u| u.password_hash.clone())
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn username_taken(tables: &Tables, username: &str, except: Option<i32>) -> bool {
        tables
            .users
            .iter()
            .any(|(id, u)| u.username == username && Some(*id) != except)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn close(&self) {}
}

#[async_trait]
impl Repository<Users> for MemoryStore {
    async fn insert(&self, new: &NewUser) -> Result<i32, StoreError> {
        let mut tables = self.lock();
        if Self::username_taken(&tables, &new.username, None) {
            return Err(StoreError::Conflict(format!("Username '{}' is already taken", new.username)));
        }
        tables.last_user_id += 1;
        let id = tables.last_user_id;
        tables.users.insert(
            id,
            StoredUser {
                username: new.username.clone(),
                password_hash: new.password_hash.clone(),
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn find(&self, id: i32) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.get(&id).map(|u| u.to_record(id)))
    }

    async fn list(&self, _owner: Option<i32>) -> Result<Vec<User>, StoreError> {
        Ok(self
            .lock()
            .users
            .iter()
            .map(|(id, u)| u.to_record(*id))
            .collect())
    }

    async fn update(&self, id: i32, changes: &UserChanges) -> Result<u64, StoreError> {
        let mut tables = self.lock();
        if !tables.users.contains_key(&id) {
            return Ok(0);
        }
        if Self::username_taken(&tables, &changes.username, Some(id)) {
            return Err(StoreError::Conflict(format!("Username '{}' is already taken", changes.username)));
        }
        if let Some(user) = tables.users.get_mut(&id) {
            user.username = changes.username.clone();
            if let Some(hash) = &changes.password_hash {
                user.password_hash = hash.clone();
            }
        }
        Ok(1)
    }

    async fn delete(&self, id: i32) -> Result<u64, StoreError> {
        let mut tables = self.lock();
        if tables.users.remove(&id).is_none() {
            return Ok(0);
        }
        // ON DELETE CASCADE
        for ledger in tables.ledgers.values_mut() {
            ledger.rows.retain(|_, entry| entry.user_id != id);
        }
        Ok(1)
    }
}

#[async_trait]
impl<K: LedgerKind> Repository<Ledger<K>> for MemoryStore {
    async fn insert(&self, new: &NewLedgerEntry) -> Result<i32, StoreError> {
        let mut tables = self.lock();
        if !tables.users.contains_key(&new.user_id) {
            return Err(StoreError::UnknownUser(new.user_id));
        }
        let ledger = tables.ledgers.entry(K::TABLE).or_default();
        ledger.last_id += 1;
        let id = ledger.last_id;
        ledger.rows.insert(
            id,
            LedgerEntry {
                id,
                user_id: new.user_id,
                category: new.category.clone(),
                amount: new.amount,
                date: new.date,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn find(&self, id: i32) -> Result<Option<LedgerEntry>, StoreError> {
        Ok(self
            .lock()
            .ledgers
            .get(K::TABLE)
            .and_then(|ledger| ledger.rows.get(&id).cloned()))
    }

    async fn list(&self, owner: Option<i32>) -> Result<Vec<LedgerEntry>, StoreError> {
        let tables = self.lock();
        let mut entries: Vec<LedgerEntry> = tables
            .ledgers
            .get(K::TABLE)
            .map(|ledger| {
                ledger
                    .rows
                    .values()
                    .filter(|entry| owner.map_or(true, |user_id| entry.user_id == user_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        entries.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(entries)
    }

    async fn update(&self, id: i32, changes: &LedgerChanges) -> Result<u64, StoreError> {
        let mut tables = self.lock();
        let entry = tables
            .ledgers
            .get_mut(K::TABLE)
            .and_then(|ledger| ledger.rows.get_mut(&id));
        match entry {
            Some(entry) => {
                entry.category = changes.category.clone();
                entry.amount = changes.amount;
                entry.date = changes.date;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: i32) -> Result<u64, StoreError> {
        let removed = self
            .lock()
            .ledgers
            .get_mut(K::TABLE)
            .and_then(|ledger| ledger.rows.remove(&id));
        Ok(removed.map_or(0, |_| 1))
    }
}
