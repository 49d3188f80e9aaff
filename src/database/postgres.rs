use async_trait::async_trait;

use crate::database::manager::{PgStore, StoreError};
use crate::database::models::{
    Ledger, LedgerChanges, LedgerEntry, LedgerKind, LedgerRow, NewLedgerEntry, NewUser, User,
    UserChanges, UserRow, Users,
};
use crate::database::repository::Repository;

const LEDGER_COLUMNS: &str = "id, user_id, category, amount, date, created_at";

enum Violation {
    Unique,
    ForeignKey,
}

fn violation(err: &sqlx::Error) -> Option<Violation> {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => Some(Violation::Unique),
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => Some(Violation::ForeignKey),
        _ => None,
    }
}

fn username_taken(err: sqlx::Error, username: &str) -> StoreError {
    match violation(&err) {
        Some(Violation::Unique) => StoreError::Conflict(format!("Username '{}' is already taken", username)),
        _ => StoreError::Sqlx(err),
    }
}

#[async_trait]
impl Repository<Users> for PgStore {
    async fn insert(&self, new: &NewUser) -> Result<i32, StoreError> {
        sqlx::query_scalar::<_, i32>(
            "INSERT INTO users (username, hashed_password) VALUES ($1, $2) RETURNING id",
        )
        .bind(&new.username)
        .bind(&new.password_hash)
        .fetch_one(self.pool())
        .await
        .map_err(|e| username_taken(e, &new.username))
    }

    async fn find(&self, id: i32) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(User::from))
    }

    async fn list(&self, _owner: Option<i32>) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>("SELECT id, username, created_at FROM users ORDER BY id")
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn update(&self, id: i32, changes: &UserChanges) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET username = $1, hashed_password = COALESCE($2, hashed_password) WHERE id = $3",
        )
        .bind(&changes.username)
        .bind(changes.password_hash.as_deref())
        .bind(id)
        .execute(self.pool())
        .await
        .map_err(|e| username_taken(e, &changes.username))?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: i32) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl<K: LedgerKind> Repository<Ledger<K>> for PgStore {
    async fn insert(&self, new: &NewLedgerEntry) -> Result<i32, StoreError> {
        let sql = format!(
            "INSERT INTO {} (user_id, category, amount, date) VALUES ($1, $2, $3, $4) RETURNING id",
            K::TABLE
        );
        sqlx::query_scalar::<_, i32>(&sql)
            .bind(new.user_id)
            .bind(&new.category)
            .bind(new.amount)
            .bind(new.date)
            .fetch_one(self.pool())
            .await
            .map_err(|e| match violation(&e) {
                Some(Violation::ForeignKey) => StoreError::UnknownUser(new.user_id),
                _ => StoreError::Sqlx(e),
            })
    }

    async fn find(&self, id: i32) -> Result<Option<LedgerEntry>, StoreError> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", LEDGER_COLUMNS, K::TABLE);
        let row = sqlx::query_as::<_, LedgerRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(LedgerEntry::from))
    }

    async fn list(&self, owner: Option<i32>) -> Result<Vec<LedgerEntry>, StoreError> {
        let rows = match owner {
            Some(user_id) => {
                let sql = format!(
                    "SELECT {} FROM {} WHERE user_id = $1 ORDER BY date DESC, id DESC",
                    LEDGER_COLUMNS,
                    K::TABLE
                );
                sqlx::query_as::<_, LedgerRow>(&sql)
                    .bind(user_id)
                    .fetch_all(self.pool())
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM {} ORDER BY date DESC, id DESC",
                    LEDGER_COLUMNS,
                    K::TABLE
                );
                sqlx::query_as::<_, LedgerRow>(&sql)
                    .fetch_all(self.pool())
                    .await?
            }
        };
        Ok(rows.into_iter().map(LedgerEntry::from).collect())
    }

    async fn update(&self, id: i32, changes: &LedgerChanges) -> Result<u64, StoreError> {
        let sql = format!(
            "UPDATE {} SET category = $1, amount = $2, date = $3 WHERE id = $4",
            K::TABLE
        );
        let result = sqlx::query(&sql)
            .bind(&changes.category)
            .bind(changes.amount)
            .bind(changes.date)
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: i32) -> Result<u64, StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", K::TABLE);
        let result = sqlx::query(&sql).bind(id).execute(self.pool()).await?;
        Ok(result.rows_affected())
    }
}
