use sqlx::PgPool;
use tracing::info;

use crate::database::manager::StoreError;
use crate::database::models::{Income, LedgerKind, Spending};

const USERS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        username VARCHAR(255) UNIQUE NOT NULL,
        hashed_password VARCHAR(255) NOT NULL,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )";

/// DDL for a ledger table; rows go away with their owning user.
fn ledger_table(table: &str) -> String {
    format!(
        "
    CREATE TABLE IF NOT EXISTS {table} (
        id SERIAL PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        category VARCHAR(255) NOT NULL,
        amount DECIMAL(10, 2) NOT NULL,
        date DATE NOT NULL,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )"
    )
}

/// Create-if-absent for every table, parents first. Never drops or alters.
pub async fn ensure_tables(pool: &PgPool) -> Result<(), StoreError> {
    let statements = [
        ("users", USERS_TABLE.to_string()),
        (Spending::TABLE, ledger_table(Spending::TABLE)),
        (Income::TABLE, ledger_table(Income::TABLE)),
    ];

    for (table, ddl) in statements {
        sqlx::query(&ddl)
            .execute(pool)
            .await
            .map_err(|source| StoreError::Schema { table, source })?;
    }

    info!("Tables ensured: users, {}, {}", Spending::TABLE, Income::TABLE);
    Ok(())
}
