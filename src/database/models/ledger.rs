use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::marker::PhantomData;

use crate::api::date::iso_date;
use crate::database::repository::Entity;

/// Distinguishes the money tables that share the ledger layout.
pub trait LedgerKind: Send + Sync + 'static {
    /// Table name; a compile-time constant, never user input
    const TABLE: &'static str;
    /// Human label used in messages ("Spending", "Income")
    const LABEL: &'static str;
}

pub struct Spending;

impl LedgerKind for Spending {
    const TABLE: &'static str = "spending";
    const LABEL: &'static str = "Spending";
}

pub struct Income;

impl LedgerKind for Income {
    const TABLE: &'static str = "income";
    const LABEL: &'static str = "Income";
}

/// Marker for one ledger table
pub struct Ledger<K>(PhantomData<fn() -> K>);

impl<K: LedgerKind> Entity for Ledger<K> {
    type Record = LedgerEntry;
    type New = NewLedgerEntry;
    type Changes = LedgerChanges;
}

#[derive(Debug, Clone, FromRow)]
pub struct LedgerRow {
    pub id: i32,
    pub user_id: i32,
    pub category: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i32,
    pub user_id: i32,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "iso_date")]
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl From<LedgerRow> for LedgerEntry {
    fn from(row: LedgerRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            category: row.category,
            amount: row.amount,
            date: row.date,
            created_at: row.created_at.and_utc(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub user_id: i32,
    pub category: String,
    pub amount: Decimal,
    pub date: NaiveDate,
}

/// Full replacement of an entry. The owning user never changes.
#[derive(Debug, Clone)]
pub struct LedgerChanges {
    pub category: String,
    pub amount: Decimal,
    pub date: NaiveDate,
}
