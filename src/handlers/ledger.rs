// handlers/ledger.rs - /spending and /income resources
//
// Both tables share one layout, so one impl serves both.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::api::payload::{CreateLedgerPayload, UpdateLedgerPayload};
use crate::database::models::{Income, Ledger, LedgerChanges, LedgerKind, NewLedgerEntry, Spending};
use crate::database::DynRepository;
use crate::error::ApiError;
use crate::handlers::resource::Resource;
use crate::state::AppState;

/// A ledger kind that the application state holds a repository for
pub trait LedgerResource: LedgerKind + Sized {
    fn repository(state: &AppState) -> &DynRepository<Ledger<Self>>;
}

impl LedgerResource for Spending {
    fn repository(state: &AppState) -> &DynRepository<Ledger<Self>> {
        &state.spending
    }
}

impl LedgerResource for Income {
    fn repository(state: &AppState) -> &DynRepository<Ledger<Self>> {
        &state.income
    }
}

#[async_trait]
impl<K: LedgerResource> Resource for Ledger<K> {
    const LABEL: &'static str = K::LABEL;
    const FILTER_BY_USER: bool = true;

    type CreatePayload = CreateLedgerPayload;
    type UpdatePayload = UpdateLedgerPayload;

    fn repository(state: &AppState) -> &DynRepository<Self> {
        <K as LedgerResource>::repository(state)
    }

    async fn prepare_new(_state: &AppState, payload: CreateLedgerPayload) -> Result<NewLedgerEntry, ApiError> {
        payload.validate()
    }

    async fn prepare_changes(_state: &AppState, payload: UpdateLedgerPayload) -> Result<LedgerChanges, ApiError> {
        payload.validate()
    }

    fn created_body(id: i32, _new: &NewLedgerEntry) -> Value {
        json!({
            "id": id,
            "message": format!("{} created successfully", K::LABEL),
        })
    }
}
