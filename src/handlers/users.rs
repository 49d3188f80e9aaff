// handlers/users.rs - /users resource
//
// Passwords arrive in plain text and leave this module only as bcrypt hashes.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::api::payload::{CreateUserPayload, UpdateUserPayload};
use crate::database::models::{NewUser, UserChanges, Users};
use crate::database::DynRepository;
use crate::error::ApiError;
use crate::handlers::resource::Resource;
use crate::state::AppState;

#[async_trait]
impl Resource for Users {
    const LABEL: &'static str = "User";
    const FILTER_BY_USER: bool = false;

    type CreatePayload = CreateUserPayload;
    type UpdatePayload = UpdateUserPayload;

    fn repository(state: &AppState) -> &DynRepository<Self> {
        &state.users
    }

    async fn prepare_new(state: &AppState, payload: CreateUserPayload) -> Result<NewUser, ApiError> {
        let input = payload.validate()?;
        let password = input.password.unwrap_or_default();
        let password_hash = state.hasher.hash(&password).await?;
        Ok(NewUser {
            username: input.username,
            password_hash,
        })
    }

    async fn prepare_changes(state: &AppState, payload: UpdateUserPayload) -> Result<UserChanges, ApiError> {
        let input = payload.validate()?;
        let password_hash = match input.password {
            Some(password) => Some(state.hasher.hash(&password).await?),
            None => None,
        };
        Ok(UserChanges {
            username: input.username,
            password_hash,
        })
    }

    fn created_body(id: i32, new: &NewUser) -> Value {
        json!({ "id": id, "username": new.username })
    }

    fn costly_to_prepare(payload: &UpdateUserPayload) -> bool {
        payload.password.as_deref().map_or(false, |p| !p.is_empty())
    }
}
