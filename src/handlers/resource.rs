// handlers/resource.rs - generic CRUD handlers
//
// Each entity plugs into the five operations by implementing `Resource`;
// the handlers below never name a concrete table.

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Path, RawQuery, State},
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::api::payload::decode_body;
use crate::api::{ApiResponse, ApiResult};
use crate::database::{DynRepository, Entity};
use crate::error::ApiError;
use crate::state::AppState;

#[async_trait]
pub trait Resource: Entity + Sized {
    /// Singular label for messages, e.g. "User"
    const LABEL: &'static str;
    /// Whether listing honours the `user_id` query filter
    const FILTER_BY_USER: bool;

    type CreatePayload: DeserializeOwned + Send;
    type UpdatePayload: DeserializeOwned + Send;

    fn repository(state: &AppState) -> &DynRepository<Self>;

    /// Validate a create body and turn it into a storable row
    async fn prepare_new(state: &AppState, payload: Self::CreatePayload) -> Result<Self::New, ApiError>;

    /// Validate an update body and turn it into the replacement fields
    async fn prepare_changes(state: &AppState, payload: Self::UpdatePayload) -> Result<Self::Changes, ApiError>;

    /// Body returned by a successful create
    fn created_body(id: i32, new: &Self::New) -> Value;

    /// True when preparing `payload` is expensive (password hashing), so
    /// update confirms the row exists first
    fn costly_to_prepare(_payload: &Self::UpdatePayload) -> bool {
        false
    }
}

/// Request body as bytes, with extraction failures in the API error shape
fn body_bytes(body: Result<Bytes, BytesRejection>) -> Result<Bytes, ApiError> {
    body.map_err(ApiError::from)
}

fn not_found<R: Resource>() -> ApiError {
    ApiError::not_found(format!("{} not found", R::LABEL))
}

/// Path ids must be positive integers
fn parse_id<R: Resource>(raw: &str) -> Result<i32, ApiError> {
    match raw.parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::bad_request(format!("Invalid {} ID", R::LABEL.to_lowercase()))),
    }
}

/// `user_id` from a raw query string. Repeating the key is an error.
fn owner_filter(query: Option<&str>) -> Result<Option<i32>, ApiError> {
    let mut values = url::form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .filter(|(key, _)| key == "user_id")
        .map(|(_, value)| value);
    let first = values.next();
    if values.next().is_some() {
        return Err(ApiError::bad_request("Invalid user_id parameter"));
    }
    parse_owner(first.as_deref())
}

/// Optional `user_id` filter; an empty value counts as absent
fn parse_owner(raw: Option<&str>) -> Result<Option<i32>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v
            .parse::<i32>()
            .map(Some)
            .map_err(|_| ApiError::bad_request("Invalid user_id parameter")),
    }
}

/// POST /{resource}
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Value> {
    let payload: R::CreatePayload = decode_body(&body_bytes(body)?)?;
    let new = R::prepare_new(&state, payload).await?;
    let id = R::repository(&state).insert(&new).await?;

    tracing::info!("Created {} {}", R::LABEL, id);
    Ok(ApiResponse::created(R::created_body(id, &new)))
}

/// GET /{resource}/:id
pub async fn get_one<R: Resource>(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<R::Record> {
    let id = parse_id::<R>(&raw_id)?;
    match R::repository(&state).find(id).await? {
        Some(record) => Ok(ApiResponse::success(record)),
        None => Err(not_found::<R>()),
    }
}

/// GET /{resource}[?user_id=N]
pub async fn list<R: Resource>(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<Vec<R::Record>> {
    let owner = if R::FILTER_BY_USER {
        owner_filter(query.as_deref())?
    } else {
        None
    };
    let records = R::repository(&state).list(owner).await?;
    Ok(ApiResponse::success(records))
}

/// PUT /{resource}/:id
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Value> {
    let id = parse_id::<R>(&raw_id)?;
    let repository = R::repository(&state);

    let decoded = body_bytes(body).and_then(|bytes| decode_body::<R::UpdatePayload>(&bytes));
    let prepared = match decoded {
        Ok(payload) => {
            if R::costly_to_prepare(&payload) && repository.find(id).await?.is_none() {
                return Err(not_found::<R>());
            }
            R::prepare_changes(&state, payload).await
        }
        Err(err) => Err(err),
    };
    let changes = match prepared {
        Ok(changes) => changes,
        // A missing record outranks a bad body
        Err(err) if err.is_client_error() => {
            if repository.find(id).await?.is_none() {
                return Err(not_found::<R>());
            }
            return Err(err);
        }
        Err(err) => return Err(err),
    };

    if repository.update(id, &changes).await? == 0 {
        return Err(not_found::<R>());
    }

    tracing::info!("Updated {} {}", R::LABEL, id);
    Ok(ApiResponse::success(json!({
        "message": format!("{} updated successfully", R::LABEL)
    })))
}

/// DELETE /{resource}/:id
pub async fn delete<R: Resource>(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id::<R>(&raw_id)?;
    if R::repository(&state).delete(id).await? == 0 {
        return Err(not_found::<R>());
    }

    tracing::info!("Deleted {} {}", R::LABEL, id);
    Ok(ApiResponse::success(json!({
        "message": format!("{} deleted successfully", R::LABEL)
    })))
}
