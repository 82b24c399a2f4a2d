//! Generic CRUD handlers shared by every collection.

use axum::{extract::rejection::JsonRejection, http::StatusCode, Json};
use models::{EntityKind, Record};
use serde_json::Value;
use service::ServiceError;

use crate::errors::JsonApiError;
use crate::state::ServerState;

/// Decode a JSON body into a record, turning every decoding problem into a 400.
fn decode(payload: Result<Json<Value>, JsonRejection>) -> Result<Record, JsonApiError> {
    let Json(value) = payload.map_err(|e| JsonApiError::bad_request(e.body_text()))?;
    Record::from_value(value).map_err(|e| JsonApiError::bad_request(e.to_string()))
}

pub async fn create(
    state: ServerState,
    collection: &'static str,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Record>), JsonApiError> {
    let record = decode(payload)?;
    let saved = state.store.save(collection, record).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn list(state: ServerState, collection: &'static str) -> Result<Json<Vec<Record>>, JsonApiError> {
    Ok(Json(state.store.get_all(collection).await?))
}

/// Fetch by id; kinds with a natural key (countries by `code`) also resolve by it.
pub async fn get(state: ServerState, kind: EntityKind, id: String) -> Result<Json<Record>, JsonApiError> {
    let collection = kind.collection();
    match state.store.get(collection, &id).await {
        Err(ServiceError::NotFound(msg)) => {
            let Some(field) = kind.natural_key() else {
                return Err(ServiceError::NotFound(msg).into());
            };
            let found = state.store.find_by(collection, field, &Value::String(id)).await?;
            found
                .into_iter()
                .next()
                .map(Json)
                .ok_or_else(|| ServiceError::NotFound(msg).into())
        }
        other => Ok(Json(other?)),
    }
}

pub async fn update(
    state: ServerState,
    collection: &'static str,
    id: String,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Record>, JsonApiError> {
    let partial = decode(payload)?;
    if partial.is_empty() {
        return Err(JsonApiError::bad_request("No data provided"));
    }
    Ok(Json(state.store.update(collection, &id, partial).await?))
}

pub async fn delete(state: ServerState, collection: &'static str, id: String) -> Result<StatusCode, JsonApiError> {
    state.store.delete(collection, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
