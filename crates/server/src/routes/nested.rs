//! Lookups across collections: cities of a country, reviews of a place.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use models::{EntityKind, Record};
use serde_json::Value;

use crate::errors::JsonApiError;
use crate::state::ServerState;

/// `GET /countries/:code/cities`
pub async fn cities_by_country(
    State(state): State<ServerState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<Record>>, JsonApiError> {
    let code = Value::String(code);
    let countries = state.store.find_by(EntityKind::Countries.collection(), "code", &code).await?;
    if countries.is_empty() {
        return Err(JsonApiError::new(StatusCode::NOT_FOUND, "Not Found", Some("Country not found".into())));
    }
    let cities = state.store.find_by(EntityKind::Cities.collection(), "country_code", &code).await?;
    Ok(Json(cities))
}

/// `GET /places/:id/reviews`
pub async fn reviews_by_place(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Record>>, JsonApiError> {
    state.store.get(EntityKind::Places.collection(), &id).await?;
    let reviews = state
        .store
        .find_by(EntityKind::Reviews.collection(), "place_id", &Value::String(id))
        .await?;
    Ok(Json(reviews))
}
