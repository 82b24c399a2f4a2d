use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::get,
    Json, Router,
};
use models::EntityKind;
use serde_json::Value;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;

use crate::state::ServerState;

pub mod nested;
pub mod records;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// `/{collection}` and `/{collection}/:id` for one entity kind.
fn collection_routes(router: Router<ServerState>, kind: EntityKind) -> Router<ServerState> {
    let name = kind.collection();
    router
        .route(
            &format!("/{name}"),
            get(move |State(state): State<ServerState>| records::list(state, name)).post(
                move |State(state): State<ServerState>, payload: Result<Json<Value>, JsonRejection>| {
                    records::create(state, name, payload)
                },
            ),
        )
        .route(
            &format!("/{name}/:id"),
            get(move |State(state): State<ServerState>, Path(id): Path<String>| records::get(state, kind, id))
                .put(
                    move |State(state): State<ServerState>,
                          Path(id): Path<String>,
                          payload: Result<Json<Value>, JsonRejection>| {
                        records::update(state, name, id, payload)
                    },
                )
                .delete(move |State(state): State<ServerState>, Path(id): Path<String>| {
                    records::delete(state, name, id)
                }),
        )
}

/// Build the full application router
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let mut router = Router::new().route("/health", get(health));
    for kind in EntityKind::ALL {
        router = collection_routes(router, kind);
    }

    // path params share the `:id` name with the CRUD routes above
    router
        .route("/countries/:id/cities", get(nested::cities_by_country))
        .route("/places/:id/reviews", get(nested::reviews_by_place))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
