use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use configs::{StorageBackendKind, StorageConfig};
use serde_json::{json, Value};
use server::startup::{build_app, build_store};
use tower::ServiceExt;

async fn app() -> Router {
    let cfg = StorageConfig { backend: StorageBackendKind::Memory, path: String::new(), seed_countries: true };
    let store = build_store(&cfg).await.expect("store");
    build_app(store)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");
    send_raw(app, req).await
}

async fn send_raw(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.expect("response");
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.expect("body");
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    (status, value)
}

fn new_user(email: &str) -> Value {
    json!({"email": email, "first_name": "Test", "last_name": "User"})
}

#[tokio::test]
async fn health_ok() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn user_crud_status_codes() {
    let app = app().await;

    let (status, created) = send(&app, Method::POST, "/users", Some(new_user("crud@example.com"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().expect("id").to_string();
    assert_eq!(created["created_at"], created["updated_at"]);

    let (status, list) = send(&app, Method::GET, "/users", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    let (status, fetched) = send(&app, Method::GET, &format!("/users/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, updated) =
        send(&app, Method::PUT, &format!("/users/{id}"), Some(json!({"first_name": "Renamed"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["first_name"], "Renamed");
    assert_eq!(updated["email"], "crud@example.com");
    assert_eq!(updated["created_at"], created["created_at"]);

    let (status, _) = send(&app, Method::DELETE, &format!("/users/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, Method::GET, &format!("/users/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
    let (status, _) = send(&app, Method::DELETE, &format!("/users/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_validation_and_conflicts() {
    let app = app().await;

    let (status, body) =
        send(&app, Method::POST, "/users", Some(json!({"email": "x@example.com", "first_name": "X"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap_or_default().contains("last_name"));

    let (status, _) = send(&app, Method::POST, "/users", Some(new_user("not-an-email"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::POST, "/users", Some(new_user("dup@example.com"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = send(&app, Method::POST, "/users", Some(new_user("dup@example.com"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Conflict");
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let app = app().await;

    let req = Request::builder()
        .method(Method::POST)
        .uri("/amenities")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .expect("request");
    let (status, _) = send_raw(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::POST, "/amenities", Some(json!(["Wifi"]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, amenity) = send(&app, Method::POST, "/amenities", Some(json!({"name": "Wifi"}))).await;
    let id = amenity["id"].as_str().expect("id");
    let (status, body) = send(&app, Method::PUT, &format!("/amenities/{id}"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No data provided");
}

#[tokio::test]
async fn cities_need_a_known_country_and_unique_name_per_country() {
    let app = app().await;

    let (status, _) =
        send(&app, Method::POST, "/cities", Some(json!({"name": "X", "country_code": "ZZ"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let city = json!({"name": "Austin", "country_code": "US"});
    let (status, _) = send(&app, Method::POST, "/cities", Some(city.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, Method::POST, "/cities", Some(city)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) =
        send(&app, Method::POST, "/cities", Some(json!({"name": "Austin", "country_code": "CA"}))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, cities) = send(&app, Method::GET, "/countries/US/cities", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cities.as_array().map(Vec::len), Some(1));
    let (status, _) = send(&app, Method::GET, "/countries/ZZ/cities", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn places_enforce_bounds_and_references() {
    let app = app().await;
    let (_, host) = send(&app, Method::POST, "/users", Some(new_user("host@example.com"))).await;
    let (_, city) = send(&app, Method::POST, "/cities", Some(json!({"name": "Toronto", "country_code": "CA"}))).await;
    let (_, wifi) = send(&app, Method::POST, "/amenities", Some(json!({"name": "Wifi"}))).await;

    let mut place = json!({
        "name": "Cabin", "description": "Quiet", "host_id": host["id"], "city_id": city["id"],
        "latitude": 95, "longitude": 0,
        "number_of_rooms": 2, "number_of_bathrooms": 1, "max_guests": 4,
        "price_per_night": 120.0, "amenity_ids": [wifi["id"]]
    });
    let (status, _) = send(&app, Method::POST, "/places", Some(place.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    place["latitude"] = json!(90);
    place["longitude"] = json!(180);
    let (status, created) = send(&app, Method::POST, "/places", Some(place.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let place_id = created["id"].as_str().expect("id").to_string();

    place["amenity_ids"] = json!(["missing"]);
    let (status, _) = send(&app, Method::POST, "/places", Some(place)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) =
        send(&app, Method::PUT, &format!("/places/{place_id}"), Some(json!({"max_guests": -1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, unchanged) = send(&app, Method::GET, &format!("/places/{place_id}"), None).await;
    assert_eq!(unchanged, created);

    let review = json!({"place_id": place_id, "user_id": host["id"], "rating": 5, "text": "Great place!"});
    let (status, _) = send(&app, Method::POST, "/reviews", Some(review)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, reviews) = send(&app, Method::GET, &format!("/places/{place_id}/reviews"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviews.as_array().map(Vec::len), Some(1));
    let (status, _) = send(&app, Method::GET, "/places/nope/reviews", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_collection_is_not_routed() {
    let app = app().await;
    let (status, _) = send(&app, Method::GET, "/bookings", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn countries_resolve_by_id_or_code() {
    let app = app().await;

    let (status, us) = send(&app, Method::GET, "/countries/US", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(us["code"], "US");
    assert_eq!(us["name"], "United States");

    let id = us["id"].as_str().expect("id");
    let (status, by_id) = send(&app, Method::GET, &format!("/countries/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_id, us);

    let (status, body) = send(&app, Method::GET, "/countries/ZZ", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");

    // only countries carry a natural key
    let (status, _) = send(&app, Method::GET, "/users/US", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
