use std::net::SocketAddr;
use std::path::Path;

use configs::{StorageBackendKind, StorageConfig};
use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use server::startup::{build_app, build_store};
use tokio::net::TcpListener;
use uuid::Uuid;

struct TestApp {
    base_url: String,
}

fn storage_config(path: &Path) -> StorageConfig {
    StorageConfig {
        backend: StorageBackendKind::Json,
        path: path.to_string_lossy().into_owned(),
        seed_countries: true,
    }
}

async fn start_server(path: &Path) -> anyhow::Result<TestApp> {
    let store = build_store(&storage_config(path)).await?;
    let app = build_app(store);
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(TestApp { base_url })
}

#[tokio::test]
async fn e2e_records_survive_restart() -> anyhow::Result<()> {
    let dir = std::env::temp_dir().join(format!("hbnb_e2e_{}", Uuid::new_v4()));
    let path = dir.join("storage.json");
    let client = reqwest::Client::new();

    let app = start_server(&path).await?;
    let res = client.get(format!("{}/health", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    let res = client
        .post(format!("{}/users", app.base_url))
        .json(&json!({"email": "e2e@example.com", "first_name": "End", "last_name": "ToEnd"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);
    let user: Value = res.json().await?;
    let user_id = user["id"].as_str().expect("id").to_string();

    let res = client
        .post(format!("{}/cities", app.base_url))
        .json(&json!({"name": "Guadalajara", "country_code": "MX"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);

    // a second server on the same file plays the restarted process
    let restarted = start_server(&path).await?;
    let res = client.get(format!("{}/users/{}", restarted.base_url, user_id)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert_eq!(res.json::<Value>().await?, user);

    let cities: Value = client
        .get(format!("{}/countries/MX/cities", restarted.base_url))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(cities.as_array().map(Vec::len), Some(1));

    let countries: Value = client.get(format!("{}/countries", restarted.base_url)).send().await?.json().await?;
    assert_eq!(countries.as_array().map(Vec::len), Some(3));

    let _ = tokio::fs::remove_dir_all(&dir).await;
    Ok(())
}
