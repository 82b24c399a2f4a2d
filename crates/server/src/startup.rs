use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::{AppConfig, ServerConfig, StorageBackendKind, StorageConfig};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::routes;
use crate::state::ServerState;
use service::{
    runtime,
    seed::seed_default_countries,
    storage::{JsonFileStorage, MemoryStorage, StorageBackend},
    validators::ValidatorRegistry,
    DataManager,
};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Open the configured backend, load it and seed reference data.
pub async fn build_store(cfg: &StorageConfig) -> anyhow::Result<Arc<DataManager>> {
    let backend: Arc<dyn StorageBackend> = match cfg.backend {
        StorageBackendKind::Json => {
            if let Some(dir) = cfg.data_dir() {
                runtime::ensure_env(dir).await?;
            }
            info!(path = %cfg.path, "using JSON file storage");
            Arc::new(JsonFileStorage::new(&cfg.path).await?)
        }
        StorageBackendKind::Memory => {
            info!("using in-memory storage; records are lost on exit");
            Arc::new(MemoryStorage::new())
        }
    };

    let store = DataManager::open(backend, ValidatorRegistry::hbnb()).await?;
    if cfg.seed_countries {
        let inserted = seed_default_countries(&store).await?;
        if inserted > 0 {
            info!(inserted, "default countries seeded");
        }
    }
    for (collection, records) in store.counts().await {
        info!(%collection, records, "collection ready");
    }
    Ok(Arc::new(store))
}

fn load_bind_addr(cfg: &ServerConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address {}:{}: {e}", cfg.host, cfg.port)))
}

/// Build the router around an already opened store.
pub fn build_app(store: Arc<DataManager>) -> Router {
    routes::build_router(ServerState::new(store), build_cors())
}

/// Public entry: build the store and the app, then run the HTTP server
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let store = build_store(&cfg.storage).await?;
    let app = build_app(store);

    let addr = load_bind_addr(&cfg.server)?;
    info!(%addr, "starting record store server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
