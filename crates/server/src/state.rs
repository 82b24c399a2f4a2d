use std::sync::Arc;

use service::PersistenceManager;

/// Shared handler state: the one store instance built at startup.
#[derive(Clone)]
pub struct ServerState {
    pub store: Arc<dyn PersistenceManager>,
}

impl ServerState {
    pub fn new(store: Arc<dyn PersistenceManager>) -> Self {
        Self { store }
    }
}
