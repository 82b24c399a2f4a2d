use async_trait::async_trait;
use models::Record;
use serde_json::Value;

use crate::data_manager::DataManager;
use crate::errors::ServiceError;

/// Transport-agnostic entry points into the record store.
/// Request handlers depend on this trait rather than on a concrete store.
#[async_trait]
pub trait PersistenceManager: Send + Sync {
    async fn save(&self, collection: &str, record: Record) -> Result<Record, ServiceError>;
    async fn get(&self, collection: &str, id: &str) -> Result<Record, ServiceError>;
    async fn get_all(&self, collection: &str) -> Result<Vec<Record>, ServiceError>;
    async fn update(
        &self,
        collection: &str,
        id: &str,
        partial: Record,
    ) -> Result<Record, ServiceError>;
    async fn delete(&self, collection: &str, id: &str) -> Result<(), ServiceError>;
    async fn find_by(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Record>, ServiceError>;
}

#[async_trait]
impl PersistenceManager for DataManager {
    async fn save(&self, collection: &str, record: Record) -> Result<Record, ServiceError> {
        self.save(collection, record).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Record, ServiceError> {
        self.get(collection, id).await
    }

    async fn get_all(&self, collection: &str) -> Result<Vec<Record>, ServiceError> {
        self.get_all(collection).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        partial: Record,
    ) -> Result<Record, ServiceError> {
        self.update(collection, id, partial).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), ServiceError> {
        self.delete(collection, id).await
    }

    async fn find_by(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Record>, ServiceError> {
        self.find_by(collection, field, value).await
    }
}
