//! Reference data loaded into an empty store at startup.

use models::{EntityKind, Record};

use crate::data_manager::DataManager;
use crate::errors::ServiceError;

/// Countries available out of the box, keyed by their natural `code`.
pub fn default_countries() -> Vec<Record> {
    [("United States", "US"), ("Canada", "CA"), ("Mexico", "MX")]
        .into_iter()
        .map(|(name, code)| {
            let mut country = Record::new();
            country.insert("name", name);
            country.insert("code", code);
            country
        })
        .collect()
}

/// Insert the default countries that are not present yet.
pub async fn seed_default_countries(store: &DataManager) -> Result<usize, ServiceError> {
    store.seed(EntityKind::Countries.collection(), default_countries()).await
}
