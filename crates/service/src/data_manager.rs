//! Persistence core.
//!
//! # Responsibility
//! - Own every collection in memory behind one lock.
//! - Run the registered validators before any record is committed.
//! - Flush the backend once per committed mutation, before returning.
//!
//! # Invariants
//! - Mutations hold the write lock across validate, mutate and flush.
//! - A failed validation or flush leaves the in-memory state exactly as it
//!   was before the call.
//! - `id` and `created_at` never change after creation.

use std::sync::Arc;

use models::record::{new_id, now_timestamp, CREATED_AT, ID, UPDATED_AT};
use models::Record;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::errors::ServiceError;
use crate::storage::{Collection, Collections, StorageBackend};
use crate::validators::{Rejection, ValidationContext, ValidatorRegistry, WriteMode};

/// Attempts at drawing a fresh identifier before giving up.
const MAX_ID_ATTEMPTS: usize = 8;

pub struct DataManager {
    state: RwLock<Collections>,
    backend: Arc<dyn StorageBackend>,
    validators: ValidatorRegistry,
}

impl DataManager {
    /// Load the backend once and build the store around it.
    pub async fn open(
        backend: Arc<dyn StorageBackend>,
        validators: ValidatorRegistry,
    ) -> Result<Self, ServiceError> {
        let collections = backend.load().await?;
        for (name, collection) in &collections {
            if !validators.contains(name) {
                warn!(collection = %name, "loaded collection is not registered; kept on disk but not served");
            }
            debug!(collection = %name, records = collection.len(), "collection loaded");
        }
        Ok(Self { state: RwLock::new(collections), backend, validators })
    }

    fn ensure_known(&self, collection: &str) -> Result<(), ServiceError> {
        if self.validators.contains(collection) {
            Ok(())
        } else {
            Err(ServiceError::unknown_collection(collection))
        }
    }

    /// Create a record.
    ///
    /// Without an `id` the store draws one and sets both timestamps to now.
    /// A caller-chosen `id` keeps any timestamps supplied with it.
    pub async fn save(&self, collection: &str, mut record: Record) -> Result<Record, ServiceError> {
        self.ensure_known(collection)?;
        check_caller_fields(&record)?;

        let mut state = self.state.write().await;
        let existing = state.get(collection);
        let now = now_timestamp();
        let id = match record.id().map(str::to_string) {
            Some(id) => {
                if existing.is_some_and(|c| c.contains_key(&id)) {
                    return Err(ServiceError::DuplicateKey(format!("{collection}/{id} already exists")));
                }
                record.stamp_created(&now);
                id
            }
            None => {
                let id = fresh_id(collection, existing)?;
                record.stamp_new(&now);
                id
            }
        };
        record.set_id(id.clone());

        let ctx = ValidationContext::new(&state, collection, WriteMode::Create);
        self.validators.run(&ctx, &record).map_err(|r| rejected(collection, &id, r))?;

        let created_collection = !state.contains_key(collection);
        state.entry(collection.to_string()).or_default().insert(id.clone(), record.clone());

        if let Err(e) = self.backend.flush(&state).await {
            if created_collection {
                state.remove(collection);
            } else if let Some(c) = state.get_mut(collection) {
                c.remove(&id);
            }
            error!(collection, %id, error = %e, "flush failed; save rolled back");
            return Err(e);
        }
        info!(collection, %id, "record saved");
        Ok(record)
    }

    /// Fetch one record.
    pub async fn get(&self, collection: &str, id: &str) -> Result<Record, ServiceError> {
        self.ensure_known(collection)?;
        let state = self.state.read().await;
        state
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned()
            .ok_or_else(|| ServiceError::not_found(collection, id))
    }

    /// Snapshot of every record in a collection, in no particular order.
    pub async fn get_all(&self, collection: &str) -> Result<Vec<Record>, ServiceError> {
        self.ensure_known(collection)?;
        let state = self.state.read().await;
        Ok(state.get(collection).map(|c| c.values().cloned().collect()).unwrap_or_default())
    }

    /// Records whose `field` equals `value`. Linear scan.
    pub async fn find_by(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Record>, ServiceError> {
        self.ensure_known(collection)?;
        let state = self.state.read().await;
        Ok(state
            .get(collection)
            .map(|c| c.values().filter(|r| r.get(field) == Some(value)).cloned().collect())
            .unwrap_or_default())
    }

    /// Merge `partial` into an existing record and re-validate the result.
    pub async fn update(&self, collection: &str, id: &str, partial: Record) -> Result<Record, ServiceError> {
        self.ensure_known(collection)?;
        if let Some(given) = partial.get(ID) {
            if given.as_str() != Some(id) {
                return Err(ServiceError::Validation("id is immutable".into()));
            }
        }

        let mut state = self.state.write().await;
        let previous = state
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned()
            .ok_or_else(|| ServiceError::not_found(collection, id))?;

        let mut merged = previous.clone();
        merged.merge(&partial);
        merged.touch(&now_timestamp());

        let ctx = ValidationContext::new(&state, collection, WriteMode::Update { id });
        self.validators.run(&ctx, &merged).map_err(|r| rejected(collection, id, r))?;

        let records = state.entry(collection.to_string()).or_default();
        records.insert(id.to_string(), merged.clone());

        if let Err(e) = self.backend.flush(&state).await {
            state.entry(collection.to_string()).or_default().insert(id.to_string(), previous);
            error!(collection, id, error = %e, "flush failed; update rolled back");
            return Err(e);
        }
        info!(collection, id, fields = partial.len(), "record updated");
        Ok(merged)
    }

    /// Remove a record. Records referencing it are left as they are.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), ServiceError> {
        self.ensure_known(collection)?;
        let mut state = self.state.write().await;
        let removed = state
            .get_mut(collection)
            .and_then(|c| c.remove(id))
            .ok_or_else(|| ServiceError::not_found(collection, id))?;

        if let Err(e) = self.backend.flush(&state).await {
            state.entry(collection.to_string()).or_default().insert(id.to_string(), removed);
            error!(collection, id, error = %e, "flush failed; delete rolled back");
            return Err(e);
        }
        info!(collection, id, "record deleted");
        Ok(())
    }

    /// Insert records not already present, committing them with one flush.
    ///
    /// Records that collide on a unique key are skipped; any other rejection
    /// aborts the whole batch. Returns how many records were inserted.
    pub async fn seed(&self, collection: &str, records: Vec<Record>) -> Result<usize, ServiceError> {
        self.ensure_known(collection)?;
        let mut state = self.state.write().await;
        let before: Option<Collection> = state.get(collection).cloned();
        let restore = |state: &mut Collections| match &before {
            Some(c) => {
                state.insert(collection.to_string(), c.clone());
            }
            None => {
                state.remove(collection);
            }
        };

        let now = now_timestamp();
        let mut inserted = 0;
        for mut record in records {
            if let Err(e) = check_caller_fields(&record) {
                restore(&mut *state);
                return Err(e);
            }
            let id = match record.id().map(str::to_string) {
                Some(id) if state.get(collection).is_some_and(|c| c.contains_key(&id)) => continue,
                Some(id) => {
                    record.stamp_created(&now);
                    id
                }
                None => match fresh_id(collection, state.get(collection)) {
                    Ok(id) => {
                        record.stamp_new(&now);
                        id
                    }
                    Err(e) => {
                        restore(&mut *state);
                        return Err(e);
                    }
                },
            };
            record.set_id(id.clone());

            let ctx = ValidationContext::new(&state, collection, WriteMode::Create);
            match self.validators.run(&ctx, &record) {
                Ok(()) => {}
                Err(Rejection::Conflict(reason)) => {
                    debug!(collection, %reason, "seed record already present");
                    continue;
                }
                Err(rejection) => {
                    restore(&mut *state);
                    return Err(rejected(collection, &id, rejection));
                }
            }
            state.entry(collection.to_string()).or_default().insert(id, record);
            inserted += 1;
        }

        if inserted == 0 {
            return Ok(0);
        }
        if let Err(e) = self.backend.flush(&state).await {
            restore(&mut *state);
            error!(collection, error = %e, "flush failed; seed rolled back");
            return Err(e);
        }
        info!(collection, inserted, "collection seeded");
        Ok(inserted)
    }

    /// Number of records per collection, for startup logging.
    pub async fn counts(&self) -> Vec<(String, usize)> {
        let state = self.state.read().await;
        let mut counts: Vec<_> = self
            .validators
            .collections()
            .map(|name| (name.to_string(), state.get(name).map_or(0, |c| c.len())))
            .collect();
        counts.sort();
        counts
    }
}

/// Store-owned fields a caller may send on create must be well-formed.
fn check_caller_fields(record: &Record) -> Result<(), ServiceError> {
    if record.contains(ID) {
        match record.id() {
            None => return Err(ServiceError::Validation("id must be a string".into())),
            Some(id) if id.trim().is_empty() => {
                return Err(ServiceError::Validation("id must not be empty".into()));
            }
            Some(_) => {}
        }
    }
    for field in [CREATED_AT, UPDATED_AT] {
        if record.contains(field) && record.get_str(field).is_none() {
            return Err(ServiceError::Validation(format!("{field} must be a string")));
        }
    }
    Ok(())
}

fn fresh_id(collection: &str, existing: Option<&Collection>) -> Result<String, ServiceError> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let id = new_id();
        if !existing.is_some_and(|c| c.contains_key(&id)) {
            return Ok(id);
        }
        warn!(collection, %id, "generated id collided; retrying");
    }
    Err(ServiceError::DuplicateKey(format!(
        "could not generate a free id in {collection} after {MAX_ID_ATTEMPTS} attempts"
    )))
}

fn rejected(collection: &str, id: &str, rejection: Rejection) -> ServiceError {
    debug!(collection, id, reason = rejection.reason(), "record rejected");
    rejection.into()
}
