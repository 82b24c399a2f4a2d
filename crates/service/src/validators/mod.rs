//! Pre-commit validators.
//!
//! Validators are pure checks over a candidate record with read-only access
//! to the live collections. The persistence core runs every validator
//! registered for a collection on each create and each update, always over
//! the full (merged) record.

use std::collections::HashMap;
use std::sync::Arc;

use models::{EntityKind, Record};

use crate::errors::ServiceError;
use crate::storage::{Collection, Collections};

pub mod geo;
pub mod reference;
pub mod schema;
pub mod unique;

pub use geo::GeoBounds;
pub use reference::ForeignKey;
pub use schema::SchemaValidator;
pub use unique::Unique;

/// Why a candidate record was refused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// A field or reference check failed.
    Invalid(String),
    /// A unique field collides with another record.
    Conflict(String),
}

impl Rejection {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid(reason.into())
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict(reason.into())
    }

    pub fn reason(&self) -> &str {
        match self {
            Rejection::Invalid(r) | Rejection::Conflict(r) => r,
        }
    }
}

impl From<Rejection> for ServiceError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Invalid(reason) => ServiceError::Validation(reason),
            Rejection::Conflict(reason) => ServiceError::DuplicateKey(reason),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode<'a> {
    Create,
    Update { id: &'a str },
}

/// Read-only view handed to validators.
#[derive(Clone, Copy)]
pub struct ValidationContext<'a> {
    pub collections: &'a Collections,
    pub collection: &'a str,
    pub mode: WriteMode<'a>,
}

impl<'a> ValidationContext<'a> {
    pub fn new(collections: &'a Collections, collection: &'a str, mode: WriteMode<'a>) -> Self {
        Self { collections, collection, mode }
    }

    pub fn collection(&self, name: &str) -> Option<&'a Collection> {
        self.collections.get(name)
    }

    /// Records of the target collection other than the one being updated.
    pub fn others(&self) -> impl Iterator<Item = &'a Record> + 'a {
        let skip = match self.mode {
            WriteMode::Update { id } => Some(id),
            WriteMode::Create => None,
        };
        self.collections
            .get(self.collection)
            .into_iter()
            .flat_map(|c| c.iter())
            .filter(move |(id, _)| Some(id.as_str()) != skip)
            .map(|(_, record)| record)
    }
}

pub trait Validator: Send + Sync {
    fn validate(&self, ctx: &ValidationContext<'_>, candidate: &Record) -> Result<(), Rejection>;
}

/// Collection name to the validators guarding it.
///
/// Only registered collections are writable through the persistence core.
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    rules: HashMap<String, Vec<Arc<dyn Validator>>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry for every entity kind with the full rule set of its schema.
    pub fn hbnb() -> Self {
        let mut registry = Self::new();
        for kind in EntityKind::ALL {
            registry.register_kind(kind);
        }
        registry
    }

    /// Register a collection without any validators.
    pub fn register_collection(&mut self, collection: impl Into<String>) -> &mut Self {
        self.rules.entry(collection.into()).or_default();
        self
    }

    pub fn add<V: Validator + 'static>(&mut self, collection: impl Into<String>, validator: V) -> &mut Self {
        self.rules.entry(collection.into()).or_default().push(Arc::new(validator));
        self
    }

    pub fn register_kind(&mut self, kind: EntityKind) -> &mut Self {
        let name = kind.collection();
        self.register_collection(name);
        self.add(name, SchemaValidator::new(kind));
        if kind.has_coordinates() {
            self.add(name, GeoBounds::default());
        }
        for key in kind.unique_keys() {
            self.add(name, Unique::new(key.iter().copied()));
        }
        for reference in kind.references() {
            self.add(name, ForeignKey::from(*reference));
        }
        self
    }

    pub fn contains(&self, collection: &str) -> bool {
        self.rules.contains_key(collection)
    }

    pub fn collections(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Run every validator of the context's collection; first failure wins.
    pub fn run(&self, ctx: &ValidationContext<'_>, candidate: &Record) -> Result<(), Rejection> {
        let Some(validators) = self.rules.get(ctx.collection) else {
            return Ok(());
        };
        validators.iter().try_for_each(|v| v.validate(ctx, candidate))
    }
}
