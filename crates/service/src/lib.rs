//! Service layer: the record store behind the HTTP handlers.
//! - `storage`: durability backends (in-memory, JSON file).
//! - `validators`: pre-commit checks over candidate records.
//! - `data_manager`: the persistence core tying both together.
//! - `persistence`: the trait handlers call through.

pub mod errors;
pub mod runtime;
pub mod storage;
pub mod validators;
pub mod data_manager;
pub mod persistence;
pub mod seed;

pub use data_manager::DataManager;
pub use errors::ServiceError;
pub use persistence::PersistenceManager;
