//! Record and entity definitions shared by the service and server crates.
//! - `record`: the generic stored record and store-owned fields.
//! - `entity`: entity kinds with their field schemas, unique keys and references.

pub mod errors;
pub mod entity;
pub mod record;

pub use entity::{EntityKind, FieldSpec, FieldType, Reference};
pub use record::Record;
