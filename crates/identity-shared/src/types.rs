//! Common types

use uuid::Uuid;

/// Primary key type used by the application-level identity records.
pub type EntityId = Uuid;

pub fn new_id() -> EntityId {
    Uuid::new_v4()
}

/// Opaque token that changes whenever a record is persisted.
pub fn new_stamp() -> String {
    Uuid::new_v4().to_string()
}
