//! Entity trait - common interface for all catalog record types

use serde::{de::DeserializeOwned, Serialize};

use crate::core::identity::{EntityId, EntityPrefix};

/// Common trait for all catalog records
pub trait Entity: Serialize + DeserializeOwned {
    /// The record type prefix (e.g., NOM, FAM)
    const PREFIX: EntityPrefix;

    /// Get the record's unique ID
    fn id(&self) -> &EntityId;

    /// Human-readable label used in listings and messages
    fn label(&self) -> String;

    /// Parse `key` as an id of this record type
    fn parse_id(key: &str) -> Option<EntityId> {
        EntityId::parse_as(key, Self::PREFIX).ok()
    }
}
