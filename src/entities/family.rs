//! Component family - a grouping of interchangeable parts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};

/// A component family such as "M8 Bolt"
///
/// Any nomenclature belonging to the family is a valid analog for a BOM line
/// that declares this family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentFamily {
    pub id: EntityId,

    /// Family name, unique across the catalog
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uom: Option<EntityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<EntityId>,

    pub created: DateTime<Utc>,
}

impl ComponentFamily {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(Self::PREFIX),
            name: name.into(),
            uom: None,
            category: None,
            created: Utc::now(),
        }
    }

    pub fn with_uom(mut self, uom: EntityId) -> Self {
        self.uom = Some(uom);
        self
    }

    pub fn with_category(mut self, category: EntityId) -> Self {
        self.category = Some(category);
        self
    }
}

impl Entity for ComponentFamily {
    const PREFIX: EntityPrefix = EntityPrefix::Fam;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}
