//! Unit of measure

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};

/// A unit of measure referenced by component families (pcs, m, kg, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitOfMeasure {
    pub id: EntityId,

    pub name: String,

    /// Rounding step for quantities expressed in this unit
    #[serde(default = "default_rounding")]
    pub rounding: f64,

    pub created: DateTime<Utc>,
}

fn default_rounding() -> f64 {
    0.01
}

impl UnitOfMeasure {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(Self::PREFIX),
            name: name.into(),
            rounding: default_rounding(),
            created: Utc::now(),
        }
    }

    pub fn with_rounding(mut self, rounding: f64) -> Self {
        self.rounding = rounding;
        self
    }
}

impl Entity for UnitOfMeasure {
    const PREFIX: EntityPrefix = EntityPrefix::Uom;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uom_defaults() {
        let uom = UnitOfMeasure::new("pcs");
        assert!(uom.id.to_string().starts_with("UOM-"));
        assert_eq!(uom.rounding, 0.01);
        assert_eq!(uom.label(), "pcs");
    }

    #[test]
    fn test_rounding_defaults_when_missing() {
        let id = EntityId::new(EntityPrefix::Uom);
        let yaml = format!("id: {}\nname: m\ncreated: 2024-01-01T00:00:00Z\n", id);
        let uom: UnitOfMeasure = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(uom.rounding, 0.01);
    }
}
