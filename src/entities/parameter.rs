//! Technical parameter of a nomenclature (length, mass, rating, ...)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};

fn default_sequence() -> i32 {
    10
}

/// A named numeric value attached to one nomenclature
///
/// Parameters are descriptive only and never feed the cost rollup. They are
/// deleted together with their nomenclature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: EntityId,

    /// Owning nomenclature
    pub nomenclature: EntityId,

    pub name: String,

    pub value: f64,

    /// Unit the value is expressed in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uom: Option<EntityId>,

    /// Display order among the node's parameters
    #[serde(default = "default_sequence")]
    pub sequence: i32,

    pub created: DateTime<Utc>,
}

impl Parameter {
    pub fn new(nomenclature: EntityId, name: impl Into<String>, value: f64) -> Self {
        Self {
            id: EntityId::new(Self::PREFIX),
            nomenclature,
            name: name.into(),
            value,
            uom: None,
            sequence: default_sequence(),
            created: Utc::now(),
        }
    }

    pub fn with_uom(mut self, uom: EntityId) -> Self {
        self.uom = Some(uom);
        self
    }

    pub fn with_sequence(mut self, sequence: i32) -> Self {
        self.sequence = sequence;
        self
    }
}

impl Entity for Parameter {
    const PREFIX: EntityPrefix = EntityPrefix::Par;

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
    fn test_new_parameter_defaults() {
        let node = EntityId::new(EntityPrefix::Nom);
        let param = Parameter::new(node.clone(), "Length", 810.0);
        assert!(param.id.to_string().starts_with("PAR-"));
        assert_eq!(param.nomenclature, node);
        assert_eq!(param.sequence, 10);
        assert!(param.uom.is_none());
        assert_eq!(param.label(), "Length");
    }

    #[test]
    fn test_yaml_without_optional_fields() {
        let id = EntityId::new(EntityPrefix::Par);
        let node = EntityId::new(EntityPrefix::Nom);
        let yaml = format!(
            "id: {}\nnomenclature: {}\nname: Mass\nvalue: 1.5\ncreated: 2024-01-01T00:00:00Z\n",
            id, node
        );
        let param: Parameter = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(param.sequence, 10);
        assert_eq!(param.value, 1.5);
    }
}
