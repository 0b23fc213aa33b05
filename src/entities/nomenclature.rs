//! Nomenclature - a concrete part or assembly in the cost graph

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};

/// A concrete buyable or producible item
///
/// `purchase_cost` is the item's own cost. `material_cost` and `total_cost`
/// are derived by the rollup engine and must only be written by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nomenclature {
    pub id: EntityId,

    /// Owning component family
    pub family: EntityId,

    /// Execution name within the family (e.g. "DIN 933 zinc")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Reference code, unique across the catalog when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Currency code the costs are expressed in
    pub currency: String,

    /// Own cost (latest purchase price)
    #[serde(default)]
    pub purchase_cost: f64,

    /// Sum of BOM line totals
    #[serde(default)]
    pub material_cost: f64,

    /// purchase_cost + material_cost
    #[serde(default)]
    pub total_cost: f64,

    pub created: DateTime<Utc>,
}

impl Nomenclature {
    /// Create a leaf with zero cost in the given family
    pub fn new(family: EntityId, currency: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(Self::PREFIX),
            family,
            name: None,
            code: None,
            currency: currency.into(),
            purchase_cost: 0.0,
            material_cost: 0.0,
            total_cost: 0.0,
            created: Utc::now(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the own cost; a fresh record has no material cost yet
    pub fn with_purchase_cost(mut self, cost: f64) -> Self {
        self.purchase_cost = cost;
        self.total_cost = cost + self.material_cost;
        self
    }

    /// "<family> <name>", or whichever of the two is present
    pub fn fullname(&self, family_name: Option<&str>) -> String {
        match (family_name, self.name.as_deref()) {
            (Some(family), Some(name)) if !family.is_empty() && !name.is_empty() => {
                format!("{} {}", family, name)
            }
            (_, Some(name)) if !name.is_empty() => name.to_string(),
            (Some(family), _) => family.to_string(),
            _ => self.code.clone().unwrap_or_else(|| self.id.to_string()),
        }
    }
}

impl Entity for Nomenclature {
    const PREFIX: EntityPrefix = EntityPrefix::Nom;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> String {
        self.code
            .clone()
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| self.id.to_string())
    }
}
