//! BOM line - one parent, a family, and a set of interchangeable analogs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};

fn default_sequence() -> i32 {
    10
}

/// A BOM line of a parent nomenclature
///
/// The line's unit cost is the mean total cost of its analogs; `cost` and
/// `line_total` are derived and written only by the rollup engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomLine {
    pub id: EntityId,

    /// Owning nomenclature (the assembly)
    pub parent: EntityId,

    /// Declared family of the analogs
    pub family: EntityId,

    /// Interchangeable executions; duplicates are dropped
    #[serde(default)]
    pub analogs: Vec<EntityId>,

    pub quantity: f64,

    /// Display order within the parent's BOM
    #[serde(default = "default_sequence")]
    pub sequence: i32,

    /// Mean total cost of the analogs, 0 when there are none
    #[serde(default)]
    pub cost: f64,

    /// quantity * cost
    #[serde(default)]
    pub line_total: f64,

    pub created: DateTime<Utc>,
}

impl BomLine {
    pub fn new(parent: EntityId, family: EntityId, quantity: f64) -> Self {
        Self {
            id: EntityId::new(Self::PREFIX),
            parent,
            family,
            analogs: Vec::new(),
            quantity,
            sequence: default_sequence(),
            cost: 0.0,
            line_total: 0.0,
            created: Utc::now(),
        }
    }

    pub fn with_analogs(mut self, analogs: impl IntoIterator<Item = EntityId>) -> Self {
        self.set_analogs(analogs);
        self
    }

    pub fn with_sequence(mut self, sequence: i32) -> Self {
        self.sequence = sequence;
        self
    }

    /// Replace the analog set, keeping first-seen order
    pub fn set_analogs(&mut self, analogs: impl IntoIterator<Item = EntityId>) {
        self.analogs.clear();
        for id in analogs {
            if !self.analogs.contains(&id) {
                self.analogs.push(id);
            }
        }
    }
}

impl Entity for BomLine {
    const PREFIX: EntityPrefix = EntityPrefix::Bom;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> String {
        format!("{} x{}", self.id, self.quantity)
    }
}

/// A field-level edit of an existing BOM line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BomLinePatch {
    pub quantity: Option<f64>,
    pub analogs: Option<Vec<EntityId>>,
    pub parent: Option<EntityId>,
    pub family: Option<EntityId>,
    pub sequence: Option<i32>,
}

impl BomLinePatch {
    /// True when the edit touches a field that feeds the cost rollup
    pub fn affects_cost(&self) -> bool {
        self.quantity.is_some()
            || self.analogs.is_some()
            || self.parent.is_some()
            || self.family.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.affects_cost() && self.sequence.is_none()
    }

    /// Apply the edit to a copy of the line
    pub fn apply_to(&self, line: &BomLine) -> BomLine {
        let mut updated = line.clone();
        if let Some(quantity) = self.quantity {
            updated.quantity = quantity;
        }
        if let Some(ref analogs) = self.analogs {
            updated.set_analogs(analogs.iter().cloned());
        }
        if let Some(ref parent) = self.parent {
            updated.parent = parent.clone();
        }
        if let Some(ref family) = self.family {
            updated.family = family.clone();
        }
        if let Some(sequence) = self.sequence {
            updated.sequence = sequence;
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<EntityId> {
        (0..n).map(|_| EntityId::new(EntityPrefix::Nom)).collect()
    }

    #[test]
    fn test_new_line_defaults() {
        let line = BomLine::new(
            EntityId::new(EntityPrefix::Nom),
            EntityId::new(EntityPrefix::Fam),
            4.0,
        );
        assert!(line.id.to_string().starts_with("BOM-"));
        assert_eq!(line.sequence, 10);
        assert!(line.analogs.is_empty());
        assert_eq!(line.cost, 0.0);
    }

    #[test]
    fn test_analogs_are_deduplicated_in_order() {
        let n = ids(2);
        let line = BomLine::new(
            EntityId::new(EntityPrefix::Nom),
            EntityId::new(EntityPrefix::Fam),
            1.0,
        )
        .with_analogs(vec![n[1].clone(), n[0].clone(), n[1].clone()]);
        assert_eq!(line.analogs, vec![n[1].clone(), n[0].clone()]);
    }

    #[test]
    fn test_sequence_only_patch_does_not_affect_cost() {
        let patch = BomLinePatch {
            sequence: Some(5),
            ..Default::default()
        };
        assert!(!patch.affects_cost());
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_patch_apply() {
        let n = ids(1);
        let line = BomLine::new(
            EntityId::new(EntityPrefix::Nom),
            EntityId::new(EntityPrefix::Fam),
            1.0,
        );
        let patch = BomLinePatch {
            quantity: Some(3.0),
            analogs: Some(vec![n[0].clone()]),
            ..Default::default()
        };
        let updated = patch.apply_to(&line);
        assert_eq!(updated.quantity, 3.0);
        assert_eq!(updated.analogs, n);
        assert_eq!(updated.parent, line.parent);
        assert!(patch.affects_cost());
    }
}
