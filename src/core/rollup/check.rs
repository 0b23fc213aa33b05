//! At-rest verification of the derived cost fields

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::costs_match;
use super::propagate::mean;
use crate::core::identity::EntityId;
use crate::core::store::{Store, StoreError};

/// A derived field that disagrees with the values it is derived from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// total_cost != purchase_cost + material_cost
    NodeTotal {
        id: EntityId,
        expected: f64,
        found: f64,
    },
    /// material_cost != sum of line totals
    MaterialCost {
        id: EntityId,
        expected: f64,
        found: f64,
    },
    /// cost != mean of analog totals
    LineCost {
        id: EntityId,
        expected: f64,
        found: f64,
    },
    /// line_total != quantity * cost
    LineTotal {
        id: EntityId,
        expected: f64,
        found: f64,
    },
    /// An analog outside the line's declared family
    FamilyMismatch {
        line: EntityId,
        analog: EntityId,
    },
}

impl Violation {
    /// Family mismatches are advisory unless enforcement is on
    pub fn is_cost_error(&self) -> bool {
        !matches!(self, Violation::FamilyMismatch { .. })
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::NodeTotal { id, expected, found } => {
                write!(f, "{}: total_cost {} != purchase + material {}", id, found, expected)
            }
            Violation::MaterialCost { id, expected, found } => {
                write!(f, "{}: material_cost {} != sum of lines {}", id, found, expected)
            }
            Violation::LineCost { id, expected, found } => {
                write!(f, "{}: cost {} != analog mean {}", id, found, expected)
            }
            Violation::LineTotal { id, expected, found } => {
                write!(f, "{}: line_total {} != quantity x cost {}", id, found, expected)
            }
            Violation::FamilyMismatch { line, analog } => {
                write!(f, "{}: analog {} is outside the line's family", line, analog)
            }
        }
    }
}

/// Compare every stored derived field against its inputs
///
/// Uses stored values only; nothing is recomputed or written.
pub fn verify<S: Store>(store: &S) -> Result<Vec<Violation>, StoreError> {
    let nodes = store.nomenclatures()?;
    let by_id: HashMap<&EntityId, _> = nodes.iter().map(|n| (&n.id, n)).collect();
    let mut violations = Vec::new();

    for node in &nodes {
        let expected = node.purchase_cost + node.material_cost;
        if !costs_match(expected, node.total_cost) {
            violations.push(Violation::NodeTotal {
                id: node.id.clone(),
                expected,
                found: node.total_cost,
            });
        }

        let lines = store.lines_owned_by(&node.id)?;
        let material: f64 = lines.iter().map(|l| l.line_total).sum();
        if !costs_match(material, node.material_cost) {
            violations.push(Violation::MaterialCost {
                id: node.id.clone(),
                expected: material,
                found: node.material_cost,
            });
        }

        for line in &lines {
            let mut sum = 0.0;
            for analog in &line.analogs {
                match by_id.get(analog) {
                    Some(n) => {
                        sum += n.total_cost;
                        if n.family != line.family {
                            violations.push(Violation::FamilyMismatch {
                                line: line.id.clone(),
                                analog: analog.clone(),
                            });
                        }
                    }
                    None => return Err(StoreError::NotFound(analog.clone())),
                }
            }
            let cost = mean(sum, line.analogs.len());
            if !costs_match(cost, line.cost) {
                violations.push(Violation::LineCost {
                    id: line.id.clone(),
                    expected: cost,
                    found: line.cost,
                });
            }
            let total = line.quantity * line.cost;
            if !costs_match(total, line.line_total) {
                violations.push(Violation::LineTotal {
                    id: line.id.clone(),
                    expected: total,
                    found: line.line_total,
                });
            }
        }
    }

    Ok(violations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rollup::propagate::Propagator;
    use crate::core::store::MemoryStore;
    use crate::entities::{BomLine, ComponentFamily, Nomenclature};

    fn assembly(store: &mut MemoryStore) -> (Nomenclature, BomLine) {
        let family = ComponentFamily::new("Part");
        store.save_family(&family).unwrap();
        let part = Nomenclature::new(family.id.clone(), "USD").with_purchase_cost(2.0);
        let top = Nomenclature::new(family.id.clone(), "USD").with_purchase_cost(1.0);
        store.save_nomenclature(&part).unwrap();
        store.save_nomenclature(&top).unwrap();
        let line = BomLine::new(top.id.clone(), family.id.clone(), 3.0)
            .with_analogs(vec![part.id.clone()]);
        store.save_bom_line(&line).unwrap();
        (top, line)
    }

    #[test]
    fn test_stale_values_are_reported() {
        let mut store = MemoryStore::new();
        let (top, line) = assembly(&mut store);

        let found = verify(&store).unwrap();
        assert!(found
            .iter()
            .any(|v| matches!(v, Violation::LineCost { id, .. } if *id == line.id)));

        Propagator::new(&mut store, 16).propagate(&top.id).unwrap();
        assert!(verify(&store).unwrap().is_empty());
    }

    #[test]
    fn test_tampered_total_is_reported() {
        let mut store = MemoryStore::new();
        let (top, _) = assembly(&mut store);
        Propagator::new(&mut store, 16).propagate(&top.id).unwrap();

        store.write_node_costs(&top.id, 6.0, 99.0).unwrap();
        let found = verify(&store).unwrap();
        assert_eq!(found.len(), 1);
        assert!(matches!(&found[0], Violation::NodeTotal { id, .. } if *id == top.id));
        assert!(found[0].to_string().contains("total_cost 99"));
    }

    #[test]
    fn test_family_mismatch_is_advisory() {
        let mut store = MemoryStore::new();
        let (top, mut line) = assembly(&mut store);
        let other = ComponentFamily::new("Other");
        store.save_family(&other).unwrap();
        line.family = other.id.clone();
        store.save_bom_line(&line).unwrap();
        Propagator::new(&mut store, 16).propagate(&top.id).unwrap();

        let found = verify(&store).unwrap();
        assert_eq!(found.len(), 1);
        assert!(!found[0].is_cost_error());
    }
}
