//! Mapping of catalog mutations onto root discovery and propagation

use serde::Serialize;

use super::propagate::Propagator;
use super::roots::find_roots;
use super::RollupError;
use crate::core::identity::EntityId;
use crate::core::store::Store;

/// A mutation that can change derived costs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    LineCreated { parent: EntityId },
    /// A cost-relevant field of a line changed; `before` differs from
    /// `after` only when the line moved to another parent
    LineChanged { before: EntityId, after: EntityId },
    /// Emitted after the line is gone, with the parent it had
    LineDeleted { parent: EntityId },
    PurchaseCostChanged { node: EntityId },
}

impl ChangeEvent {
    /// Nodes whose totals are directly affected
    pub fn seeds(&self) -> Vec<EntityId> {
        match self {
            ChangeEvent::LineCreated { parent } | ChangeEvent::LineDeleted { parent } => {
                vec![parent.clone()]
            }
            ChangeEvent::LineChanged { before, after } if before != after => {
                vec![after.clone(), before.clone()]
            }
            ChangeEvent::LineChanged { after, .. } => vec![after.clone()],
            ChangeEvent::PurchaseCostChanged { node } => vec![node.clone()],
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ChangeEvent::LineCreated { .. } => "line_created",
            ChangeEvent::LineChanged { .. } => "line_changed",
            ChangeEvent::LineDeleted { .. } => "line_deleted",
            ChangeEvent::PurchaseCostChanged { .. } => "purchase_cost_changed",
        }
    }
}

/// Fresh total of one root after a rollup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RootTotal {
    pub id: EntityId,
    pub total_cost: f64,
}

/// What a rollup touched
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RollupOutcome {
    pub roots: Vec<RootTotal>,
    pub recomputed: usize,
}

/// Bring every assembly above `event` up to date
pub fn on_change<S: Store>(
    store: &mut S,
    event: &ChangeEvent,
    max_depth: usize,
) -> Result<RollupOutcome, RollupError> {
    tracing::debug!(event = event.name(), "cost trigger");
    propagate_from(store, event.seeds(), max_depth)
}

/// Find the roots above `seeds` and propagate each of them
///
/// Roots are processed in id order with one shared memo, so a sub-assembly
/// under several roots is recomputed once.
pub fn propagate_from<S, I>(
    store: &mut S,
    seeds: I,
    max_depth: usize,
) -> Result<RollupOutcome, RollupError>
where
    S: Store,
    I: IntoIterator<Item = EntityId>,
{
    let roots = find_roots(&*store, seeds)?;

    // Seeds may name a node that no longer exists (a parent deleted with
    // its lines); there is nothing above it to update.
    let mut live = Vec::with_capacity(roots.len());
    for root in roots {
        if store.nomenclature(&root)?.is_some() {
            live.push(root);
        } else {
            tracing::debug!(node = %root, "skipping vanished root");
        }
    }

    let mut propagator = Propagator::new(store, max_depth);
    let mut outcome = RollupOutcome::default();
    for root in live {
        let total_cost = propagator.propagate(&root)?;
        tracing::debug!(root = %root, total_cost, "root recomputed");
        outcome.roots.push(RootTotal {
            id: root,
            total_cost,
        });
    }
    outcome.recomputed = propagator.recomputed();
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::EntityPrefix;
    use crate::core::store::MemoryStore;
    use crate::entities::{BomLine, ComponentFamily, Nomenclature};

    #[test]
    fn test_seeds() {
        let a = EntityId::new(EntityPrefix::Nom);
        let b = EntityId::new(EntityPrefix::Nom);

        assert_eq!(
            ChangeEvent::LineCreated { parent: a.clone() }.seeds(),
            vec![a.clone()]
        );
        assert_eq!(
            ChangeEvent::LineChanged {
                before: a.clone(),
                after: a.clone()
            }
            .seeds(),
            vec![a.clone()]
        );
        assert_eq!(
            ChangeEvent::LineChanged {
                before: a.clone(),
                after: b.clone()
            }
            .seeds(),
            vec![b.clone(), a.clone()]
        );
        assert_eq!(
            ChangeEvent::PurchaseCostChanged { node: b.clone() }.seeds(),
            vec![b]
        );
    }

    #[test]
    fn test_purchase_change_reaches_root() {
        let mut store = MemoryStore::new();
        let family = ComponentFamily::new("Bolt");
        store.save_family(&family).unwrap();

        let mut bolt = Nomenclature::new(family.id.clone(), "USD").with_purchase_cost(2.0);
        let bracket = Nomenclature::new(family.id.clone(), "USD").with_purchase_cost(5.0);
        store.save_nomenclature(&bolt).unwrap();
        store.save_nomenclature(&bracket).unwrap();
        store
            .save_bom_line(
                &BomLine::new(bracket.id.clone(), family.id.clone(), 4.0)
                    .with_analogs(vec![bolt.id.clone()]),
            )
            .unwrap();

        let outcome = on_change(
            &mut store,
            &ChangeEvent::LineCreated {
                parent: bracket.id.clone(),
            },
            64,
        )
        .unwrap();
        assert_eq!(outcome.roots[0].total_cost, 13.0);

        bolt.purchase_cost = 3.0;
        store.save_nomenclature(&bolt).unwrap();
        let outcome = on_change(
            &mut store,
            &ChangeEvent::PurchaseCostChanged {
                node: bolt.id.clone(),
            },
            64,
        )
        .unwrap();

        assert_eq!(
            outcome.roots,
            vec![RootTotal {
                id: bracket.id.clone(),
                total_cost: 17.0
            }]
        );
        assert_eq!(outcome.recomputed, 2);
        assert_eq!(store.nomenclature(&bolt.id).unwrap().unwrap().total_cost, 3.0);
    }

    #[test]
    fn test_vanished_seed_is_skipped() {
        let mut store = MemoryStore::new();
        let ghost = EntityId::new(EntityPrefix::Nom);
        let outcome = on_change(&mut store, &ChangeEvent::LineDeleted { parent: ghost }, 64).unwrap();
        assert!(outcome.roots.is_empty());
    }
}
