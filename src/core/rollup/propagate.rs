//! Downward recomputation of line and node costs

use std::collections::HashMap;

use super::RollupError;
use crate::core::config::MAX_DEPTH_LIMIT;
use crate::core::identity::EntityId;
use crate::core::store::Store;
use crate::entities::{BomLine, Nomenclature};

/// Recomputes and persists the derived cost fields below a node
///
/// One propagator is meant to serve one change: its memo remembers every
/// node total computed so far, so sub-assemblies shared between lines or
/// between roots are only walked once. Do not reuse it after further writes.
pub struct Propagator<'s, S: Store> {
    store: &'s mut S,
    max_depth: usize,
    memo: HashMap<EntityId, f64>,
    in_progress: Vec<EntityId>,
}

impl<'s, S: Store> Propagator<'s, S> {
    pub fn new(store: &'s mut S, max_depth: usize) -> Self {
        Self {
            store,
            max_depth: max_depth.min(MAX_DEPTH_LIMIT),
            memo: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    /// Number of distinct nodes recomputed so far
    pub fn recomputed(&self) -> usize {
        self.memo.len()
    }

    /// Recompute `node` and everything it depends on, returning its total cost
    pub fn propagate(&mut self, node: &EntityId) -> Result<f64, RollupError> {
        if let Some(total) = self.memo.get(node) {
            return Ok(*total);
        }

        if let Some(pos) = self.in_progress.iter().position(|n| n == node) {
            let mut path = self.in_progress[pos..].to_vec();
            path.push(node.clone());
            tracing::warn!(node = %node, "cycle met during propagation");
            return Err(RollupError::CycleDetected {
                path: format_path(&path),
            });
        }

        if self.in_progress.len() >= self.max_depth {
            return Err(RollupError::DepthExceeded {
                limit: self.max_depth,
                node: node.clone(),
            });
        }

        let nomenclature = self
            .store
            .nomenclature(node)?
            .ok_or_else(|| RollupError::NotFound(node.to_string()))?;

        self.in_progress.push(node.clone());
        let result = self.recompute(&nomenclature);
        self.in_progress.pop();

        let total = result?;
        self.memo.insert(node.clone(), total);
        Ok(total)
    }

    fn recompute(&mut self, node: &Nomenclature) -> Result<f64, RollupError> {
        let lines = self.store.lines_owned_by(&node.id)?;

        let mut material = 0.0;
        for line in &lines {
            material += self.recompute_line(line)?;
        }

        let total = node.purchase_cost + material;
        self.store.write_node_costs(&node.id, material, total)?;
        tracing::trace!(
            node = %node.id,
            lines = lines.len(),
            material,
            total,
            "node recomputed"
        );
        Ok(total)
    }

    /// Persist a line's unit cost and total, returning the total
    fn recompute_line(&mut self, line: &BomLine) -> Result<f64, RollupError> {
        let mut sum = 0.0;
        for analog in &line.analogs {
            sum += self.propagate(analog)?;
        }
        let cost = mean(sum, line.analogs.len());
        let line_total = line.quantity * cost;

        self.store.write_line_costs(&line.id, cost, line_total)?;
        Ok(line_total)
    }
}

/// Mean of `count` values summing to `sum`; zero for no values
pub(crate) fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

pub(crate) fn format_path(path: &[EntityId]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rollup::costs_match;
    use crate::core::store::MemoryStore;
    use crate::entities::ComponentFamily;

    struct Graph {
        store: MemoryStore,
        family: ComponentFamily,
    }

    impl Graph {
        fn new() -> Self {
            let mut store = MemoryStore::new();
            let family = ComponentFamily::new("Part");
            store.save_family(&family).unwrap();
            Self { store, family }
        }

        fn node(&mut self, purchase: f64) -> EntityId {
            let n = Nomenclature::new(self.family.id.clone(), "USD").with_purchase_cost(purchase);
            self.store.save_nomenclature(&n).unwrap();
            n.id
        }

        fn line(&mut self, parent: &EntityId, qty: f64, analogs: &[&EntityId]) -> EntityId {
            let line = BomLine::new(parent.clone(), self.family.id.clone(), qty)
                .with_analogs(analogs.iter().map(|a| (*a).clone()));
            self.store.save_bom_line(&line).unwrap();
            line.id
        }

        fn total(&self, id: &EntityId) -> f64 {
            self.store.nomenclature(id).unwrap().unwrap().total_cost
        }

        fn run(&mut self, root: &EntityId) -> Result<f64, RollupError> {
            Propagator::new(&mut self.store, 64).propagate(root)
        }
    }

    #[test]
    fn test_leaf_without_lines() {
        let mut g = Graph::new();
        let leaf = g.node(7.5);
        assert_eq!(g.run(&leaf).unwrap(), 7.5);
        let n = g.store.nomenclature(&leaf).unwrap().unwrap();
        assert_eq!(n.material_cost, 0.0);
    }

    #[test]
    fn test_stale_material_is_cleared_when_lines_are_gone() {
        let mut g = Graph::new();
        let bracket = g.node(5.0);
        g.store.write_node_costs(&bracket, 8.0, 13.0).unwrap();

        assert_eq!(g.run(&bracket).unwrap(), 5.0);
        let n = g.store.nomenclature(&bracket).unwrap().unwrap();
        assert_eq!((n.material_cost, n.total_cost), (0.0, 5.0));
    }

    #[test]
    fn test_analogs_are_averaged() {
        let mut g = Graph::new();
        let a = g.node(10.0);
        let b = g.node(20.0);
        let parent = g.node(0.0);
        let line = g.line(&parent, 2.0, &[&a, &b]);

        assert_eq!(g.run(&parent).unwrap(), 30.0);
        let line = g.store.bom_line(&line).unwrap().unwrap();
        assert_eq!(line.cost, 15.0);
        assert_eq!(line.line_total, 30.0);
    }

    #[test]
    fn test_empty_analog_set_contributes_nothing() {
        let mut g = Graph::new();
        let parent = g.node(1.0);
        let line = g.line(&parent, 3.0, &[]);

        assert_eq!(g.run(&parent).unwrap(), 1.0);
        let line = g.store.bom_line(&line).unwrap().unwrap();
        assert_eq!((line.cost, line.line_total), (0.0, 0.0));
    }

    #[test]
    fn test_nested_assemblies() {
        let mut g = Graph::new();
        let screw = g.node(0.25);
        let sub = g.node(1.0);
        let top = g.node(10.0);
        g.line(&sub, 4.0, &[&screw]);
        g.line(&top, 2.0, &[&sub]);

        // sub = 1 + 4*0.25 = 2, top = 10 + 2*2 = 14
        assert_eq!(g.run(&top).unwrap(), 14.0);
        assert_eq!(g.total(&sub), 2.0);
    }

    #[test]
    fn test_shared_sub_assembly_is_computed_once() {
        let mut g = Graph::new();
        let shared = g.node(3.0);
        let top = g.node(0.0);
        g.line(&top, 1.0, &[&shared]);
        g.line(&top, 2.0, &[&shared]);

        let mut p = Propagator::new(&mut g.store, 64);
        assert_eq!(p.propagate(&top).unwrap(), 9.0);
        assert_eq!(p.recomputed(), 2);
    }

    #[test]
    fn test_propagation_is_idempotent() {
        let mut g = Graph::new();
        let a = g.node(1.5);
        let b = g.node(2.5);
        let top = g.node(4.0);
        g.line(&top, 3.0, &[&a, &b]);

        let first = g.run(&top).unwrap();
        let snapshot = g.store.clone();
        let second = g.run(&top).unwrap();
        assert!(costs_match(first, second));
        assert_eq!(
            snapshot.nomenclatures().unwrap(),
            g.store.nomenclatures().unwrap()
        );
        assert_eq!(snapshot.bom_lines().unwrap(), g.store.bom_lines().unwrap());
    }

    #[test]
    fn test_cycle_is_reported_not_followed() {
        let mut g = Graph::new();
        let a = g.node(1.0);
        let b = g.node(1.0);
        g.line(&a, 1.0, &[&b]);
        g.line(&b, 1.0, &[&a]);

        match g.run(&a) {
            Err(RollupError::CycleDetected { path }) => {
                assert!(path.starts_with(&a.to_string()));
                assert!(path.ends_with(&a.to_string()));
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_depth_limit() {
        let mut g = Graph::new();
        let mut child = g.node(1.0);
        for _ in 0..5 {
            let parent = g.node(1.0);
            g.line(&parent, 1.0, &[&child]);
            child = parent;
        }

        let err = Propagator::new(&mut g.store, 3).propagate(&child).unwrap_err();
        assert!(matches!(err, RollupError::DepthExceeded { limit: 3, .. }));
        assert_eq!(Propagator::new(&mut g.store, 6).propagate(&child).unwrap(), 6.0);
    }

    #[test]
    fn test_missing_node() {
        let mut g = Graph::new();
        let ghost = EntityId::new(crate::core::identity::EntityPrefix::Nom);
        assert!(matches!(g.run(&ghost), Err(RollupError::NotFound(_))));
    }

    #[test]
    fn test_mean_of_nothing_is_zero() {
        assert_eq!(mean(0.0, 0), 0.0);
        assert_eq!(mean(9.0, 3), 3.0);
    }
}
