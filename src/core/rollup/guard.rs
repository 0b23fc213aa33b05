//! Write-time acyclicity check for BOM edges

use std::collections::{HashMap, HashSet, VecDeque};

use super::propagate::format_path;
use super::RollupError;
use crate::core::identity::EntityId;
use crate::core::store::Store;

/// Refuse edges `parent -> child` that would close a loop
///
/// Walks upward from `parent` through used-in edges. Reaching any proposed
/// child means that child already contains `parent`, so containing it in
/// turn would make an assembly part of itself.
pub fn ensure_acyclic<S: Store>(
    store: &S,
    parent: &EntityId,
    children: &[EntityId],
) -> Result<(), RollupError> {
    if children.is_empty() {
        return Ok(());
    }
    if children.contains(parent) {
        return Err(RollupError::CycleDetected {
            path: format_path(&[parent.clone(), parent.clone()]),
        });
    }

    let targets: HashSet<&EntityId> = children.iter().collect();
    // node -> the node below it that led the walk here
    let mut came_from: HashMap<EntityId, EntityId> = HashMap::new();
    let mut visited: HashSet<EntityId> = HashSet::from([parent.clone()]);
    let mut queue = VecDeque::from([parent.clone()]);

    while let Some(node) = queue.pop_front() {
        for line in store.lines_using(&node)? {
            let above = line.parent;
            if !visited.insert(above.clone()) {
                continue;
            }
            came_from.insert(above.clone(), node.clone());

            if targets.contains(&above) {
                let path = containment_path(parent, &above, &came_from);
                tracing::info!(parent = %parent, child = %above, "rejected BOM edge closing a cycle");
                return Err(RollupError::CycleDetected {
                    path: format_path(&path),
                });
            }
            queue.push_back(above);
        }
    }

    Ok(())
}

/// parent -> child -> ... -> parent, in "contains" order
fn containment_path(
    parent: &EntityId,
    child: &EntityId,
    came_from: &HashMap<EntityId, EntityId>,
) -> Vec<EntityId> {
    let mut path = vec![parent.clone(), child.clone()];
    let mut current = child;
    while let Some(below) = came_from.get(current) {
        path.push(below.clone());
        if below == parent {
            break;
        }
        current = below;
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MemoryStore;
    use crate::entities::{BomLine, ComponentFamily, Nomenclature};

    fn setup() -> (MemoryStore, ComponentFamily) {
        let mut store = MemoryStore::new();
        let family = ComponentFamily::new("Part");
        store.save_family(&family).unwrap();
        (store, family)
    }

    fn node(store: &mut MemoryStore, family: &ComponentFamily) -> EntityId {
        let n = Nomenclature::new(family.id.clone(), "USD");
        store.save_nomenclature(&n).unwrap();
        n.id
    }

    fn link(store: &mut MemoryStore, family: &ComponentFamily, parent: &EntityId, child: &EntityId) {
        let line = BomLine::new(parent.clone(), family.id.clone(), 1.0)
            .with_analogs(vec![child.clone()]);
        store.save_bom_line(&line).unwrap();
    }

    #[test]
    fn test_self_reference_is_rejected() {
        let (mut store, family) = setup();
        let a = node(&mut store, &family);
        let err = ensure_acyclic(&store, &a, &[a.clone()]).unwrap_err();
        assert!(matches!(err, RollupError::CycleDetected { .. }));
    }

    #[test]
    fn test_closing_a_loop_is_rejected() {
        let (mut store, family) = setup();
        let root = node(&mut store, &family);
        let mid = node(&mut store, &family);
        let leaf = node(&mut store, &family);
        link(&mut store, &family, &root, &mid);
        link(&mut store, &family, &mid, &leaf);

        // leaf would contain root, which already contains leaf
        match ensure_acyclic(&store, &leaf, &[root.clone()]) {
            Err(RollupError::CycleDetected { path }) => {
                assert_eq!(
                    path,
                    format_path(&[leaf.clone(), root.clone(), mid.clone(), leaf.clone()])
                );
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_sibling_and_downward_edges_are_fine() {
        let (mut store, family) = setup();
        let root = node(&mut store, &family);
        let mid = node(&mut store, &family);
        let leaf = node(&mut store, &family);
        let other = node(&mut store, &family);
        link(&mut store, &family, &root, &mid);
        link(&mut store, &family, &mid, &leaf);

        ensure_acyclic(&store, &root, &[leaf.clone()]).unwrap();
        ensure_acyclic(&store, &mid, &[other.clone()]).unwrap();
        ensure_acyclic(&store, &other, &[root.clone()]).unwrap();
        ensure_acyclic(&store, &root, &[]).unwrap();
    }

    #[test]
    fn test_any_child_in_the_set_trips_the_check() {
        let (mut store, family) = setup();
        let top = node(&mut store, &family);
        let bottom = node(&mut store, &family);
        let unrelated = node(&mut store, &family);
        link(&mut store, &family, &top, &bottom);

        let err = ensure_acyclic(&store, &bottom, &[unrelated, top]).unwrap_err();
        assert!(matches!(err, RollupError::CycleDetected { .. }));
    }
}
