//! Upward walk from changed nodes to the top-level assemblies containing them

use std::collections::{BTreeSet, HashSet, VecDeque};

use crate::core::identity::EntityId;
use crate::core::store::{Store, StoreError};

/// Every root reachable by following used-in edges up from `seeds`
///
/// A node that no line uses is its own root. The visited set makes the walk
/// terminate on cyclic data and keeps diamond-shaped graphs from being
/// expanded more than once.
pub fn find_roots<S, I>(store: &S, seeds: I) -> Result<BTreeSet<EntityId>, StoreError>
where
    S: Store,
    I: IntoIterator<Item = EntityId>,
{
    let mut queue: VecDeque<EntityId> = seeds.into_iter().collect();
    let mut visited = HashSet::new();
    let mut roots = BTreeSet::new();

    while let Some(node) = queue.pop_front() {
        if !visited.insert(node.clone()) {
            continue;
        }

        let users = store.lines_using(&node)?;
        if users.is_empty() {
            roots.insert(node);
            continue;
        }

        for line in users {
            if !visited.contains(&line.parent) {
                queue.push_back(line.parent);
            }
        }
    }

    tracing::debug!(count = roots.len(), "roots found");
    Ok(roots)
}

/// Direct parents of `node`: owners of the lines that use it, deduplicated
pub fn direct_parents<S: Store>(store: &S, node: &EntityId) -> Result<BTreeSet<EntityId>, StoreError> {
    Ok(store
        .lines_using(node)?
        .into_iter()
        .map(|line| line.parent)
        .collect())
}
