//! In-memory store with an incrementally maintained used-in index

use std::collections::{BTreeMap, BTreeSet};

use super::{Store, StoreError};
use crate::core::identity::EntityId;
use crate::entities::{
    BomLine, Category, ComponentFamily, Nomenclature, Parameter, UnitOfMeasure,
};

/// A store held entirely in memory
///
/// `used_in` maps every analog to the lines that reference it and `owned`
/// maps every parent to its lines; both are updated on each line write so the
/// reverse lookup never scans all lines.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    categories: BTreeMap<EntityId, Category>,
    uoms: BTreeMap<EntityId, UnitOfMeasure>,
    families: BTreeMap<EntityId, ComponentFamily>,
    nomenclature: BTreeMap<EntityId, Nomenclature>,
    parameters: BTreeMap<EntityId, Parameter>,
    lines: BTreeMap<EntityId, BomLine>,
    used_in: BTreeMap<EntityId, BTreeSet<EntityId>>,
    owned: BTreeMap<EntityId, BTreeSet<EntityId>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn unindex_line(&mut self, line: &BomLine) {
        for analog in &line.analogs {
            if let Some(users) = self.used_in.get_mut(analog) {
                users.remove(&line.id);
                if users.is_empty() {
                    self.used_in.remove(analog);
                }
            }
        }
        if let Some(lines) = self.owned.get_mut(&line.parent) {
            lines.remove(&line.id);
            if lines.is_empty() {
                self.owned.remove(&line.parent);
            }
        }
    }

    fn index_line(&mut self, line: &BomLine) {
        for analog in &line.analogs {
            self.used_in
                .entry(analog.clone())
                .or_default()
                .insert(line.id.clone());
        }
        self.owned
            .entry(line.parent.clone())
            .or_default()
            .insert(line.id.clone());
    }

    fn collect_lines(&self, ids: Option<&BTreeSet<EntityId>>) -> Vec<BomLine> {
        ids.map(|ids| {
            ids.iter()
                .filter_map(|id| self.lines.get(id).cloned())
                .collect()
        })
        .unwrap_or_default()
    }
}

impl Store for MemoryStore {
    fn category(&self, id: &EntityId) -> Result<Option<Category>, StoreError> {
        Ok(self.categories.get(id).cloned())
    }

    fn categories(&self) -> Result<Vec<Category>, StoreError> {
        Ok(self.categories.values().cloned().collect())
    }

    fn save_category(&mut self, category: &Category) -> Result<(), StoreError> {
        self.categories.insert(category.id.clone(), category.clone());
        Ok(())
    }

    fn uom(&self, id: &EntityId) -> Result<Option<UnitOfMeasure>, StoreError> {
        Ok(self.uoms.get(id).cloned())
    }

    fn uoms(&self) -> Result<Vec<UnitOfMeasure>, StoreError> {
        Ok(self.uoms.values().cloned().collect())
    }

    fn save_uom(&mut self, uom: &UnitOfMeasure) -> Result<(), StoreError> {
        self.uoms.insert(uom.id.clone(), uom.clone());
        Ok(())
    }

    fn family(&self, id: &EntityId) -> Result<Option<ComponentFamily>, StoreError> {
        Ok(self.families.get(id).cloned())
    }

    fn family_by_name(&self, name: &str) -> Result<Option<ComponentFamily>, StoreError> {
        Ok(self.families.values().find(|f| f.name == name).cloned())
    }

    fn families(&self) -> Result<Vec<ComponentFamily>, StoreError> {
        Ok(self.families.values().cloned().collect())
    }

    fn save_family(&mut self, family: &ComponentFamily) -> Result<(), StoreError> {
        self.families.insert(family.id.clone(), family.clone());
        Ok(())
    }

    fn nomenclature(&self, id: &EntityId) -> Result<Option<Nomenclature>, StoreError> {
        Ok(self.nomenclature.get(id).cloned())
    }

    fn nomenclature_by_code(&self, code: &str) -> Result<Option<Nomenclature>, StoreError> {
        Ok(self
            .nomenclature
            .values()
            .find(|n| n.code.as_deref() == Some(code))
            .cloned())
    }

    fn nomenclatures(&self) -> Result<Vec<Nomenclature>, StoreError> {
        Ok(self.nomenclature.values().cloned().collect())
    }

    fn save_nomenclature(&mut self, nomenclature: &Nomenclature) -> Result<(), StoreError> {
        self.nomenclature
            .insert(nomenclature.id.clone(), nomenclature.clone());
        Ok(())
    }

    fn delete_nomenclature(&mut self, id: &EntityId) -> Result<(), StoreError> {
        if !self.nomenclature.contains_key(id) {
            return Err(StoreError::NotFound(id.clone()));
        }
        if let Some(users) = self.used_in.get(id) {
            return Err(StoreError::Referenced {
                id: id.clone(),
                lines: users.len(),
            });
        }

        let own_lines: Vec<EntityId> = self
            .owned
            .get(id)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default();
        for line_id in own_lines {
            self.delete_bom_line(&line_id)?;
        }

        self.parameters.retain(|_, p| p.nomenclature != *id);
        self.nomenclature.remove(id);
        Ok(())
    }

    fn parameter(&self, id: &EntityId) -> Result<Option<Parameter>, StoreError> {
        Ok(self.parameters.get(id).cloned())
    }

    fn parameters_of(&self, nomenclature: &EntityId) -> Result<Vec<Parameter>, StoreError> {
        let mut params: Vec<Parameter> = self
            .parameters
            .values()
            .filter(|p| p.nomenclature == *nomenclature)
            .cloned()
            .collect();
        params.sort_by(|a, b| a.sequence.cmp(&b.sequence).then_with(|| a.id.cmp(&b.id)));
        Ok(params)
    }

    fn save_parameter(&mut self, parameter: &Parameter) -> Result<(), StoreError> {
        self.parameters.insert(parameter.id.clone(), parameter.clone());
        Ok(())
    }

    fn delete_parameter(&mut self, id: &EntityId) -> Result<(), StoreError> {
        self.parameters
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn bom_line(&self, id: &EntityId) -> Result<Option<BomLine>, StoreError> {
        Ok(self.lines.get(id).cloned())
    }

    fn bom_lines(&self) -> Result<Vec<BomLine>, StoreError> {
        Ok(self.lines.values().cloned().collect())
    }

    fn save_bom_line(&mut self, line: &BomLine) -> Result<(), StoreError> {
        if let Some(previous) = self.lines.get(&line.id).cloned() {
            self.unindex_line(&previous);
        }
        self.index_line(line);
        self.lines.insert(line.id.clone(), line.clone());
        Ok(())
    }

    fn delete_bom_line(&mut self, id: &EntityId) -> Result<(), StoreError> {
        let line = self
            .lines
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        self.unindex_line(&line);
        Ok(())
    }

    fn lines_owned_by(&self, parent: &EntityId) -> Result<Vec<BomLine>, StoreError> {
        let mut lines = self.collect_lines(self.owned.get(parent));
        lines.sort_by(|a, b| a.sequence.cmp(&b.sequence).then_with(|| a.id.cmp(&b.id)));
        Ok(lines)
    }

    fn lines_using(&self, child: &EntityId) -> Result<Vec<BomLine>, StoreError> {
        Ok(self.collect_lines(self.used_in.get(child)))
    }

    fn write_line_costs(
        &mut self,
        line: &EntityId,
        cost: f64,
        line_total: f64,
    ) -> Result<(), StoreError> {
        let line = self
            .lines
            .get_mut(line)
            .ok_or_else(|| StoreError::NotFound(line.clone()))?;
        line.cost = cost;
        line.line_total = line_total;
        Ok(())
    }

    fn write_node_costs(
        &mut self,
        nomenclature: &EntityId,
        material_cost: f64,
        total_cost: f64,
    ) -> Result<(), StoreError> {
        let node = self
            .nomenclature
            .get_mut(nomenclature)
            .ok_or_else(|| StoreError::NotFound(nomenclature.clone()))?;
        node.material_cost = material_cost;
        node.total_cost = total_cost;
        Ok(())
    }

    fn atomically<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        Self: Sized,
        E: From<StoreError>,
        F: FnOnce(&mut Self) -> Result<T, E>,
    {
        let snapshot = self.clone();
        let result = f(self);
        if result.is_err() {
            *self = snapshot;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::super::contract;
    use super::*;

    #[test]
    fn test_round_trips_records() {
        contract::round_trips_records(&mut MemoryStore::new());
    }

    #[test]
    fn test_answers_used_in() {
        contract::answers_used_in(&mut MemoryStore::new());
    }

    #[test]
    fn test_orders_owned_lines() {
        contract::orders_owned_lines(&mut MemoryStore::new());
    }

    #[test]
    fn test_writes_cost_fields() {
        contract::writes_cost_fields(&mut MemoryStore::new());
    }

    #[test]
    fn test_deletes_with_cascade() {
        contract::deletes_with_cascade(&mut MemoryStore::new());
    }

    #[test]
    fn test_keeps_parameters() {
        contract::keeps_parameters(&mut MemoryStore::new());
    }

    #[test]
    fn test_rolls_back_failed_units() {
        contract::rolls_back_failed_units(&mut MemoryStore::new());
    }

    #[test]
    fn test_moving_a_line_reindexes_owner() {
        let mut store = MemoryStore::new();
        let fx = contract::seed(&mut store);

        let mut moved = fx.line.clone();
        moved.parent = fx.bolt.id.clone();
        moved.set_analogs(vec![fx.washer.id.clone()]);
        store.save_bom_line(&moved).unwrap();

        assert!(store.lines_owned_by(&fx.bracket.id).unwrap().is_empty());
        assert_eq!(store.lines_owned_by(&fx.bolt.id).unwrap().len(), 1);
        assert!(store.lines_using(&fx.bolt.id).unwrap().is_empty());
    }
}
