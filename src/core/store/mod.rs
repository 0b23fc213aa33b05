//! Record storage behind the rollup engine
//!
//! The engine only needs a handful of things from the host store:
//! - point reads and upserts of each record type
//! - "lines owned by P" and "lines whose analogs contain X" (used-in) queries
//! - narrow writes of the derived cost fields
//! - a transaction boundary so a failed rollup leaves prior values intact
//!
//! Two implementations are provided: [`MemoryStore`] keeps an explicit
//! child -> lines adjacency index, [`SqliteStore`] keeps an indexed edge table.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use thiserror::Error;

use crate::core::identity::EntityId;
use crate::entities::{
    BomLine, Category, ComponentFamily, Nomenclature, Parameter, UnitOfMeasure,
};

/// Errors raised by a store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(EntityId),

    #[error("{id} is still used as an analog by {lines} BOM line(s)")]
    Referenced { id: EntityId, lines: usize },

    #[error("corrupt record in store: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage operations used by the catalog and the rollup engine
pub trait Store {
    fn category(&self, id: &EntityId) -> Result<Option<Category>, StoreError>;
    fn categories(&self) -> Result<Vec<Category>, StoreError>;
    fn save_category(&mut self, category: &Category) -> Result<(), StoreError>;

    fn uom(&self, id: &EntityId) -> Result<Option<UnitOfMeasure>, StoreError>;
    fn uoms(&self) -> Result<Vec<UnitOfMeasure>, StoreError>;
    fn save_uom(&mut self, uom: &UnitOfMeasure) -> Result<(), StoreError>;

    fn family(&self, id: &EntityId) -> Result<Option<ComponentFamily>, StoreError>;
    fn family_by_name(&self, name: &str) -> Result<Option<ComponentFamily>, StoreError>;
    fn families(&self) -> Result<Vec<ComponentFamily>, StoreError>;
    fn save_family(&mut self, family: &ComponentFamily) -> Result<(), StoreError>;

    fn nomenclature(&self, id: &EntityId) -> Result<Option<Nomenclature>, StoreError>;
    fn nomenclature_by_code(&self, code: &str) -> Result<Option<Nomenclature>, StoreError>;
    /// All nomenclature, ordered by id
    fn nomenclatures(&self) -> Result<Vec<Nomenclature>, StoreError>;
    fn save_nomenclature(&mut self, nomenclature: &Nomenclature) -> Result<(), StoreError>;
    /// Delete a node with its own lines and parameters; fails while another
    /// line uses it
    fn delete_nomenclature(&mut self, id: &EntityId) -> Result<(), StoreError>;

    fn parameter(&self, id: &EntityId) -> Result<Option<Parameter>, StoreError>;
    /// Parameters of `nomenclature`, ordered by sequence then id
    fn parameters_of(&self, nomenclature: &EntityId) -> Result<Vec<Parameter>, StoreError>;
    fn save_parameter(&mut self, parameter: &Parameter) -> Result<(), StoreError>;
    fn delete_parameter(&mut self, id: &EntityId) -> Result<(), StoreError>;

    fn bom_line(&self, id: &EntityId) -> Result<Option<BomLine>, StoreError>;
    /// All lines, ordered by id
    fn bom_lines(&self) -> Result<Vec<BomLine>, StoreError>;
    fn save_bom_line(&mut self, line: &BomLine) -> Result<(), StoreError>;
    fn delete_bom_line(&mut self, id: &EntityId) -> Result<(), StoreError>;

    /// Lines of `parent`, ordered by sequence then id
    fn lines_owned_by(&self, parent: &EntityId) -> Result<Vec<BomLine>, StoreError>;
    /// Lines whose analog set contains `child`, ordered by id
    fn lines_using(&self, child: &EntityId) -> Result<Vec<BomLine>, StoreError>;

    fn write_line_costs(
        &mut self,
        line: &EntityId,
        cost: f64,
        line_total: f64,
    ) -> Result<(), StoreError>;
    fn write_node_costs(
        &mut self,
        nomenclature: &EntityId,
        material_cost: f64,
        total_cost: f64,
    ) -> Result<(), StoreError>;

    /// Run `f` as one unit of work: all of its writes land, or none do
    fn atomically<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        Self: Sized,
        E: From<StoreError>,
        F: FnOnce(&mut Self) -> Result<T, E>;
}

#[cfg(test)]
pub(crate) mod contract {
    //! Behaviour every store must share; run against each implementation.

    use super::*;

    pub struct Fixture {
        pub family: ComponentFamily,
        pub bolt: Nomenclature,
        pub washer: Nomenclature,
        pub bracket: Nomenclature,
        pub line: BomLine,
    }

    pub fn seed<S: Store>(store: &mut S) -> Fixture {
        let family = ComponentFamily::new("Bolt");
        store.save_family(&family).unwrap();

        let bolt = Nomenclature::new(family.id.clone(), "USD")
            .with_code("B-M8")
            .with_purchase_cost(2.0);
        let washer = Nomenclature::new(family.id.clone(), "USD")
            .with_code("W-M8")
            .with_purchase_cost(0.5);
        let bracket = Nomenclature::new(family.id.clone(), "USD")
            .with_code("BR-A")
            .with_purchase_cost(5.0);
        for n in [&bolt, &washer, &bracket] {
            store.save_nomenclature(n).unwrap();
        }

        let line = BomLine::new(bracket.id.clone(), family.id.clone(), 4.0)
            .with_analogs(vec![bolt.id.clone(), washer.id.clone()]);
        store.save_bom_line(&line).unwrap();

        Fixture {
            family,
            bolt,
            washer,
            bracket,
            line,
        }
    }

    pub fn round_trips_records<S: Store>(store: &mut S) {
        let fx = seed(store);
        assert_eq!(store.family(&fx.family.id).unwrap(), Some(fx.family.clone()));
        assert_eq!(
            store.family_by_name("Bolt").unwrap().map(|f| f.id),
            Some(fx.family.id.clone())
        );
        assert_eq!(
            store.nomenclature_by_code("B-M8").unwrap().map(|n| n.id),
            Some(fx.bolt.id.clone())
        );
        assert_eq!(store.bom_line(&fx.line.id).unwrap(), Some(fx.line.clone()));
        assert_eq!(store.nomenclatures().unwrap().len(), 3);
    }

    pub fn answers_used_in<S: Store>(store: &mut S) {
        let fx = seed(store);
        let using_bolt = store.lines_using(&fx.bolt.id).unwrap();
        assert_eq!(using_bolt.len(), 1);
        assert_eq!(using_bolt[0].parent, fx.bracket.id);
        assert!(store.lines_using(&fx.bracket.id).unwrap().is_empty());

        // Dropping an analog updates the reverse lookup
        let mut line = fx.line.clone();
        line.set_analogs(vec![fx.bolt.id.clone()]);
        store.save_bom_line(&line).unwrap();
        assert!(store.lines_using(&fx.washer.id).unwrap().is_empty());
        assert_eq!(store.lines_using(&fx.bolt.id).unwrap().len(), 1);
    }

    pub fn orders_owned_lines<S: Store>(store: &mut S) {
        let fx = seed(store);
        let early = BomLine::new(fx.bracket.id.clone(), fx.family.id.clone(), 1.0)
            .with_sequence(1);
        store.save_bom_line(&early).unwrap();

        let owned = store.lines_owned_by(&fx.bracket.id).unwrap();
        assert_eq!(owned.len(), 2);
        assert_eq!(owned[0].id, early.id);
        assert_eq!(owned[1].id, fx.line.id);
    }

    pub fn writes_cost_fields<S: Store>(store: &mut S) {
        let fx = seed(store);
        store.write_line_costs(&fx.line.id, 1.25, 5.0).unwrap();
        store.write_node_costs(&fx.bracket.id, 5.0, 10.0).unwrap();

        let line = store.bom_line(&fx.line.id).unwrap().unwrap();
        assert_eq!((line.cost, line.line_total), (1.25, 5.0));
        let bracket = store.nomenclature(&fx.bracket.id).unwrap().unwrap();
        assert_eq!((bracket.material_cost, bracket.total_cost), (5.0, 10.0));

        let missing = crate::core::identity::EntityId::new(
            crate::core::identity::EntityPrefix::Nom,
        );
        assert!(matches!(
            store.write_node_costs(&missing, 0.0, 0.0),
            Err(StoreError::NotFound(_))
        ));
    }

    pub fn deletes_with_cascade<S: Store>(store: &mut S) {
        let fx = seed(store);

        // Referenced nodes survive
        assert!(matches!(
            store.delete_nomenclature(&fx.bolt.id),
            Err(StoreError::Referenced { lines: 1, .. })
        ));

        // Deleting the parent removes its own lines and frees the analogs
        store.delete_nomenclature(&fx.bracket.id).unwrap();
        assert!(store.bom_line(&fx.line.id).unwrap().is_none());
        assert!(store.lines_using(&fx.bolt.id).unwrap().is_empty());
        store.delete_nomenclature(&fx.bolt.id).unwrap();
        assert!(store.nomenclature(&fx.bolt.id).unwrap().is_none());
    }

    pub fn keeps_parameters<S: Store>(store: &mut S) {
        let fx = seed(store);
        let length = Parameter::new(fx.bolt.id.clone(), "Length", 40.0).with_sequence(20);
        let thread = Parameter::new(fx.bolt.id.clone(), "Thread", 8.0).with_sequence(5);
        store.save_parameter(&length).unwrap();
        store.save_parameter(&thread).unwrap();

        let params = store.parameters_of(&fx.bolt.id).unwrap();
        assert_eq!(params, vec![thread.clone(), length.clone()]);
        assert!(store.parameters_of(&fx.bracket.id).unwrap().is_empty());

        let mut longer = length.clone();
        longer.value = 45.0;
        store.save_parameter(&longer).unwrap();
        assert_eq!(store.parameter(&length.id).unwrap(), Some(longer));

        store.delete_parameter(&thread.id).unwrap();
        assert!(matches!(
            store.delete_parameter(&thread.id),
            Err(StoreError::NotFound(_))
        ));

        // Parameters go with their node
        store.delete_nomenclature(&fx.bracket.id).unwrap();
        store.delete_nomenclature(&fx.bolt.id).unwrap();
        assert!(store.parameter(&length.id).unwrap().is_none());
    }

    pub fn rolls_back_failed_units<S: Store>(store: &mut S) {
        let fx = seed(store);
        let result: Result<(), StoreError> = store.atomically(|s| {
            s.write_node_costs(&fx.bracket.id, 99.0, 104.0)?;
            s.delete_bom_line(&fx.line.id)?;
            Err(StoreError::Corrupt("boom".into()))
        });
        assert!(result.is_err());

        let bracket = store.nomenclature(&fx.bracket.id).unwrap().unwrap();
        assert_eq!(bracket.total_cost, 5.0);
        assert!(store.bom_line(&fx.line.id).unwrap().is_some());
        assert_eq!(store.lines_using(&fx.bolt.id).unwrap().len(), 1);

        store
            .atomically(|s| s.write_node_costs(&fx.bracket.id, 1.0, 6.0))
            .unwrap();
        let bracket = store.nomenclature(&fx.bracket.id).unwrap().unwrap();
        assert_eq!(bracket.total_cost, 6.0);
    }
}
