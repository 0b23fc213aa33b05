//! The catalog: validated mutations with the cost rollup wired in
//!
//! Every mutation runs as one unit of work on the store. The record write,
//! any cycle or family check, and the propagation it triggers either all
//! land or none do.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::core::config::MAX_DEPTH_LIMIT;
use crate::core::entity::Entity;
use crate::core::identity::EntityId;
use crate::core::rollup::{
    self, costs_match, ensure_acyclic, on_change, propagate_from, ChangeEvent, RollupError,
    RollupOutcome, RollupSettings, Violation,
};
use crate::core::store::{Store, StoreError};
use crate::entities::{
    BomLine, BomLinePatch, Category, ComponentFamily, Nomenclature, Parameter, UnitOfMeasure,
};

/// One row of a price import
#[derive(Debug, Clone, PartialEq)]
pub struct PriceUpdate {
    pub code: String,
    pub purchase_cost: f64,
}

/// Result of a price import
#[derive(Debug, Clone, Default, Serialize)]
pub struct PriceImport {
    pub updated: usize,
    pub unchanged: usize,
    pub unknown: Vec<String>,
    pub rollup: RollupOutcome,
}

/// A node of the cost breakdown of an assembly, read from stored values
#[derive(Debug, Clone, Serialize)]
pub struct CostTree {
    pub id: EntityId,
    pub name: String,
    pub currency: String,
    pub purchase_cost: f64,
    pub material_cost: f64,
    pub total_cost: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<CostTreeLine>,
}

/// A BOM line within a [`CostTree`]
#[derive(Debug, Clone, Serialize)]
pub struct CostTreeLine {
    pub id: EntityId,
    pub family: String,
    pub quantity: f64,
    pub cost: f64,
    pub line_total: f64,
    pub analogs: Vec<CostTree>,
}

/// Catalog of families, nomenclature and BOM lines over a store
pub struct Catalog<S: Store> {
    store: S,
    settings: RollupSettings,
}

impl<S: Store> Catalog<S> {
    pub fn new(store: S, mut settings: RollupSettings) -> Self {
        settings.max_depth = settings.max_depth.min(MAX_DEPTH_LIMIT);
        Self { store, settings }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> RollupSettings {
        self.settings
    }

    // ---------------------------------------------------------------------
    // Categories, units, families
    // ---------------------------------------------------------------------

    pub fn create_category(&mut self, category: Category) -> Result<Category, RollupError> {
        if let Some(parent) = &category.parent {
            self.require_category(parent)?;
        }
        self.store.save_category(&category)?;
        tracing::info!(id = %category.id, name = %category.name, "category created");
        Ok(category)
    }

    /// "Parent/Child" path of a category
    pub fn category_path(&self, category: &Category) -> String {
        category.display_path(|id| self.store.category(id).ok().flatten())
    }

    pub fn create_uom(&mut self, uom: UnitOfMeasure) -> Result<UnitOfMeasure, RollupError> {
        if !(uom.rounding.is_finite() && uom.rounding > 0.0) {
            return Err(RollupError::InvalidQuantity(uom.rounding));
        }
        self.store.save_uom(&uom)?;
        tracing::info!(id = %uom.id, name = %uom.name, "unit created");
        Ok(uom)
    }

    pub fn create_family(&mut self, family: ComponentFamily) -> Result<ComponentFamily, RollupError> {
        if self.store.family_by_name(&family.name)?.is_some() {
            return Err(RollupError::DuplicateFamilyName(family.name));
        }
        if let Some(uom) = &family.uom {
            if self.store.uom(uom)?.is_none() {
                return Err(RollupError::NotFound(uom.to_string()));
            }
        }
        if let Some(category) = &family.category {
            self.require_category(category)?;
        }
        self.store.save_family(&family)?;
        tracing::info!(id = %family.id, name = %family.name, "family created");
        Ok(family)
    }

    /// The family called `name`, created on first use
    pub fn find_or_create_family(&mut self, name: &str) -> Result<ComponentFamily, RollupError> {
        match self.store.family_by_name(name)? {
            Some(family) => Ok(family),
            None => self.create_family(ComponentFamily::new(name)),
        }
    }

    // ---------------------------------------------------------------------
    // Nomenclature
    // ---------------------------------------------------------------------

    /// Register a new node; derived costs start from its own purchase cost
    pub fn create_nomenclature(
        &mut self,
        mut nomenclature: Nomenclature,
    ) -> Result<Nomenclature, RollupError> {
        ensure_finite(nomenclature.purchase_cost)?;
        let family = self.require_family(&nomenclature.family)?;

        if let Some(code) = &nomenclature.code {
            if self.store.nomenclature_by_code(code)?.is_some() {
                return Err(RollupError::DuplicateCode(code.clone()));
            }
        }
        if let Some(name) = &nomenclature.name {
            let taken = self
                .store
                .nomenclatures()?
                .iter()
                .any(|n| n.family == family.id && n.name.as_deref() == Some(name.as_str()));
            if taken {
                return Err(RollupError::DuplicateName {
                    family: family.name,
                    name: name.clone(),
                });
            }
        }

        nomenclature.material_cost = 0.0;
        nomenclature.total_cost = nomenclature.purchase_cost;
        self.store.save_nomenclature(&nomenclature)?;
        tracing::info!(id = %nomenclature.id, "nomenclature created");
        Ok(nomenclature)
    }

    /// Change a node's own cost and update every assembly containing it
    pub fn set_purchase_cost(
        &mut self,
        id: &EntityId,
        purchase_cost: f64,
    ) -> Result<RollupOutcome, RollupError> {
        ensure_finite(purchase_cost)?;
        let max_depth = self.settings.max_depth;

        self.store.atomically(|store| {
            let mut node = require_nomenclature(&*store, id)?;
            if node.purchase_cost == purchase_cost {
                return Ok(RollupOutcome::default());
            }
            node.purchase_cost = purchase_cost;
            store.save_nomenclature(&node)?;
            on_change(store, &ChangeEvent::PurchaseCostChanged { node: id.clone() }, max_depth)
        })
    }

    /// Delete a node and its own lines
    ///
    /// Refused while any line still uses the node as an analog. Nothing above
    /// an unreferenced node exists, so no rollup follows.
    pub fn delete_nomenclature(&mut self, id: &EntityId) -> Result<(), RollupError> {
        self.store
            .atomically(|store| store.delete_nomenclature(id))
            .map_err(RollupError::from_store)?;
        tracing::info!(id = %id, "nomenclature deleted");
        Ok(())
    }

    /// Accept a node reference as an id or a code
    pub fn resolve_nomenclature(&self, key: &str) -> Result<Nomenclature, RollupError> {
        if let Some(id) = Nomenclature::parse_id(key) {
            return require_nomenclature(&self.store, &id);
        }
        self.store
            .nomenclature_by_code(key)?
            .ok_or_else(|| RollupError::NotFound(format!("nomenclature '{}'", key)))
    }

    /// Accept a family reference as an id or a name
    pub fn resolve_family(&self, key: &str) -> Result<ComponentFamily, RollupError> {
        if let Some(id) = ComponentFamily::parse_id(key) {
            return self.require_family(&id);
        }
        self.store
            .family_by_name(key)?
            .ok_or_else(|| RollupError::NotFound(format!("family '{}'", key)))
    }

    /// "<family> <name>" of a node
    pub fn fullname(&self, nomenclature: &Nomenclature) -> String {
        let family = self.store.family(&nomenclature.family).ok().flatten();
        nomenclature.fullname(family.as_ref().map(|f| f.name.as_str()))
    }

    // ---------------------------------------------------------------------
    // Technical parameters
    // ---------------------------------------------------------------------

    /// Attach a named value to a node; parameter names are unique per node
    pub fn add_parameter(&mut self, parameter: Parameter) -> Result<Parameter, RollupError> {
        if parameter.name.trim().is_empty() {
            return Err(RollupError::InvalidParameter("name is empty".into()));
        }
        if !parameter.value.is_finite() {
            return Err(RollupError::InvalidParameter(format!(
                "{} must be a finite number, got {}",
                parameter.name, parameter.value
            )));
        }
        require_nomenclature(&self.store, &parameter.nomenclature)?;
        if let Some(uom) = &parameter.uom {
            if self.store.uom(uom)?.is_none() {
                return Err(RollupError::NotFound(uom.to_string()));
            }
        }
        let taken = self
            .store
            .parameters_of(&parameter.nomenclature)?
            .iter()
            .any(|p| p.name == parameter.name);
        if taken {
            return Err(RollupError::InvalidParameter(format!(
                "{} is already set on {}",
                parameter.name, parameter.nomenclature
            )));
        }

        self.store.save_parameter(&parameter)?;
        tracing::info!(id = %parameter.id, node = %parameter.nomenclature, "parameter added");
        Ok(parameter)
    }

    /// Parameters of a node, in display order
    pub fn parameters_of(&self, id: &EntityId) -> Result<Vec<Parameter>, RollupError> {
        Ok(self.store.parameters_of(id)?)
    }

    pub fn remove_parameter(&mut self, id: &EntityId) -> Result<(), RollupError> {
        self.store
            .delete_parameter(id)
            .map_err(|e| match e {
                StoreError::NotFound(id) => RollupError::NotFound(id.to_string()),
                other => RollupError::Store(other),
            })?;
        tracing::info!(id = %id, "parameter removed");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // BOM lines
    // ---------------------------------------------------------------------

    /// Add a line to its parent's BOM and roll the new cost up
    ///
    /// The analog set is normalized first, so an analog listed twice counts
    /// once in the mean. The line id must be new; edits go through
    /// [`Catalog::update_bom_line`].
    pub fn add_bom_line(
        &mut self,
        mut line: BomLine,
    ) -> Result<(BomLine, RollupOutcome), RollupError> {
        let settings = self.settings;
        let analogs = std::mem::take(&mut line.analogs);
        line.set_analogs(analogs);

        self.store.atomically(|store| {
            if store.bom_line(&line.id)?.is_some() {
                return Err(RollupError::DuplicateLine(line.id.clone()));
            }
            validate_line(&*store, &line, settings)?;
            ensure_acyclic(&*store, &line.parent, &line.analogs)?;
            store.save_bom_line(&line)?;
            tracing::info!(id = %line.id, parent = %line.parent, "BOM line added");

            let outcome = on_change(
                store,
                &ChangeEvent::LineCreated {
                    parent: line.parent.clone(),
                },
                settings.max_depth,
            )?;
            let stored = require_line(&*store, &line.id)?;
            Ok((stored, outcome))
        })
    }

    /// Edit a line; cost-relevant edits roll up from the old and new parent
    pub fn update_bom_line(
        &mut self,
        id: &EntityId,
        patch: &BomLinePatch,
    ) -> Result<(BomLine, Option<RollupOutcome>), RollupError> {
        let settings = self.settings;

        self.store.atomically(|store| {
            let before = require_line(&*store, id)?;
            if patch.is_empty() {
                return Ok((before, None));
            }

            let after = patch.apply_to(&before);
            validate_line(&*store, &after, settings)?;
            store.save_bom_line(&after)?;

            if !patch.affects_cost() {
                tracing::debug!(id = %id, "BOM line reordered");
                return Ok((after, None));
            }

            // The line is already saved, so the walk sees the edited edges;
            // a failure rolls the whole unit back.
            if patch.analogs.is_some() || patch.parent.is_some() {
                ensure_acyclic(&*store, &after.parent, &after.analogs)?;
            }

            let outcome = on_change(
                store,
                &ChangeEvent::LineChanged {
                    before: before.parent.clone(),
                    after: after.parent.clone(),
                },
                settings.max_depth,
            )?;
            tracing::info!(id = %id, "BOM line updated");
            Ok((require_line(&*store, id)?, Some(outcome)))
        })
    }

    /// Remove a line and roll its former parent's cost up
    pub fn remove_bom_line(&mut self, id: &EntityId) -> Result<RollupOutcome, RollupError> {
        let max_depth = self.settings.max_depth;

        self.store.atomically(|store| {
            let line = require_line(&*store, id)?;
            store.delete_bom_line(id)?;
            tracing::info!(id = %id, parent = %line.parent, "BOM line removed");
            on_change(store, &ChangeEvent::LineDeleted { parent: line.parent }, max_depth)
        })
    }

    /// Lines of a node's BOM, in display order
    pub fn bom_of(&self, parent: &EntityId) -> Result<Vec<BomLine>, RollupError> {
        Ok(self.store.lines_owned_by(parent)?)
    }

    // ---------------------------------------------------------------------
    // Graph queries
    // ---------------------------------------------------------------------

    /// Lines that use `id` as an analog
    pub fn where_used(&self, id: &EntityId) -> Result<Vec<BomLine>, RollupError> {
        Ok(self.store.lines_using(id)?)
    }

    /// Number of distinct assemblies directly containing `id`
    pub fn used_in_count(&self, id: &EntityId) -> Result<usize, RollupError> {
        Ok(rollup::direct_parents(&self.store, id)?.len())
    }

    /// Top-level assemblies above the given nodes
    pub fn roots_of(&self, ids: &[EntityId]) -> Result<BTreeSet<EntityId>, RollupError> {
        Ok(rollup::find_roots(&self.store, ids.iter().cloned())?)
    }

    /// Every node that no line uses
    pub fn top_level(&self) -> Result<Vec<Nomenclature>, RollupError> {
        let mut top = Vec::new();
        for node in self.store.nomenclatures()? {
            if self.store.lines_using(&node.id)?.is_empty() {
                top.push(node);
            }
        }
        Ok(top)
    }

    // ---------------------------------------------------------------------
    // Maintenance
    // ---------------------------------------------------------------------

    /// Recompute the roots above the given nodes
    pub fn recompute(&mut self, ids: &[EntityId]) -> Result<RollupOutcome, RollupError> {
        let max_depth = self.settings.max_depth;
        self.store.atomically(|store| {
            for id in ids {
                require_nomenclature(&*store, id)?;
            }
            propagate_from(store, ids.iter().cloned(), max_depth)
        })
    }

    /// Recompute every root in the catalog
    pub fn recompute_all(&mut self) -> Result<RollupOutcome, RollupError> {
        let max_depth = self.settings.max_depth;
        self.store.atomically(|store| {
            let all: Vec<EntityId> = store.nomenclatures()?.into_iter().map(|n| n.id).collect();
            propagate_from(store, all, max_depth)
        })
    }

    /// Stored derived values that disagree with their inputs
    pub fn check(&self) -> Result<Vec<Violation>, RollupError> {
        Ok(rollup::verify(&self.store)?)
    }

    /// Apply purchase prices by code
    ///
    /// All rows land in one unit of work; each changed price goes through
    /// the normal trigger, and codes not in the catalog are reported back.
    pub fn import_prices(&mut self, rows: &[PriceUpdate]) -> Result<PriceImport, RollupError> {
        for row in rows {
            ensure_finite(row.purchase_cost)?;
        }
        let max_depth = self.settings.max_depth;

        self.store.atomically(|store| {
            let mut summary = PriceImport::default();
            let mut changed = Vec::new();

            for row in rows {
                let Some(mut node) = store.nomenclature_by_code(&row.code)? else {
                    tracing::warn!(code = %row.code, "price for unknown code");
                    summary.unknown.push(row.code.clone());
                    continue;
                };
                if costs_match(node.purchase_cost, row.purchase_cost) {
                    summary.unchanged += 1;
                    continue;
                }
                node.purchase_cost = row.purchase_cost;
                store.save_nomenclature(&node)?;
                changed.push(node.id);
                summary.updated += 1;
            }

            // One rollup over all changed nodes gives the same result as
            // one per row, without walking shared assemblies repeatedly.
            summary.rollup = propagate_from(store, changed, max_depth)?;
            Ok(summary)
        })
    }

    /// Cost breakdown of `id` from stored values
    pub fn cost_tree(&self, id: &EntityId) -> Result<CostTree, RollupError> {
        let mut path = Vec::new();
        self.build_tree(id, &mut path)
    }

    fn build_tree(&self, id: &EntityId, path: &mut Vec<EntityId>) -> Result<CostTree, RollupError> {
        if path.contains(id) {
            path.push(id.clone());
            return Err(RollupError::CycleDetected {
                path: path
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(" -> "),
            });
        }
        if path.len() >= self.settings.max_depth {
            return Err(RollupError::DepthExceeded {
                limit: self.settings.max_depth,
                node: id.clone(),
            });
        }

        let node = require_nomenclature(&self.store, id)?;
        path.push(id.clone());

        let mut lines = Vec::new();
        for line in self.store.lines_owned_by(id)? {
            let family = self
                .store
                .family(&line.family)?
                .map(|f| f.name)
                .unwrap_or_else(|| line.family.to_string());
            let mut analogs = Vec::with_capacity(line.analogs.len());
            for analog in &line.analogs {
                analogs.push(self.build_tree(analog, path)?);
            }
            lines.push(CostTreeLine {
                id: line.id,
                family,
                quantity: line.quantity,
                cost: line.cost,
                line_total: line.line_total,
                analogs,
            });
        }

        path.pop();
        Ok(CostTree {
            name: self.fullname(&node),
            id: node.id,
            currency: node.currency,
            purchase_cost: node.purchase_cost,
            material_cost: node.material_cost,
            total_cost: node.total_cost,
            lines,
        })
    }

    fn require_category(&self, id: &EntityId) -> Result<Category, RollupError> {
        self.store
            .category(id)?
            .ok_or_else(|| RollupError::NotFound(id.to_string()))
    }

    fn require_family(&self, id: &EntityId) -> Result<ComponentFamily, RollupError> {
        self.store
            .family(id)?
            .ok_or_else(|| RollupError::NotFound(id.to_string()))
    }
}

fn ensure_finite(cost: f64) -> Result<(), RollupError> {
    if cost.is_finite() {
        Ok(())
    } else {
        Err(RollupError::InvalidCost(cost))
    }
}

fn require_nomenclature<S: Store>(store: &S, id: &EntityId) -> Result<Nomenclature, RollupError> {
    store
        .nomenclature(id)?
        .ok_or_else(|| RollupError::NotFound(id.to_string()))
}

fn require_line<S: Store>(store: &S, id: &EntityId) -> Result<BomLine, RollupError> {
    store
        .bom_line(id)?
        .ok_or_else(|| RollupError::NotFound(id.to_string()))
}

/// Reference and value checks shared by line creation and edits
fn validate_line<S: Store>(
    store: &S,
    line: &BomLine,
    settings: RollupSettings,
) -> Result<(), RollupError> {
    if !(line.quantity.is_finite() && line.quantity > 0.0) {
        return Err(RollupError::InvalidQuantity(line.quantity));
    }
    require_nomenclature(&*store, &line.parent)?;
    if store.family(&line.family)?.is_none() {
        return Err(RollupError::NotFound(line.family.to_string()));
    }

    for analog in &line.analogs {
        let node = require_nomenclature(&*store, analog)?;
        if node.family != line.family {
            if settings.enforce_family_analogs {
                return Err(RollupError::FamilyMismatch {
                    analog: analog.clone(),
                    expected: line.family.clone(),
                    found: node.family,
                });
            }
            tracing::warn!(
                line = %line.id,
                analog = %analog,
                "analog outside the line's family"
            );
        }
    }
    Ok(())
}
