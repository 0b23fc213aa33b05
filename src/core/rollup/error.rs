//! Errors raised by the cost rollup and catalog operations

use miette::Diagnostic;
use thiserror::Error;

use crate::core::identity::EntityId;
use crate::core::store::StoreError;

#[derive(Debug, Error, Diagnostic)]
pub enum RollupError {
    #[error(transparent)]
    #[diagnostic(code(bomcost::store))]
    Store(#[from] StoreError),

    #[error("{0} not found")]
    #[diagnostic(code(bomcost::not_found))]
    NotFound(String),

    #[error("BOM cycle: {path}")]
    #[diagnostic(
        code(bomcost::rollup::cycle),
        help("an assembly cannot contain itself, directly or through a sub-assembly")
    )]
    CycleDetected { path: String },

    #[error("BOM nesting deeper than {limit} levels at {node}")]
    #[diagnostic(
        code(bomcost::rollup::depth),
        help("raise max_depth in .bomcost/config.yaml or BOMCOST_MAX_DEPTH")
    )]
    DepthExceeded { limit: usize, node: EntityId },

    #[error("quantity must be a positive number, got {0}")]
    #[diagnostic(code(bomcost::invalid_quantity))]
    InvalidQuantity(f64),

    #[error("cost must be a finite number, got {0}")]
    #[diagnostic(code(bomcost::invalid_cost))]
    InvalidCost(f64),

    #[error("nomenclature code '{0}' is already in use")]
    #[diagnostic(code(bomcost::duplicate_code))]
    DuplicateCode(String),

    #[error("component family '{0}' already exists")]
    #[diagnostic(code(bomcost::duplicate_family))]
    DuplicateFamilyName(String),

    #[error("family '{family}' already has an execution named '{name}'")]
    #[diagnostic(code(bomcost::duplicate_name))]
    DuplicateName { family: String, name: String },

    #[error("invalid parameter: {0}")]
    #[diagnostic(code(bomcost::invalid_parameter))]
    InvalidParameter(String),

    #[error("BOM line {0} already exists")]
    #[diagnostic(code(bomcost::duplicate_line))]
    DuplicateLine(EntityId),

    #[error("analog {analog} belongs to family {found}, line expects {expected}")]
    #[diagnostic(
        code(bomcost::family_mismatch),
        help("set enforce_family_analogs: false to allow cross-family analogs")
    )]
    FamilyMismatch {
        analog: EntityId,
        expected: EntityId,
        found: EntityId,
    },

    #[error("{id} is still used as an analog by {lines} BOM line(s)")]
    #[diagnostic(
        code(bomcost::referenced),
        help("remove it from those lines first (see `bomcost where-used`)")
    )]
    Referenced { id: EntityId, lines: usize },
}

impl RollupError {
    /// Lift store-level reference failures into the user-facing variant
    pub(crate) fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::Referenced { id, lines } => RollupError::Referenced { id, lines },
            other => RollupError::Store(other),
        }
    }
}
