//! bomcost: hierarchical bill-of-materials cost rollup
//!
//! Keeps the material and total cost of every assembly in a multi-level BOM
//! consistent with the purchase costs of its parts, recomputing only the
//! assemblies above whatever changed.

pub mod cli;
pub mod core;
pub mod entities;
