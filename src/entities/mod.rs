//! Catalog record types

pub mod bom_line;
pub mod category;
pub mod family;
pub mod nomenclature;
pub mod parameter;
pub mod uom;

pub use bom_line::{BomLine, BomLinePatch};
pub use category::{Category, OriginType};
pub use family::ComponentFamily;
pub use nomenclature::Nomenclature;
pub use parameter::Parameter;
pub use uom::UnitOfMeasure;
