//! CLI command implementations

pub mod bom;
pub mod cat;
pub mod check;
pub mod completions;
pub mod fam;
pub mod init;
pub mod nom;
pub mod param;
pub mod report;
pub mod rollup;
pub mod roots;
pub mod uom;
pub mod where_used;
