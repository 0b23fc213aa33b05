//! Core module - catalog, rollup engine and project plumbing

pub mod catalog;
pub mod config;
pub mod entity;
pub mod identity;
pub mod project;
pub mod rollup;
pub mod store;

pub use catalog::Catalog;
pub use config::Config;
pub use entity::Entity;
pub use identity::{EntityId, EntityPrefix, IdParseError};
pub use project::{Project, ProjectError};
