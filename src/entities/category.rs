//! Category - hierarchical grouping of component families

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};

/// Where parts of a category come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginType {
    #[default]
    Purchase,
    Subcontract,
    Service,
    Production,
}

impl std::fmt::Display for OriginType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OriginType::Purchase => write!(f, "purchase"),
            OriginType::Subcontract => write!(f, "subcontract"),
            OriginType::Service => write!(f, "service"),
            OriginType::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for OriginType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "purchase" => Ok(OriginType::Purchase),
            "subcontract" => Ok(OriginType::Subcontract),
            "service" => Ok(OriginType::Service),
            "production" => Ok(OriginType::Production),
            _ => Err(format!(
                "Invalid origin type: {}. Use purchase, subcontract, service, or production",
                s
            )),
        }
    }
}

/// A family category; categories nest through `parent`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: EntityId,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<EntityId>,

    #[serde(default)]
    pub origin_type: OriginType,

    /// Families in this category are not expected to carry a BOM
    #[serde(default)]
    pub hide_specification: bool,

    pub created: DateTime<Utc>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(Self::PREFIX),
            name: name.into(),
            parent: None,
            origin_type: OriginType::default(),
            hide_specification: false,
            created: Utc::now(),
        }
    }

    pub fn with_parent(mut self, parent: EntityId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_origin(mut self, origin_type: OriginType) -> Self {
        self.origin_type = origin_type;
        self
    }

    /// Full path from the outermost ancestor, e.g. "Hardware/Fasteners/Bolts"
    ///
    /// A parent chain that loops back on itself stops at the first repeat.
    pub fn display_path<F>(&self, lookup: F) -> String
    where
        F: Fn(&EntityId) -> Option<Category>,
    {
        let mut names = vec![self.name.clone()];
        let mut seen = HashSet::from([self.id.clone()]);
        let mut next = self.parent.clone();

        while let Some(parent_id) = next {
            if !seen.insert(parent_id.clone()) {
                break;
            }
            match lookup(&parent_id) {
                Some(parent) => {
                    names.push(parent.name.clone());
                    next = parent.parent.clone();
                }
                None => break,
            }
        }

        names.reverse();
        names.join("/")
    }
}

impl Entity for Category {
    const PREFIX: EntityPrefix = EntityPrefix::Cat;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_display_path_walks_parents() {
        let root = Category::new("Hardware");
        let mid = Category::new("Fasteners").with_parent(root.id.clone());
        let leaf = Category::new("Bolts").with_parent(mid.id.clone());

        let all: HashMap<EntityId, Category> = [root.clone(), mid.clone()]
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

        assert_eq!(
            leaf.display_path(|id| all.get(id).cloned()),
            "Hardware/Fasteners/Bolts"
        );
        assert_eq!(root.display_path(|id| all.get(id).cloned()), "Hardware");
    }

    #[test]
    fn test_display_path_stops_on_loop() {
        let mut a = Category::new("A");
        let b = Category::new("B").with_parent(a.id.clone());
        a.parent = Some(b.id.clone());

        let all: HashMap<EntityId, Category> = [a.clone(), b.clone()]
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

        assert_eq!(b.display_path(|id| all.get(id).cloned()), "A/B");
    }

    #[test]
    fn test_origin_type_parse() {
        assert_eq!("Service".parse::<OriginType>().unwrap(), OriginType::Service);
        assert!("rental".parse::<OriginType>().is_err());
    }

    #[test]
    fn test_origin_type_serialization() {
        let cat = Category::new("Machined").with_origin(OriginType::Production);
        let yaml = serde_yml::to_string(&cat).unwrap();
        assert!(yaml.contains("origin_type: production"));
    }
}
