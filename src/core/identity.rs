//! Record identity using type-prefixed ULIDs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// Record type prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityPrefix {
    /// Component family (interchangeable-parts grouping)
    Fam,
    /// Nomenclature (concrete part or assembly)
    Nom,
    /// Bill-of-materials line
    Bom,
    /// Family category
    Cat,
    /// Unit of measure
    Uom,
    /// Technical parameter of a nomenclature
    Par,
}

impl EntityPrefix {
    /// Get the string representation of the prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Fam => "FAM",
            EntityPrefix::Nom => "NOM",
            EntityPrefix::Bom => "BOM",
            EntityPrefix::Cat => "CAT",
            EntityPrefix::Uom => "UOM",
            EntityPrefix::Par => "PAR",
        }
    }

    /// Get all valid prefixes
    pub fn all() -> &'static [EntityPrefix] {
        &[
            EntityPrefix::Fam,
            EntityPrefix::Nom,
            EntityPrefix::Bom,
            EntityPrefix::Cat,
            EntityPrefix::Uom,
            EntityPrefix::Par,
        ]
    }
}

impl fmt::Display for EntityPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityPrefix {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "FAM" => Ok(EntityPrefix::Fam),
            "NOM" => Ok(EntityPrefix::Nom),
            "BOM" => Ok(EntityPrefix::Bom),
            "CAT" => Ok(EntityPrefix::Cat),
            "UOM" => Ok(EntityPrefix::Uom),
            "PAR" => Ok(EntityPrefix::Par),
            _ => Err(IdParseError::InvalidPrefix(s.to_string())),
        }
    }
}

/// A unique record identifier combining a type prefix and ULID
///
/// Ordering follows the prefix, then the ULID, so ids of one type sort by
/// creation time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId {
    prefix: EntityPrefix,
    ulid: Ulid,
}

impl EntityId {
    /// Create a new EntityId with the given prefix
    pub fn new(prefix: EntityPrefix) -> Self {
        Self {
            prefix,
            ulid: Ulid::new(),
        }
    }

    /// Get the record prefix
    pub fn prefix(&self) -> EntityPrefix {
        self.prefix
    }

    /// Parse an EntityId from a string
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        s.parse()
    }

    /// Parse an id and require a specific prefix
    pub fn parse_as(s: &str, expected: EntityPrefix) -> Result<Self, IdParseError> {
        let id = Self::parse(s)?;
        if id.prefix != expected {
            return Err(IdParseError::WrongPrefix {
                expected,
                found: id.prefix,
            });
        }
        Ok(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.ulid)
    }
}

impl FromStr for EntityId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix_str, ulid_str) = s
            .split_once('-')
            .ok_or_else(|| IdParseError::MissingDelimiter(s.to_string()))?;

        let prefix = prefix_str.parse()?;
        let ulid = Ulid::from_string(ulid_str)
            .map_err(|e| IdParseError::InvalidUlid(ulid_str.to_string(), e.to_string()))?;

        Ok(Self { prefix, ulid })
    }
}

impl Serialize for EntityId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing record IDs
#[derive(Debug, Error)]
pub enum IdParseError {
    #[error("invalid record prefix: '{0}' (valid: FAM, NOM, BOM, CAT, UOM, PAR)")]
    InvalidPrefix(String),

    #[error("missing '-' delimiter in record ID: '{0}'")]
    MissingDelimiter(String),

    #[error("invalid ULID '{0}': {1}")]
    InvalidUlid(String, String),

    #[error("expected a {expected} id, got a {found} id")]
    WrongPrefix {
        expected: EntityPrefix,
        found: EntityPrefix,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_generation() {
        let id = EntityId::new(EntityPrefix::Nom);
        assert!(id.to_string().starts_with("NOM-"));
        assert_eq!(id.to_string().len(), 30); // NOM- (4) + ULID (26) = 30
    }

    #[test]
    fn test_entity_id_parsing() {
        let original = EntityId::new(EntityPrefix::Bom);
        let parsed = EntityId::parse(&original.to_string()).unwrap();
        assert_eq!(parsed.prefix(), EntityPrefix::Bom);
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_entity_id_invalid_prefix() {
        let err = EntityId::parse("XXX-01HQ3K4N5M6P7R8S9T0VWXYZ").unwrap_err();
        assert!(matches!(err, IdParseError::InvalidPrefix(_)));
    }

    #[test]
    fn test_entity_id_missing_delimiter() {
        let err = EntityId::parse("NOM01HQ3K4N5M6P7R8S9T0VWXYZ").unwrap_err();
        assert!(matches!(err, IdParseError::MissingDelimiter(_)));
    }

    #[test]
    fn test_entity_id_invalid_ulid() {
        let err = EntityId::parse("NOM-notaulid").unwrap_err();
        assert!(matches!(err, IdParseError::InvalidUlid(_, _)));
    }

    #[test]
    fn test_parse_as_rejects_other_prefix() {
        let fam = EntityId::new(EntityPrefix::Fam);
        let err = EntityId::parse_as(&fam.to_string(), EntityPrefix::Nom).unwrap_err();
        assert!(matches!(
            err,
            IdParseError::WrongPrefix {
                expected: EntityPrefix::Nom,
                found: EntityPrefix::Fam
            }
        ));
    }

    #[test]
    fn test_all_prefixes_parse() {
        for prefix in EntityPrefix::all() {
            let id = EntityId::new(*prefix);
            let parsed = EntityId::parse(&id.to_string()).unwrap();
            assert_eq!(parsed.prefix(), *prefix);
        }
    }
}
