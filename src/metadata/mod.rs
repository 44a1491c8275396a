//! Entity metadata: table names, identity properties and property-to-column maps
//!
//! The rewriter only reads metadata through [`MetadataLookup`]. [`EntityCatalog`]
//! is the in-crate implementation, built in code or loaded from a YAML/JSON file:
//!
//! ```yaml
//! entities:
//!   User:
//!     table_name: users
//!     identifier: [id]
//!     columns:
//!       id: user_id
//!       name: full_name
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::query_tree::{FromClause, TableAlias};

pub mod errors;

pub use errors::MetadataError;

/// Mapping of one entity onto its table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub table_name: String,
    /// Identity properties in key order
    pub identifier: Vec<String>,
    /// property -> column
    pub columns: BTreeMap<String, String>,
}

impl EntityMetadata {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            identifier: Vec::new(),
            columns: BTreeMap::new(),
        }
    }

    /// Adds an identity property mapped to `column`.
    pub fn with_id(mut self, property: impl Into<String>, column: impl Into<String>) -> Self {
        let property = property.into();
        self.identifier.push(property.clone());
        self.columns.insert(property, column.into());
        self
    }

    pub fn with_column(mut self, property: impl Into<String>, column: impl Into<String>) -> Self {
        self.columns.insert(property.into(), column.into());
        self
    }

    pub fn column_for(&self, property: &str) -> Option<&str> {
        self.columns.get(property).map(String::as_str)
    }

    /// (property, column) pairs: identity properties first in key order, then the
    /// remaining properties by name. Whole-entity projections render in this order.
    pub fn ordered_columns(&self) -> Vec<(&str, &str)> {
        let mut ordered: Vec<(&str, &str)> = self
            .identifier
            .iter()
            .filter_map(|p| self.column_for(p).map(|c| (p.as_str(), c)))
            .collect();
        ordered.extend(
            self.columns
                .iter()
                .filter(|(p, _)| !self.identifier.contains(*p))
                .map(|(p, c)| (p.as_str(), c.as_str())),
        );
        ordered
    }
}

/// Read-only access to entity metadata by entity name.
pub trait MetadataLookup: Send + Sync {
    fn entity(&self, name: &str) -> Option<&EntityMetadata>;
}

/// Metadata for an alias, resolved through the FROM clause that declares it.
pub fn resolve_alias<'a>(
    lookup: &'a dyn MetadataLookup,
    from: &FromClause,
    alias: &str,
) -> Result<&'a EntityMetadata, MetadataError> {
    let entity = from
        .entity_for_alias(alias)
        .ok_or_else(|| MetadataError::UnknownAlias {
            alias: alias.to_string(),
        })?;
    lookup
        .entity(entity)
        .ok_or_else(|| MetadataError::UnknownEntity {
            entity: entity.to_string(),
        })
}

/// Fully-qualified identity columns (`alias.column`) of the root behind `alias`.
pub fn identity_columns(
    lookup: &dyn MetadataLookup,
    from: &FromClause,
    alias: &TableAlias,
) -> Result<Vec<String>, MetadataError> {
    let metadata = resolve_alias(lookup, from, &alias.0)?;
    let entity = from.entity_for_alias(&alias.0).unwrap_or_default();
    if metadata.identifier.is_empty() {
        return Err(MetadataError::MissingIdentifier {
            entity: entity.to_string(),
        });
    }

    metadata
        .identifier
        .iter()
        .map(|property| {
            metadata
                .column_for(property)
                .map(|column| crate::sql_generator::common::qualified_column(&alias.0, column))
                .ok_or_else(|| MetadataError::UnknownProperty {
                    entity: entity.to_string(),
                    property: property.clone(),
                })
        })
        .collect()
}

/// In-memory catalog of entity metadata keyed by entity name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityCatalog {
    pub entities: BTreeMap<String, EntityMetadata>,
}

impl EntityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, name: impl Into<String>, metadata: EntityMetadata) -> Self {
        self.entities.insert(name.into(), metadata);
        self
    }

    /// Load a catalog from YAML (JSON is valid YAML, so both work).
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, MetadataError> {
        let content = std::fs::read_to_string(path).map_err(|e| MetadataError::CatalogRead {
            error: e.to_string(),
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, MetadataError> {
        let catalog: Self =
            serde_yaml::from_str(content).map_err(|e| MetadataError::CatalogParse {
                error: e.to_string(),
            })?;
        catalog.validate()?;
        log::debug!("Loaded entity catalog with {} entities", catalog.entities.len());
        Ok(catalog)
    }

    /// Every identity property must be mapped to a column.
    fn validate(&self) -> Result<(), MetadataError> {
        for (name, metadata) in &self.entities {
            for property in &metadata.identifier {
                if metadata.column_for(property).is_none() {
                    return Err(MetadataError::UnknownProperty {
                        entity: name.clone(),
                        property: property.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl MetadataLookup for EntityCatalog {
    fn entity(&self, name: &str) -> Option<&EntityMetadata> {
        self.entities.get(name)
    }
}
