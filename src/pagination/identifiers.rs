use serde_json::Value;

use crate::tree_transform::root_identifier_alias;

use super::errors::PaginationError;
use super::executor::Row;

/// One root identity: a scalar per identity column, in key order.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierKey(pub Vec<Value>);

impl IdentifierKey {
    pub fn values(&self) -> &[Value] {
        &self.0
    }
}

/// Identifier keys deduplicated by value equality, kept in first-seen order.
///
/// The order is incidental; the row-fetch query re-establishes its own ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentifierSet {
    keys: Vec<IdentifierKey>,
}

impl IdentifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when an equal key is already present.
    pub fn insert(&mut self, key: IdentifierKey) -> bool {
        if self.keys.contains(&key) {
            return false;
        }
        self.keys.push(key);
        true
    }

    /// Reads `root_id_0 .. root_id_{width-1}` from every row.
    pub fn from_rows(rows: &[Row], width: usize) -> Result<Self, PaginationError> {
        let mut set = Self::new();
        for row in rows {
            let values = (0..width)
                .map(|i| {
                    let alias = root_identifier_alias(i);
                    row.get(&alias)
                        .cloned()
                        .ok_or(PaginationError::IdentifierColumnMissing { alias })
                })
                .collect::<Result<Vec<_>, _>>()?;
            set.insert(IdentifierKey(values));
        }
        log::debug!(
            "Collected {} distinct identifiers from {} rows",
            set.len(),
            rows.len()
        );
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[IdentifierKey] {
        &self.keys
    }
}
