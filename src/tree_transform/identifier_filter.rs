//! Restricts a query to an explicit set of root identifiers
//!
//! Identifier values are bound as named parameters (`:paginator_id_1`, ...),
//! never inlined. Single-column keys become one `IN` list. The dialect has no
//! row-value `IN`, so composite keys become a disjunction of per-column
//! equalities:
//!
//! ```text
//! (o.tenant = :paginator_id_1_0 AND o.no = :paginator_id_1_1) OR (...)
//! ```

use crate::metadata::{resolve_alias, MetadataLookup};
use crate::pagination::IdentifierSet;
use crate::query_tree::{Expr, Operator, Parameters, SelectQuery};
use crate::sql_generator::RewriteError;

use super::{TransformResult, Transformed, TreeTransform};

pub const IDENTIFIER_PARAMETER_PREFIX: &str = "paginator_id_";

/// Parameter name for the `key`-th identifier (1-based) and, for composite keys,
/// its `column`-th value.
pub fn identifier_parameter(key: usize, column: Option<usize>) -> String {
    match column {
        Some(column) => format!("{}{}_{}", IDENTIFIER_PARAMETER_PREFIX, key, column),
        None => format!("{}{}", IDENTIFIER_PARAMETER_PREFIX, key),
    }
}

/// Rejects caller parameters that use the identifier parameter namespace.
pub fn check_reserved_parameters(parameters: &Parameters) -> TransformResult<()> {
    match parameters
        .keys()
        .find(|name| name.starts_with(IDENTIFIER_PARAMETER_PREFIX))
    {
        Some(name) => Err(RewriteError::unsupported(format!(
            "parameter `{}` is reserved for identifier pagination",
            name
        ))),
        None => Ok(()),
    }
}

pub struct IdentifierFilter<'a> {
    metadata: &'a dyn MetadataLookup,
    identifiers: &'a IdentifierSet,
}

impl<'a> IdentifierFilter<'a> {
    pub fn new(metadata: &'a dyn MetadataLookup, identifiers: &'a IdentifierSet) -> Self {
        Self {
            metadata,
            identifiers,
        }
    }
}

impl TreeTransform for IdentifierFilter<'_> {
    fn transform(&self, query: &SelectQuery) -> TransformResult<Transformed<SelectQuery>> {
        if self.identifiers.is_empty() {
            return Err(RewriteError::unsupported(
                "identifier filter over an empty identifier set",
            ));
        }
        let root = query.single_root().ok_or_else(|| {
            RewriteError::unsupported("identifier filter needs exactly one root source")
        })?;
        let identity = &resolve_alias(self.metadata, &query.from, &root.alias.0)?.identifier;

        let mut query = query.clone();
        let mut bind = |name: String, value: &serde_json::Value| -> TransformResult<Expr> {
            if query.parameters.contains_key(&name) {
                return Err(RewriteError::unsupported(format!(
                    "parameter `{}` is reserved for identifier pagination",
                    name
                )));
            }
            query.parameters.insert(name.clone(), value.clone());
            Ok(Expr::Parameter(name))
        };

        let id_filter = if let [property] = identity.as_slice() {
            let placeholders = self
                .identifiers
                .keys()
                .iter()
                .enumerate()
                .map(|(i, key)| bind(identifier_parameter(i + 1, None), &key.values()[0]))
                .collect::<TransformResult<Vec<_>>>()?;
            Expr::apply(
                Operator::In,
                vec![
                    Expr::property(root.alias.0.clone(), property.clone()),
                    Expr::List(placeholders),
                ],
            )
        } else {
            let mut alternatives = Vec::with_capacity(self.identifiers.len());
            for (i, key) in self.identifiers.keys().iter().enumerate() {
                if key.values().len() != identity.len() {
                    return Err(RewriteError::unsupported(format!(
                        "identifier has {} values but the key has {} columns",
                        key.values().len(),
                        identity.len()
                    )));
                }
                let equalities = identity
                    .iter()
                    .zip(key.values())
                    .enumerate()
                    .map(|(j, (property, value))| {
                        Ok(Expr::apply(
                            Operator::Equal,
                            vec![
                                Expr::property(root.alias.0.clone(), property.clone()),
                                bind(identifier_parameter(i + 1, Some(j)), value)?,
                            ],
                        ))
                    })
                    .collect::<TransformResult<Vec<_>>>()?;
                alternatives.push(Expr::apply(Operator::And, equalities));
            }
            match alternatives.len() {
                1 => alternatives.remove(0),
                _ => Expr::apply(Operator::Or, alternatives),
            }
        };

        query.filter = Some(match query.filter.take() {
            Some(existing) => Expr::and(existing, id_filter),
            None => id_filter,
        });
        Ok(Transformed::Yes(query))
    }
}
