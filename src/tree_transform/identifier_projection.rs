//! Restricts a query's projection to the root identity columns
//!
//! Identity columns are always exposed as `root_id_0`, `root_id_1`, ... so the
//! paginator reads identifiers from result rows by exact alias. Ordering terms
//! are projected too (the row-number window can only order by projected
//! columns), keeping any result-variable alias they were declared under.

use crate::metadata::{resolve_alias, MetadataError, MetadataLookup};
use crate::query_tree::{ColumnAlias, Expr, SelectItem, SelectQuery};
use crate::sql_generator::{BaseSqlBuilder, RenderedProjection, RewriteError};

use super::{TransformResult, Transformed, TreeTransform};

pub const ROOT_IDENTIFIER_ALIAS_PREFIX: &str = "root_id_";

pub fn root_identifier_alias(position: usize) -> String {
    format!("{}{}", ROOT_IDENTIFIER_ALIAS_PREFIX, position)
}

pub struct IdentifierProjection<'a> {
    metadata: &'a dyn MetadataLookup,
}

impl<'a> IdentifierProjection<'a> {
    pub fn new(metadata: &'a dyn MetadataLookup) -> Self {
        Self { metadata }
    }
}

impl TreeTransform for IdentifierProjection<'_> {
    fn transform(&self, query: &SelectQuery) -> TransformResult<Transformed<SelectQuery>> {
        let root = query.single_root().ok_or_else(|| {
            RewriteError::unsupported("identifier projection needs exactly one root source")
        })?;
        let metadata = resolve_alias(self.metadata, &query.from, &root.alias.0)?;
        if metadata.identifier.is_empty() {
            return Err(MetadataError::MissingIdentifier {
                entity: root.entity.clone(),
            }
            .into());
        }

        let mut items: Vec<SelectItem> = metadata
            .identifier
            .iter()
            .enumerate()
            .map(|(i, property)| {
                SelectItem::aliased(
                    Expr::property(root.alias.0.clone(), property.clone()),
                    root_identifier_alias(i),
                )
            })
            .collect();

        if let Some(alias) = query.projection.items.iter().find_map(|item| match item {
            SelectItem::Expression { alias: Some(a), .. }
                if a.0.starts_with(ROOT_IDENTIFIER_ALIAS_PREFIX) =>
            {
                Some(a)
            }
            _ => None,
        }) {
            return Err(RewriteError::unsupported(format!(
                "projection alias `{}` is reserved for identifier pagination",
                alias.0
            )));
        }

        let has_alias = |items: &[SelectItem], alias: &ColumnAlias| {
            items.iter().any(|item| {
                matches!(item, SelectItem::Expression { alias: Some(a), .. } if a == alias)
            })
        };
        // Generated aliases (`name_2`, `sclr_0`) only exist once the original
        // projection is rendered.
        let mut original_bindings: Option<RenderedProjection> = None;

        for order in &query.order_by {
            match &order.expression {
                Expr::ResultVariable(alias) => {
                    if has_alias(&items, alias) {
                        continue;
                    }
                    let declared = query.projection.items.iter().find(|item| {
                        matches!(item, SelectItem::Expression { alias: Some(a), .. } if a == alias)
                    });
                    if let Some(declared) = declared {
                        items.push(declared.clone());
                        continue;
                    }
                    if original_bindings.is_none() {
                        original_bindings = Some(
                            BaseSqlBuilder::new(self.metadata, &query.from)
                                .render_projection(&query.projection)?,
                        );
                    }
                    let generated = original_bindings
                        .as_ref()
                        .and_then(|rendered| rendered.bindings.iter().find(|b| b.alias == alias.0));
                    // An unknown result variable is left for the relocator to report
                    if let Some(binding) = generated {
                        items.push(SelectItem::aliased(
                            Expr::Raw(binding.expression_sql.clone()),
                            binding.alias.clone(),
                        ));
                    }
                }
                expr => {
                    let already = items.iter().any(|item| {
                        matches!(item, SelectItem::Expression { expression, .. } if expression == expr)
                    });
                    if !already {
                        items.push(SelectItem::expression(expr.clone()));
                    }
                }
            }
        }

        let mut query = query.clone();
        query.projection.items = items;
        Ok(Transformed::Yes(query))
    }
}
