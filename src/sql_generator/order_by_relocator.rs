//! Moves ORDER BY terms onto the row-number window of the wrapping query
//!
//! The dialect forbids ORDER BY inside a derived table, so ordering is applied by
//! `ROW_NUMBER() OVER (ORDER BY ...)` one level up. At that level only the inner
//! query's output aliases are visible, so each term is rewritten to
//! `outer_table.<alias> <direction>`.

use crate::query_tree::{Expr, OrderByItem};

use super::base_sql::{BaseSqlBuilder, RenderedProjection};
use super::common::quote_identifier;
use super::errors::RewriteError;
use super::OUTER_TABLE_ALIAS;

pub fn relocate(
    builder: &BaseSqlBuilder<'_>,
    order_by: &[OrderByItem],
    projection: &RenderedProjection,
) -> Result<Vec<String>, RewriteError> {
    order_by
        .iter()
        .map(|item| {
            let alias = match &item.expression {
                Expr::ResultVariable(alias) if projection.has_alias(&alias.0) => alias.0.clone(),
                Expr::ResultVariable(alias) => {
                    return Err(RewriteError::AliasResolutionFailure {
                        expression: alias.0.clone(),
                    })
                }
                expr => {
                    let expression_sql = builder.render_expr(expr)?;
                    projection
                        .alias_for_expression(&expression_sql)
                        .map(str::to_string)
                        .ok_or(RewriteError::AliasResolutionFailure {
                            expression: expression_sql,
                        })?
                }
            };
            log::trace!("ORDER BY term relocated to alias '{}'", alias);
            Ok(format!(
                "{}.{} {}",
                OUTER_TABLE_ALIAS,
                quote_identifier(&alias),
                item.order.as_sql()
            ))
        })
        .collect()
}
