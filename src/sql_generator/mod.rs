//! SQL generation for dialects without LIMIT/OFFSET and with all-column DISTINCT
//!
//! The base query is compiled without ORDER BY and wrapped so that ordering,
//! identity de-duplication and pagination all happen through `ROW_NUMBER()`:
//!
//! ```text
//! SELECT * FROM (
//!     SELECT ROW_NUMBER() OVER (ORDER BY outer_table.<alias> ...) AS rownumber, *
//!     FROM (
//!         SELECT ROW_NUMBER() OVER (PARTITION BY <identity> ORDER BY (SELECT 0)) AS distinct_row,
//!                <projection>
//!         FROM ... WHERE ...
//!     ) AS outer_table
//!     WHERE distinct_row = 1
//! ) AS paged_result WHERE rownumber BETWEEN <offset + 1> AND <offset + limit>
//! ORDER BY rownumber
//! ```
//!
//! The partition column and its filter only appear for DISTINCT queries, the
//! `paged_result` level only when a limit is given, and the trailing
//! `ORDER BY rownumber` only when the query has its own ordering.

use crate::metadata::{identity_columns, MetadataLookup};
use crate::query_tree::SelectQuery;

pub mod base_sql;
pub mod common;
pub mod distinct_partitioner;
mod errors;
pub mod order_by_relocator;
pub mod window;

pub use base_sql::{BaseSqlBuilder, ProjectionBinding, RenderedProjection};
pub use errors::RewriteError;
pub use window::{PaginationParams, RowNumberWindow};

pub const OUTER_TABLE_ALIAS: &str = "outer_table";
pub const PAGED_RESULT_ALIAS: &str = "paged_result";
pub const ROW_NUMBER_ALIAS: &str = "rownumber";

/// Window ordering used when the query has none; the dialect requires one.
pub const NO_OP_ORDER: &str = "ORDER BY (SELECT 0)";

/// Rewrites query trees into nested ROW_NUMBER() SQL against one metadata source.
pub struct SqlRewriter<'a> {
    metadata: &'a dyn MetadataLookup,
}

impl<'a> SqlRewriter<'a> {
    pub fn new(metadata: &'a dyn MetadataLookup) -> Self {
        Self { metadata }
    }

    pub fn rewrite(
        &self,
        query: &SelectQuery,
        pagination: &PaginationParams,
    ) -> Result<String, RewriteError> {
        // Fail on bad pagination before doing any rendering work
        let window = RowNumberWindow::from_params(pagination)?;
        let builder = BaseSqlBuilder::new(self.metadata, &query.from);

        let projection = builder.render_projection(&query.projection)?;
        let from = builder.render_from()?;
        let filter = builder.render_filter(query.filter.as_ref())?;

        let mut leading = Vec::new();
        if query.projection.distinct {
            let root = query.single_root().ok_or_else(|| {
                RewriteError::unsupported(format!(
                    "DISTINCT over {} root sources; identity columns are only defined for a single root",
                    query.from.roots.len()
                ))
            })?;
            let identity = identity_columns(self.metadata, &query.from, &root.alias)?;
            leading.push(distinct_partitioner::partition_expr(&identity)?);
        }

        let mut base = format!("{}\n{}", projection.to_sql(&leading), from);
        if let Some(filter) = filter {
            base.push('\n');
            base.push_str(&filter);
        }
        log::trace!("Base SQL:\n{}", base);

        let over = if query.order_by.is_empty() {
            NO_OP_ORDER.to_string()
        } else {
            let relocated = order_by_relocator::relocate(&builder, &query.order_by, &projection)?;
            format!("ORDER BY {}", relocated.join(", "))
        };

        let mut sql = format!(
            "SELECT ROW_NUMBER() OVER ({}) AS {}, * FROM ({}) AS {}",
            over, ROW_NUMBER_ALIAS, base, OUTER_TABLE_ALIAS
        );

        if query.projection.distinct {
            sql.push(' ');
            sql.push_str(&distinct_partitioner::distinct_filter());
        }

        if let Some(window) = window {
            log::trace!("Row window {}..={} ({} rows)", window.start, window.end, window.len());
            sql = format!(
                "SELECT * FROM ({}) AS {} WHERE {}",
                sql,
                PAGED_RESULT_ALIAS,
                window.to_sql()
            );
        }

        if !query.order_by.is_empty() {
            sql.push_str(&format!(" ORDER BY {}", ROW_NUMBER_ALIAS));
        }

        log::debug!("Rewritten SQL: {}", sql);
        Ok(sql)
    }
}

/// Rewrite `query` into windowed, identity-distinct SQL. Pure and deterministic.
pub fn rewrite(
    query: &SelectQuery,
    metadata: &dyn MetadataLookup,
    pagination: &PaginationParams,
) -> Result<String, RewriteError> {
    SqlRewriter::new(metadata).rewrite(query, pagination)
}
