//! Identity-based DISTINCT emulation
//!
//! A plain `SELECT DISTINCT` compares every projected column, so a root row joined
//! to two collection members survives twice. Numbering rows within each identity
//! partition and keeping `distinct_row = 1` keeps exactly one row per root
//! identity while leaving the other columns untouched. Which duplicate survives is
//! unspecified: the partition is ordered by `(SELECT 0)`.

use super::errors::RewriteError;

pub const DISTINCT_ROW_ALIAS: &str = "distinct_row";

/// `ROW_NUMBER() OVER (PARTITION BY <cols> ORDER BY (SELECT 0)) AS distinct_row`
pub fn partition_expr(identity_columns: &[String]) -> Result<String, RewriteError> {
    if identity_columns.is_empty() {
        return Err(RewriteError::unsupported(
            "DISTINCT needs at least one identity column to partition by",
        ));
    }

    Ok(format!(
        "ROW_NUMBER() OVER (PARTITION BY {} ORDER BY (SELECT 0)) AS {}",
        identity_columns.join(", "),
        DISTINCT_ROW_ALIAS
    ))
}

/// Predicate applied in the row-numbering wrapper to drop duplicate partitions.
pub fn distinct_filter() -> String {
    format!("WHERE {} = 1", DISTINCT_ROW_ALIAS)
}
