use thiserror::Error;

use crate::sql_generator::RewriteError;

use super::executor::ExecutionError;

#[derive(Debug, Error)]
pub enum PaginationError {
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error("Identifier query result has no `{alias}` column")]
    IdentifierColumnMissing { alias: String },
    #[error("Row fetch would bind {count} identifier parameters, more than the configured maximum of {max}")]
    TooManyIdentifiers { count: usize, max: usize },
    #[error("Count query did not return a non-negative integer `row_count` column")]
    MalformedCountResult,
}
