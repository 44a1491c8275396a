use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::query_tree::{HydrationMode, Parameters};

/// One result row keyed by column alias, in projection order.
pub type Row = Map<String, Value>;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Query execution failed: {source}")]
    Backend {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Query did not complete within {millis} ms")]
    Timeout { millis: u64 },
}

impl ExecutionError {
    pub fn backend(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        ExecutionError::Backend {
            source: source.into(),
        }
    }
}

/// Runs generated SQL against the database.
///
/// `parameters` holds every named parameter the SQL references (`:name`);
/// `hydration` is passed through from the query and tells the implementation
/// how the caller expects rows to be shaped. The paginator never interprets
/// rows beyond reading its own `root_id_<n>` and `row_count` aliases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(
        &self,
        sql: &str,
        parameters: &Parameters,
        hydration: HydrationMode,
    ) -> Result<Vec<Row>, ExecutionError>;
}
