//! Pagewalker - ROW_NUMBER() pagination for SQL Server-style dialects
//!
//! This crate turns ORM query trees into SQL for dialects that have no
//! LIMIT/OFFSET and whose DISTINCT compares every projected column:
//! - Row windows through nested `ROW_NUMBER() OVER (...)` wrappers
//! - DISTINCT on root identity through a partitioned row number
//! - ORDER BY relocated onto the wrapper's projected aliases
//! - Two-phase pagination for queries that fetch-join collections

pub mod config;
pub mod metadata;
pub mod pagination;
pub mod query_tree;
pub mod sql_generator;
pub mod tree_transform;

pub use config::PaginatorConfig;
pub use metadata::{EntityCatalog, EntityMetadata, MetadataLookup};
pub use pagination::{
    count, paginate, ExecutionError, PaginatedRows, PaginationError, Paginator, QueryExecutor, Row,
};
pub use query_tree::{HydrationMode, SelectQuery};
pub use sql_generator::{rewrite, PaginationParams, RewriteError};
