//! Page-correct pagination over queries that fetch-join collections
//!
//! When a root entity is joined to a collection, one root spans several SQL
//! rows and a row window would cut roots apart. Such queries run in two phases:
//!
//! 1. the identifier query (forced DISTINCT, projection reduced to the root
//!    identity plus ordering terms) is windowed and returns one row per root;
//! 2. the original query, with pagination cleared and its filter restricted to
//!    the collected identifiers, returns every row of exactly those roots.
//!
//! Queries without a collection join take the single-phase path: one rewrite,
//! one execution. All SQL a call can emit is generated before the first
//! execution, so rewrite failures never leave a half-finished call behind.

use std::time::Duration;

use crate::config::PaginatorConfig;
use crate::metadata::{identity_columns, MetadataLookup};
use crate::query_tree::{HydrationMode, Parameters, SelectQuery};
use crate::sql_generator::{rewrite, PaginationParams, RewriteError};
use crate::tree_transform::{
    apply_all, check_reserved_parameters, ForceDistinct, IdentifierFilter, IdentifierProjection,
    TreeTransform,
};

mod errors;
pub mod executor;
mod identifiers;

pub use errors::PaginationError;
pub use executor::{ExecutionError, QueryExecutor, Row};
pub use identifiers::{IdentifierKey, IdentifierSet};

pub const ROW_COUNT_ALIAS: &str = "row_count";
pub const COUNT_RESULT_ALIAS: &str = "count_result";

/// Fully materialized page of rows, consumed once.
#[derive(Debug, Default)]
pub struct PaginatedRows {
    rows: std::vec::IntoIter<Row>,
}

impl PaginatedRows {
    fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: rows.into_iter(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.len() == 0
    }
}

impl Iterator for PaginatedRows {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.rows.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for PaginatedRows {}

/// Everything the two-phase path needs, built before anything runs.
struct TwoPhasePlan {
    identifier_query: SelectQuery,
    identifier_sql: String,
    width: usize,
}

pub struct Paginator<'a> {
    query: &'a SelectQuery,
    metadata: &'a dyn MetadataLookup,
    fetch_join_collection: bool,
    config: PaginatorConfig,
}

impl<'a> Paginator<'a> {
    /// Two-phase mode defaults to whether the query joins a collection.
    pub fn new(query: &'a SelectQuery, metadata: &'a dyn MetadataLookup) -> Self {
        Self {
            query,
            metadata,
            fetch_join_collection: query.has_collection_join(),
            config: PaginatorConfig::default(),
        }
    }

    pub fn with_fetch_join_collection(mut self, fetch_join_collection: bool) -> Self {
        self.fetch_join_collection = fetch_join_collection;
        self
    }

    pub fn with_config(mut self, config: PaginatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn fetch_join_collection(&self) -> bool {
        self.fetch_join_collection
    }

    /// The phase-one tree: root identity aliased `root_id_<n>`, ordering terms
    /// kept, forced DISTINCT, scalar hydration.
    pub fn identifier_query(&self) -> Result<SelectQuery, RewriteError> {
        self.derive_identifier_query(self.query)
    }

    /// Run every two-phase check that does not need the database and return
    /// the identifier query SQL.
    pub fn preflight(&self, pagination: &PaginationParams) -> Result<String, PaginationError> {
        Ok(self.plan_two_phase(pagination)?.identifier_sql)
    }

    /// `SELECT COUNT(*) AS row_count` over the unordered, unpaginated query
    /// (over its identifier query in two-phase mode).
    pub fn count_sql(&self) -> Result<String, RewriteError> {
        let mut unordered = self.query.clone();
        unordered.order_by.clear();
        if self.fetch_join_collection {
            unordered = self.derive_identifier_query(&unordered)?;
        }

        let inner = rewrite(&unordered, self.metadata, &PaginationParams::new())?;
        Ok(format!(
            "SELECT COUNT(*) AS {} FROM ({}) AS {}",
            ROW_COUNT_ALIAS, inner, COUNT_RESULT_ALIAS
        ))
    }

    fn derive_identifier_query(&self, query: &SelectQuery) -> Result<SelectQuery, RewriteError> {
        let projection = IdentifierProjection::new(self.metadata);
        let passes: [&dyn TreeTransform; 2] = [&ForceDistinct, &projection];
        let mut identifier_query = apply_all(query, &passes)?;
        identifier_query.hydration = HydrationMode::Scalar;
        Ok(identifier_query)
    }

    fn plan_two_phase(&self, pagination: &PaginationParams) -> Result<TwoPhasePlan, PaginationError> {
        check_reserved_parameters(&self.query.parameters)?;

        let identifier_query = self.identifier_query()?;
        let identifier_sql = rewrite(&identifier_query, self.metadata, pagination)?;

        // The row fetch differs from this only by an extra IN/OR filter
        rewrite(self.query, self.metadata, &PaginationParams::new())?;

        let root = self
            .query
            .single_root()
            .ok_or_else(|| RewriteError::unsupported("two-phase pagination needs one root source"))?;
        let width = identity_columns(self.metadata, &self.query.from, &root.alias)
            .map_err(RewriteError::from)?
            .len();

        if let Some(limit) = pagination.limit {
            let count = usize::try_from(limit)
                .unwrap_or(usize::MAX)
                .saturating_mul(width);
            self.check_identifier_budget(count)?;
        }

        Ok(TwoPhasePlan {
            identifier_query,
            identifier_sql,
            width,
        })
    }

    fn check_identifier_budget(&self, count: usize) -> Result<(), PaginationError> {
        let max = self.config.max_identifier_parameters;
        if count > max {
            return Err(PaginationError::TooManyIdentifiers { count, max });
        }
        Ok(())
    }

    pub async fn fetch<E>(
        &self,
        executor: &E,
        pagination: &PaginationParams,
    ) -> Result<PaginatedRows, PaginationError>
    where
        E: QueryExecutor + ?Sized,
    {
        if !self.fetch_join_collection {
            let sql = rewrite(self.query, self.metadata, pagination)?;
            log::info!("Single-phase pagination");
            let rows = self
                .run(executor, &sql, &self.query.parameters, self.query.hydration)
                .await?;
            return Ok(PaginatedRows::new(rows));
        }

        let plan = self.plan_two_phase(pagination)?;
        log::info!("Two-phase pagination over {} identity column(s)", plan.width);

        let identifier_rows = self
            .run(
                executor,
                &plan.identifier_sql,
                &plan.identifier_query.parameters,
                HydrationMode::Scalar,
            )
            .await?;
        let identifiers = IdentifierSet::from_rows(&identifier_rows, plan.width)?;
        if identifiers.is_empty() {
            log::info!("Identifier query returned no roots, skipping row fetch");
            return Ok(PaginatedRows::empty());
        }
        self.check_identifier_budget(identifiers.len() * plan.width)?;

        let filtered = IdentifierFilter::new(self.metadata, &identifiers)
            .transform(self.query)?
            .into_inner();
        let sql = rewrite(&filtered, self.metadata, &PaginationParams::new())?;
        let rows = self
            .run(executor, &sql, &filtered.parameters, self.query.hydration)
            .await?;
        log::debug!(
            "Fetched {} rows for {} roots",
            rows.len(),
            identifiers.len()
        );
        Ok(PaginatedRows::new(rows))
    }

    /// Total number of results the query pages over: distinct roots in
    /// two-phase mode, rows otherwise.
    pub async fn count<E>(&self, executor: &E) -> Result<u64, PaginationError>
    where
        E: QueryExecutor + ?Sized,
    {
        let sql = self.count_sql()?;
        let rows = self
            .run(executor, &sql, &self.query.parameters, HydrationMode::Scalar)
            .await?;

        rows.first()
            .and_then(|row| row.get(ROW_COUNT_ALIAS))
            .and_then(|value| value.as_u64())
            .ok_or(PaginationError::MalformedCountResult)
    }

    async fn run<E>(
        &self,
        executor: &E,
        sql: &str,
        parameters: &Parameters,
        hydration: HydrationMode,
    ) -> Result<Vec<Row>, ExecutionError>
    where
        E: QueryExecutor + ?Sized,
    {
        log::debug!("Executing: {}", sql);
        match self.config.query_timeout_ms {
            Some(millis) => tokio::time::timeout(
                Duration::from_millis(millis),
                executor.execute(sql, parameters, hydration),
            )
            .await
            .map_err(|_| ExecutionError::Timeout { millis })?,
            None => executor.execute(sql, parameters, hydration).await,
        }
    }
}

/// Fetch one page of `query`, choosing single- or two-phase execution by
/// `fetch_join_collection`.
pub async fn paginate<E>(
    query: &SelectQuery,
    metadata: &dyn MetadataLookup,
    pagination: &PaginationParams,
    fetch_join_collection: bool,
    executor: &E,
    config: PaginatorConfig,
) -> Result<PaginatedRows, PaginationError>
where
    E: QueryExecutor + ?Sized,
{
    Paginator::new(query, metadata)
        .with_fetch_join_collection(fetch_join_collection)
        .with_config(config)
        .fetch(executor, pagination)
        .await
}

/// Count the results `query` pages over, two-phase when it joins a collection.
pub async fn count<E>(
    query: &SelectQuery,
    metadata: &dyn MetadataLookup,
    executor: &E,
) -> Result<u64, PaginationError>
where
    E: QueryExecutor + ?Sized,
{
    Paginator::new(query, metadata).count(executor).await
}
