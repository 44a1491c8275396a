//! Query-tree passes run before SQL generation
//!
//! Each pass takes the tree by reference and hands back a modified clone, never
//! touching the caller's tree. The paginator chains them to derive its
//! sub-queries from one original query.
//!
//! # Implementing a pass
//!
//! ```ignore
//! impl TreeTransform for MyPass {
//!     fn transform(&self, query: &SelectQuery) -> TransformResult<Transformed<SelectQuery>> {
//!         let mut query = query.clone();
//!         // change the clone here
//!         Ok(Transformed::Yes(query))
//!     }
//! }
//! ```

use crate::query_tree::SelectQuery;
use crate::sql_generator::RewriteError;

pub mod force_distinct;
pub mod identifier_filter;
pub mod identifier_projection;

pub use force_distinct::ForceDistinct;
pub use identifier_filter::{check_reserved_parameters, identifier_parameter, IdentifierFilter};
pub use identifier_projection::{root_identifier_alias, IdentifierProjection};

pub type TransformResult<T> = Result<T, RewriteError>;

#[derive(Debug, Clone, PartialEq)]
pub enum Transformed<T> {
    Yes(T),
    No(T),
}

impl<T> Transformed<T> {
    pub fn is_yes(&self) -> bool {
        matches!(self, Transformed::Yes(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Transformed::Yes(t) | Transformed::No(t) => t,
        }
    }
}

pub trait TreeTransform {
    fn transform(&self, query: &SelectQuery) -> TransformResult<Transformed<SelectQuery>>;
}

/// Run `passes` in order, feeding each the previous pass's output.
pub fn apply_all(
    query: &SelectQuery,
    passes: &[&dyn TreeTransform],
) -> TransformResult<SelectQuery> {
    let mut current = query.clone();
    for (i, pass) in passes.iter().enumerate() {
        let transformed = pass.transform(&current)?;
        if !transformed.is_yes() {
            log::trace!("Tree pass {} left the query unchanged", i);
        }
        current = transformed.into_inner();
    }
    Ok(current)
}
