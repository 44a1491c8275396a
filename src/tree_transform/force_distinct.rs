use crate::query_tree::SelectQuery;

use super::{TransformResult, Transformed, TreeTransform};

/// Turns the projection's DISTINCT flag on, so the rewriter partitions by the
/// root identity. Used for the identifier pass of two-phase pagination.
pub struct ForceDistinct;

impl TreeTransform for ForceDistinct {
    fn transform(&self, query: &SelectQuery) -> TransformResult<Transformed<SelectQuery>> {
        if query.projection.distinct {
            return Ok(Transformed::No(query.clone()));
        }
        let mut query = query.clone();
        query.projection.distinct = true;
        Ok(Transformed::Yes(query))
    }
}
