use serde::{Deserialize, Serialize};

use super::errors::RewriteError;

/// Offset / limit requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationParams {
    /// Rows to skip; absent means 0
    pub offset: Option<u64>,
    /// Maximum rows; absent means unbounded
    pub limit: Option<u64>,
}

impl PaginationParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Inclusive `rownumber` range selected by the outer windowing query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowNumberWindow {
    pub start: u64,
    pub end: u64,
}

impl RowNumberWindow {
    /// `None` when no window applies. A positive offset without a limit has no
    /// BETWEEN form and is rejected, as is a zero limit.
    pub fn from_params(params: &PaginationParams) -> Result<Option<Self>, RewriteError> {
        let offset = params.offset.unwrap_or(0);
        let Some(limit) = params.limit else {
            if offset > 0 {
                return Err(RewriteError::unsupported(format!(
                    "offset {} without a limit cannot be expressed as a row-number window",
                    offset
                )));
            }
            return Ok(None);
        };

        if limit == 0 {
            return Err(RewriteError::unsupported("limit must be at least 1"));
        }

        // Row numbers start at 1
        let start = offset
            .checked_add(1)
            .ok_or_else(|| RewriteError::unsupported("offset is out of range"))?;
        let end = start
            .checked_add(limit - 1)
            .ok_or_else(|| RewriteError::unsupported("offset + limit is out of range"))?;
        Ok(Some(Self { start, end }))
    }

    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn to_sql(&self) -> String {
        format!("rownumber BETWEEN {} AND {}", self.start, self.end)
    }
}
