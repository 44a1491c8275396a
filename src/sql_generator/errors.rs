use thiserror::Error;

use crate::metadata::MetadataError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RewriteError {
    #[error("Unsupported query shape: {0}")]
    UnsupportedQueryShape(String),

    #[error(
        "ORDER BY expression `{expression}` does not match any projected column (only projected columns are visible to the row-number window)"
    )]
    AliasResolutionFailure { expression: String },

    #[error(transparent)]
    MetadataResolution(#[from] MetadataError),
}

impl RewriteError {
    pub fn unsupported(message: impl Into<String>) -> Self {
        RewriteError::UnsupportedQueryShape(message.into())
    }
}
