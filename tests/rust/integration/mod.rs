//! Integration tests - generated SQL executed against a real database
//!
//! An in-memory SQLite database stands in for the target dialect: it supports
//! `ROW_NUMBER() OVER`, `(SELECT 0)`, derived tables and `:name` parameters,
//! which is everything the rewritten SQL relies on.

mod sqlite_backend;
