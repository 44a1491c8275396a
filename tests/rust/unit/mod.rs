//! Unit tests - SQL generation and file loading without a database
//!
//! These tests exercise the public rewriting API on in-memory catalogs and
//! query trees.

mod file_loading_tests;
mod rewrite_scenario_tests;
