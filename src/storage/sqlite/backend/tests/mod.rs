//! Tests for SQLite Backend.

mod concurrency_tests;
mod version_tests;
