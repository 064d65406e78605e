//! Integration test crate for the Meridian workspace.
//!
//! This crate has no library code. The tests under `tests/` drive the
//! keepers end to end through [`meridian_engine::App`], over both the
//! in-memory and the SQLite store.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p meridian-integration-tests
//! ```
