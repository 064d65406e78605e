//! # meridian-engine
//!
//! Wires the Meridian keepers over one store.
//!
//! ## Modules
//!
//! - [`app`]: the [`App`] facade (transactions, end-of-block hook, queries)
//! - [`config`]: TOML configuration
//! - [`logging`]: tracing subscriber setup
//! - [`error`]: the engine-level error type

pub mod app;
pub mod config;
pub mod error;
pub mod logging;

pub use app::{App, BlockSummary};
pub use config::EngineConfig;
pub use error::{EngineError, Result};
