//! # Vortex core - search engine integration for the quick-launch panel
//!
//! Vortex delegates file search to an external engine process (Everything
//! 1.5). This crate is the integration layer between the panel and that
//! engine: it supervises the process, connects to it over the engine's
//! native IPC client, translates searches into the engine's grammar, and
//! keeps the application to a single running instance.
//!
//! ## Architecture
//!
//! - [`engine`] - Native engine boundary (call table, opaque handles, guards)
//! - [`query`] - Query building, translation, and execution
//! - [`backend`] - Engine process supervision and background connection
//! - [`instance`] - Single-instance lock over a loopback port
//! - [`context`] - Application root owning the components above
//! - [`bootstrap`] - Environment checks before startup
//! - [`output`] - Result formatting for the command line
//! - [`utils`] - Configuration and app data directory
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use vortex_core::context::AppContext;
//! use vortex_core::engine::Everything3;
//! use vortex_core::query::SearchMode;
//! use vortex_core::utils::AppConfig;
//!
//! let config = AppConfig::load()?;
//! let api = Arc::new(Everything3::load(&config.engine.sdk_library_path())?);
//! let mut ctx = AppContext::new(config, api);
//! ctx.start_engine()?;
//! ctx.connection().wait(Duration::from_secs(10));
//!
//! let files = ctx
//!     .query_builder()
//!     .search_for("report.docx")
//!     .mode(SearchMode::FilesOnly)
//!     .query();
//!
//! for file in files {
//!     println!("{}", file.full_path);
//! }
//! ```
//!
//! Queries never fail loudly: an unconnected or still-loading engine yields
//! an empty result and a log entry. Use
//! [`query::SearchExecutor::try_execute`] to tell the cases apart.

pub mod backend;
pub mod bootstrap;
pub mod context;
pub mod engine;
pub mod instance;
pub mod output;
pub mod query;
pub mod utils;
