//! Utility functions and data structures.
//!
//! ## Modules
//!
//! - [`app_data`] - Application data directory and configuration file

pub mod app_data;

pub use app_data::*;
