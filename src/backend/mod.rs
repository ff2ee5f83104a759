//! Supervision of the external search engine
//!
//! Architecture:
//! - [`ProcessSupervisor`]: launches the engine as a named instance and asks
//!   it to exit on shutdown
//! - [`ConnectionEstablisher`]: after a warm-up delay, retries connecting a
//!   client to that instance a bounded number of times on a background thread
//! - [`ConnectionHandle`]: the observable result, read by queries

mod connection;
mod process;

pub use connection::{ConnectionEstablisher, ConnectionHandle, ConnectionState, RetryPolicy};
pub use process::ProcessSupervisor;
