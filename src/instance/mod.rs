//! Single running instance per machine
//!
//! A fixed loopback port acts as the lock: whoever binds it is the primary
//! instance. See [`SingleInstanceCoordinator`].

mod coordinator;
pub mod protocol;

pub use coordinator::{send_command, InstanceEvent, SingleInstanceCoordinator};
pub use protocol::{InstanceCommand, DEFAULT_PORT, FOCUS_COMMAND};
