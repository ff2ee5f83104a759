//! Background connection to the engine with bounded retry
//!
//! State machine:
//! `Disconnected -> Connecting -> Connected | GaveUp | Cancelled`
//!
//! All terminal states are final for the application run; a lost
//! connection is not re-established.

use crate::engine::{EngineApi, EngineClient};
use crate::utils::app_data::EngineConfig;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{info, warn};

/// Connection progress as seen by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No attempt started yet
    Disconnected,
    /// Establisher running
    Connecting,
    Connected,
    /// All attempts failed
    GaveUp,
    /// Stopped by [`ConnectionHandle::cancel`]
    Cancelled,
}

impl ConnectionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ConnectionState::Connected | ConnectionState::GaveUp | ConnectionState::Cancelled
        )
    }
}

struct Slot {
    state: ConnectionState,
    client: Option<Arc<EngineClient>>,
    cancelled: bool,
}

struct Shared {
    slot: Mutex<Slot>,
    changed: Condvar,
}

/// Observable, shareable view of the engine connection
///
/// Cloning is cheap; all clones observe the same connection.
#[derive(Clone)]
pub struct ConnectionHandle {
    shared: Arc<Shared>,
}

impl Default for ConnectionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionHandle {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot {
                    state: ConnectionState::Disconnected,
                    client: None,
                    cancelled: false,
                }),
                changed: Condvar::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.shared
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> ConnectionState {
        self.lock().state
    }

    /// The connected client, if any
    pub fn client(&self) -> Option<Arc<EngineClient>> {
        self.lock().client.clone()
    }

    /// Block until the connection reaches a terminal state or `timeout` passes
    pub fn wait(&self, timeout: Duration) -> ConnectionState {
        let guard = self.lock();
        let (guard, _) = self
            .shared
            .changed
            .wait_timeout_while(guard, timeout, |slot| !slot.state.is_terminal())
            .unwrap_or_else(PoisonError::into_inner);
        guard.state
    }

    /// Stop a running establisher; it will not connect after this returns
    pub fn cancel(&self) {
        let mut slot = self.lock();
        slot.cancelled = true;
        if !slot.state.is_terminal() {
            slot.state = ConnectionState::Cancelled;
        }
        self.shared.changed.notify_all();
    }

    /// Remove the client so it is destroyed once the last query releases it
    pub fn take_client(&self) -> Option<Arc<EngineClient>> {
        self.lock().client.take()
    }

    fn begin(&self) -> bool {
        let mut slot = self.lock();
        if slot.cancelled || slot.state != ConnectionState::Disconnected {
            return false;
        }
        slot.state = ConnectionState::Connecting;
        self.shared.changed.notify_all();
        true
    }

    /// Store the client; returns false (dropping it) if cancelled meanwhile
    fn publish(&self, client: EngineClient) -> bool {
        let mut slot = self.lock();
        if slot.cancelled {
            return false;
        }
        slot.client = Some(Arc::new(client));
        slot.state = ConnectionState::Connected;
        self.shared.changed.notify_all();
        true
    }

    fn give_up(&self) {
        let mut slot = self.lock();
        if !slot.state.is_terminal() {
            slot.state = ConnectionState::GaveUp;
        }
        self.shared.changed.notify_all();
    }

    /// Sleep for `duration`, waking early on cancel
    /// Returns false if cancelled
    fn pause(&self, duration: Duration) -> bool {
        let guard = self.lock();
        let (guard, _) = self
            .shared
            .changed
            .wait_timeout_while(guard, duration, |slot| !slot.cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        !guard.cancelled
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("state", &self.state())
            .finish()
    }
}

/// Timing of connection attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay after the engine process starts, before the first attempt
    pub warmup: Duration,
    pub attempts: u32,
    /// Delay between failed attempts
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            warmup: Duration::from_secs(1),
            attempts: 20,
            interval: Duration::from_millis(400),
        }
    }
}

impl From<&EngineConfig> for RetryPolicy {
    fn from(config: &EngineConfig) -> Self {
        Self {
            warmup: Duration::from_millis(config.warmup_ms),
            attempts: config.connect_attempts,
            interval: Duration::from_millis(config.retry_interval_ms),
        }
    }
}

/// Connects a client to the engine instance on a background thread
pub struct ConnectionEstablisher {
    api: Arc<dyn EngineApi>,
    instance_name: String,
    policy: RetryPolicy,
    handle: ConnectionHandle,
}

impl ConnectionEstablisher {
    pub fn new(
        api: Arc<dyn EngineApi>,
        instance_name: impl Into<String>,
        policy: RetryPolicy,
        handle: ConnectionHandle,
    ) -> Self {
        Self {
            api,
            instance_name: instance_name.into(),
            policy,
            handle,
        }
    }

    /// Run the attempts on a dedicated thread
    pub fn spawn(self) -> std::io::Result<JoinHandle<ConnectionState>> {
        thread::Builder::new()
            .name("vortex-engine-connect".to_string())
            .spawn(move || self.run())
    }

    /// Run the attempts on the current thread
    pub fn run(&self) -> ConnectionState {
        if !self.handle.begin() {
            return self.handle.state();
        }

        if !self.handle.pause(self.policy.warmup) {
            info!("engine connection cancelled before the first attempt");
            return self.handle.state();
        }

        for attempt in 1..=self.policy.attempts {
            if let Some(client) = EngineClient::connect(Arc::clone(&self.api), &self.instance_name) {
                if self.handle.publish(client) {
                    info!(attempt, instance = %self.instance_name, "connected to engine");
                } else {
                    info!("engine connection cancelled; discarding client");
                }
                return self.handle.state();
            }

            if attempt < self.policy.attempts && !self.handle.pause(self.policy.interval) {
                info!(attempt, "engine connection cancelled");
                return self.handle.state();
            }
        }

        warn!(
            attempts = self.policy.attempts,
            instance = %self.instance_name,
            "could not connect to engine; search stays unavailable for this run"
        );
        self.handle.give_up();
        self.handle.state()
    }
}
