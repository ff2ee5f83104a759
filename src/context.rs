//! Application root owning every integration component
//!
//! Components receive what they need from here instead of reaching for
//! process-wide state.

use crate::backend::{
    ConnectionEstablisher, ConnectionHandle, ConnectionState, ProcessSupervisor, RetryPolicy,
};
use crate::engine::EngineApi;
use crate::instance::SingleInstanceCoordinator;
use crate::query::{QueryBuilder, SearchExecutor};
use crate::utils::app_data::AppConfig;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{error, info, warn};

pub struct AppContext {
    config: AppConfig,
    api: Arc<dyn EngineApi>,
    supervisor: ProcessSupervisor,
    connection: ConnectionHandle,
    executor: SearchExecutor,
    connector: Option<JoinHandle<ConnectionState>>,
    instance: Option<SingleInstanceCoordinator>,
    engine_started: bool,
    shut_down: bool,
}

impl AppContext {
    pub fn new(config: AppConfig, api: Arc<dyn EngineApi>) -> Self {
        let supervisor = ProcessSupervisor::new(
            config.engine.executable_path(),
            config.engine.instance_name.clone(),
        );
        let executor = SearchExecutor::new(config.engine.viewport_count);

        Self {
            config,
            api,
            supervisor,
            connection: ConnectionHandle::new(),
            executor,
            connector: None,
            instance: None,
            engine_started: false,
            shut_down: false,
        }
    }

    /// Keep the single-instance lock until shutdown
    pub fn hold_instance_lock(&mut self, coordinator: SingleInstanceCoordinator) {
        self.instance = Some(coordinator);
    }

    /// Launch the engine process and begin connecting in the background
    pub fn start_engine(&mut self) -> Result<()> {
        self.supervisor.start()?;
        self.engine_started = true;
        self.connect_in_background()
    }

    /// Begin connecting to an engine that is already running
    pub fn connect_in_background(&mut self) -> Result<()> {
        if self.connector.is_some() {
            return Ok(());
        }

        let establisher = ConnectionEstablisher::new(
            Arc::clone(&self.api),
            self.config.engine.instance_name.clone(),
            RetryPolicy::from(&self.config.engine),
            self.connection.clone(),
        );
        let thread = establisher
            .spawn()
            .context("Failed to start engine connection thread")?;
        self.connector = Some(thread);
        Ok(())
    }

    pub fn connection(&self) -> &ConnectionHandle {
        &self.connection
    }

    /// Start building a search against the current connection
    pub fn query_builder(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(&self.executor, &self.connection)
    }

    /// Release everything in order; each step runs even if an earlier one failed
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        info!("vortex is shutting down");

        self.connection.cancel();
        if let Some(thread) = self.connector.take() {
            run_safely("stop engine connection thread", || {
                thread
                    .join()
                    .map(|state| info!(?state, "connection thread finished"))
                    .map_err(|_| anyhow::anyhow!("connection thread panicked"))
            });
        }

        if let Some(client) = self.connection.take_client() {
            let others = Arc::strong_count(&client) - 1;
            if others > 0 {
                warn!(others, "client still in use; it is destroyed when released");
            }
            drop(client);
            info!("engine client released");
        }

        if let Some(mut instance) = self.instance.take() {
            instance.stop();
            info!("single-instance port released");
        }

        if self.engine_started {
            let supervisor = &mut self.supervisor;
            run_safely("stop engine", || supervisor.stop());
        }

        info!("vortex stopped");
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_safely(action: &str, step: impl FnOnce() -> Result<()>) {
    match step() {
        Ok(()) => info!("{} succeeded", action),
        Err(e) => error!("{} failed: {:#}", action, e),
    }
}
