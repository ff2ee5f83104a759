//! Lifecycle of the external engine process

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use tracing::{debug, info};

/// Starts and stops the engine executable
///
/// The engine runs as a named instance so it does not collide with a
/// user's own copy of the same program.
#[derive(Debug)]
pub struct ProcessSupervisor {
    executable: PathBuf,
    instance_name: String,
    child: Option<Child>,
}

impl ProcessSupervisor {
    pub fn new(executable: impl Into<PathBuf>, instance_name: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            instance_name: instance_name.into(),
            child: None,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    /// Arguments that launch the named instance
    pub fn start_args(&self) -> [&str; 2] {
        ["-instance", &self.instance_name]
    }

    /// Arguments that ask the named instance to exit
    pub fn stop_args(&self) -> [&str; 3] {
        ["-exit", "-instance", &self.instance_name]
    }

    /// Launch the engine without waiting for it
    pub fn start(&mut self) -> Result<()> {
        let child = self.spawn(&self.start_args()).with_context(|| {
            format!("Failed to start engine {}", self.executable.display())
        })?;

        info!(pid = child.id(), instance = %self.instance_name, "engine process started");
        self.child = Some(child);
        Ok(())
    }

    /// Signal the engine to exit; termination is not awaited
    pub fn stop(&mut self) -> Result<()> {
        self.spawn(&self.stop_args()).with_context(|| {
            format!("Failed to signal engine {} to exit", self.executable.display())
        })?;

        if let Some(mut child) = self.child.take() {
            // Reap it if it already went away
            if let Ok(Some(status)) = child.try_wait() {
                debug!(%status, "engine process exited");
            }
        }

        info!(instance = %self.instance_name, "engine exit requested");
        Ok(())
    }

    fn spawn(&self, args: &[&str]) -> std::io::Result<Child> {
        Command::new(&self.executable)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
    }
}
