//! Environment checks run once before the core initializes

use crate::utils::app_data::EngineConfig;
use std::path::{Path, PathBuf};
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
    #[error("Vortex only supports running on Windows")]
    UnsupportedSystem,
    #[error("file indexing service not found at {}; try reinstalling Vortex", .0.display())]
    EngineExecutableMissing(PathBuf),
}

/// Verify the host can run the engine
pub fn check_environment(config: &EngineConfig) -> Result<(), EnvironmentError> {
    check_system()?;
    check_engine_executable(&config.executable_path())
}

pub fn check_system() -> Result<(), EnvironmentError> {
    if cfg!(target_os = "windows") {
        Ok(())
    } else {
        error!(os = std::env::consts::OS, "unsupported system");
        Err(EnvironmentError::UnsupportedSystem)
    }
}

pub fn check_engine_executable(path: &Path) -> Result<(), EnvironmentError> {
    if path.is_file() {
        Ok(())
    } else {
        error!(path = %path.display(), "engine executable not found");
        Err(EnvironmentError::EngineExecutableMissing(path.to_path_buf()))
    }
}
