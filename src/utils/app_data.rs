use crate::instance::DEFAULT_PORT;
use crate::query::executor::DEFAULT_VIEWPORT_COUNT;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "vortex";
const CONFIG_FILE: &str = "config.json";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub single_instance: InstanceConfig,
}

/// Settings for the external search engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine executable; relative paths resolve against the working directory
    #[serde(default = "default_executable")]
    pub executable: PathBuf,

    /// SDK library providing the IPC client
    #[serde(default = "default_sdk_library")]
    pub sdk_library: PathBuf,

    /// Name of the private engine instance
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// Delay between starting the engine and the first connection attempt
    #[serde(default = "default_warmup_ms")]
    pub warmup_ms: u64,

    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,

    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// Maximum rows returned per query
    #[serde(default = "default_viewport_count")]
    pub viewport_count: usize,
}

/// Settings for the single-instance lock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_executable() -> PathBuf {
    PathBuf::from("everything").join("Everything64.exe")
}

fn default_sdk_library() -> PathBuf {
    PathBuf::from("Everything3_x64.dll")
}

fn default_instance_name() -> String {
    "vortex_backend".to_string()
}

fn default_warmup_ms() -> u64 {
    1000
}

fn default_connect_attempts() -> u32 {
    20
}

fn default_retry_interval_ms() -> u64 {
    400
}

fn default_viewport_count() -> usize {
    DEFAULT_VIEWPORT_COUNT
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            sdk_library: default_sdk_library(),
            instance_name: default_instance_name(),
            warmup_ms: default_warmup_ms(),
            connect_attempts: default_connect_attempts(),
            retry_interval_ms: default_retry_interval_ms(),
            viewport_count: default_viewport_count(),
        }
    }
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl EngineConfig {
    /// Absolute path of the engine executable
    pub fn executable_path(&self) -> PathBuf {
        absolutize(&self.executable)
    }

    /// Absolute path of the SDK library
    pub fn sdk_library_path(&self) -> PathBuf {
        absolutize(&self.sdk_library)
    }
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    /// Load config from a specific file, or return default if it does not exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", config_path.display()))?;
        Ok(config)
    }

    /// Save config to the app data directory
    pub fn save(&self) -> Result<()> {
        self.save_to(&get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file {}", config_path.display()))?;
        Ok(())
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(CONFIG_FILE))
}

/// Get the per-user application data directory
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}
