use std::path::PathBuf;
use std::time::Duration;

use crate::models::mode::Mode;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_PLUGIN: &str = "chamber_lighting";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Json,
    Table,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub output_mode: OutputMode,
    pub service: ServiceConfig,
    pub poll: PollConfig,
    pub settings_path: Option<PathBuf>,
    /// Seed mode given on the command line; takes precedence over any settings source.
    pub mode_override: Option<Mode>,
}

/// Where the plugin API lives and how to reach it.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub base_url: String,
    pub plugin: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            plugin: DEFAULT_PLUGIN.to_string(),
            api_key: None,
            timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_backoff: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl PollConfig {
    /// Delay before the next poll. Zero failures means the plain interval,
    /// each further failure doubles it up to `max_backoff`.
    pub fn delay_after(&self, consecutive_failures: u32) -> Duration {
        let factor = 1u32.checked_shl(consecutive_failures.min(16)).unwrap_or(u32::MAX);
        self.interval
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff.max(self.interval))
    }
}

/// Default location of a local settings file, if one exists.
pub fn default_settings_path() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("chamberctl").join("settings.json");
    path.exists().then_some(path)
}
