use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::api::client::PluginApi;
use crate::error::AppError;
use crate::models::mode::Mode;

/// Persisted plugin settings. Missing fields take the plugin's defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginSettings {
    pub lighting_mode: usize,
    pub mode_when_printing: usize,
    pub door_open_detection_pin: u32,
    pub door_open_detection_state: bool,
    pub lighting_relay_switch_pin: u32,
    pub lighting_relay_switch_on_state: bool,
    /// Milliseconds the lights stay on in `Auto` after the door closes.
    pub auto_light_hold_time: u64,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            lighting_mode: Mode::On.index(),
            mode_when_printing: Mode::On.index(),
            door_open_detection_pin: 0,
            door_open_detection_state: true,
            lighting_relay_switch_pin: 0,
            lighting_relay_switch_on_state: false,
            auto_light_hold_time: 5000,
        }
    }
}

impl PluginSettings {
    pub fn with_mode(mode: Mode) -> Self {
        Self {
            lighting_mode: mode.index(),
            ..Self::default()
        }
    }

    pub fn mode(&self) -> Result<Mode, AppError> {
        Mode::from_index(self.lighting_mode).ok_or(AppError::InvalidMode(self.lighting_mode))
    }

    /// Accepts either the host's full settings document (`{"plugins": {<plugin>: {...}}}`)
    /// or the bare plugin object.
    pub fn from_document(document: &serde_json::Value, plugin: &str) -> Result<Self, AppError> {
        let section = match document.get("plugins") {
            Some(plugins) => plugins.get(plugin).ok_or_else(|| {
                AppError::Settings(format!("No settings for plugin '{}'", plugin))
            })?,
            None => document,
        };
        serde_json::from_value(section.clone()).map_err(|e| AppError::Settings(e.to_string()))
    }
}

/// Read-only view onto the persisted settings. Each `load` reads the current value.
#[derive(Debug, Clone)]
pub enum SettingsSource {
    Fixed(PluginSettings),
    File { path: PathBuf, plugin: String },
    Remote(PluginApi),
}

impl SettingsSource {
    pub async fn load(&self) -> Result<PluginSettings, AppError> {
        match self {
            SettingsSource::Fixed(settings) => Ok(settings.clone()),
            SettingsSource::File { path, plugin } => {
                let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
                    AppError::Settings(format!("Cannot read {}: {}", path.display(), e))
                })?;
                let document: serde_json::Value = serde_json::from_str(&raw)
                    .map_err(|e| AppError::Settings(format!("{}: {}", path.display(), e)))?;
                PluginSettings::from_document(&document, plugin)
            }
            SettingsSource::Remote(api) => {
                let response = api.fetch_settings().await?;
                let section = response.plugin(api.plugin()).ok_or_else(|| {
                    AppError::Settings(format!("No settings for plugin '{}'", api.plugin()))
                })?;
                serde_json::from_value(section.clone())
                    .map_err(|e| AppError::Settings(e.to_string()))
            }
        }
    }

    /// Whether a later `load` can observe changes made by the plugin.
    pub fn is_live(&self) -> bool {
        !matches!(self, SettingsSource::Fixed(_))
    }

    pub fn describe(&self) -> String {
        match self {
            SettingsSource::Fixed(_) => "fixed".into(),
            SettingsSource::File { path, .. } => path.display().to_string(),
            SettingsSource::Remote(_) => "remote".into(),
        }
    }
}
