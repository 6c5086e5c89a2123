use crate::api::client::PluginApi;
use crate::config::{default_settings_path, RuntimeConfig};
use crate::error::AppError;
use crate::models::settings::{PluginSettings, SettingsSource};

pub fn build_api(config: &RuntimeConfig) -> Result<PluginApi, AppError> {
    PluginApi::new(&config.service)
}

/// Pick the settings source: an explicit mode wins, then an explicit or default
/// settings file, then the host's settings endpoint.
pub fn resolve_settings(config: &RuntimeConfig, api: &PluginApi) -> SettingsSource {
    if let Some(mode) = config.mode_override {
        return SettingsSource::Fixed(PluginSettings::with_mode(mode));
    }
    match config.settings_path.clone().or_else(default_settings_path) {
        Some(path) => SettingsSource::File {
            path,
            plugin: config.service.plugin.clone(),
        },
        None => SettingsSource::Remote(api.clone()),
    }
}
