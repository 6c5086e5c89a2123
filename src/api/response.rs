use serde::Deserialize;

/// Reply to `are_lights_turn_on`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LightStatusResponse {
    pub state: bool,
}

/// The part of `GET /api/settings` this client cares about.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsResponse {
    #[serde(default)]
    pub plugins: serde_json::Map<String, serde_json::Value>,
}

impl SettingsResponse {
    pub fn plugin(&self, name: &str) -> Option<&serde_json::Value> {
        self.plugins.get(name)
    }
}
