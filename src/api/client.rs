use serde::de::DeserializeOwned;
use tracing::debug;

use super::command::{CommandBody, PluginCommand};
use super::response::{LightStatusResponse, SettingsResponse};
use crate::config::ServiceConfig;
use crate::error::AppError;

const CONTENT_TYPE_JSON: &str = "application/json; charset=UTF-8";
const PATH_PLUGIN_API: &str = "/api/plugin/";
const PATH_SETTINGS: &str = "/api/settings";

/// Client for the chamber lighting plugin's simple API.
#[derive(Debug, Clone)]
pub struct PluginApi {
    client: reqwest::Client,
    base_url: String,
    plugin: String,
    api_key: Option<String>,
}

fn build_http_client(config: &ServiceConfig) -> Result<reqwest::Client, AppError> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!("chamberctl/", env!("CARGO_PKG_VERSION")))
        .timeout(config.timeout)
        .build()?)
}

impl PluginApi {
    pub fn new(config: &ServiceConfig) -> Result<Self, AppError> {
        if config.plugin.is_empty() {
            return Err(AppError::InvalidInput("Plugin name is required".into()));
        }
        Ok(Self {
            client: build_http_client(config)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            plugin: config.plugin.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}{}", self.base_url, PATH_PLUGIN_API, self.plugin)
    }

    fn with_api_key(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("X-Api-Key", key),
            None => request,
        }
    }

    /// POST a command to the plugin endpoint. Non-success statuses become `AppError::Api`.
    async fn post_command(&self, command: PluginCommand) -> Result<reqwest::Response, AppError> {
        let url = self.endpoint();
        let body_json = serde_json::to_string(&CommandBody::from(command))?;

        debug!(%url, body = %body_json, "POST");

        let request = self
            .client
            .post(&url)
            .header("Content-Type", CONTENT_TYPE_JSON)
            .body(body_json);
        let response = self.with_api_key(request).send().await?;

        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(AppError::Api {
                message: format!("{}: {}", status, body),
                status: Some(status.as_u16()),
            })
        }
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AppError> {
        let text = response.text().await?;
        debug!(body = %text, "response");
        serde_json::from_str(&text).map_err(|e| AppError::MalformedResponse(format!("{e}: {text}")))
    }

    /// Ask the plugin whether the chamber lights are currently on.
    pub async fn are_lights_on(&self) -> Result<bool, AppError> {
        let response = self.post_command(PluginCommand::AreLightsOn).await?;
        let status: LightStatusResponse = Self::read_json(response).await?;
        Ok(status.state)
    }

    /// Ask the plugin to move to the next lighting mode. The reply body is ignored;
    /// a success status is the acknowledgment.
    pub async fn next_lighting_state(&self) -> Result<(), AppError> {
        self.post_command(PluginCommand::NextLightingState).await?;
        Ok(())
    }

    /// Fetch the host's settings document.
    pub async fn fetch_settings(&self) -> Result<SettingsResponse, AppError> {
        let url = format!("{}{}", self.base_url, PATH_SETTINGS);
        debug!(%url, "GET");

        let response = self.with_api_key(self.client.get(&url)).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Api {
                message: format!("{}: {}", status, body),
                status: Some(status.as_u16()),
            });
        }
        Self::read_json(response).await
    }
}
