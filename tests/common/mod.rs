#![allow(dead_code)]

use std::time::Duration;

use chamberctl::api::client::PluginApi;
use chamberctl::config::ServiceConfig;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

pub const PLUGIN_PATH: &str = "/api/plugin/chamber_lighting";

pub fn service_config(server: &MockServer) -> ServiceConfig {
    ServiceConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(30),
        ..ServiceConfig::default()
    }
}

pub fn api_for(server: &MockServer) -> PluginApi {
    PluginApi::new(&service_config(server)).unwrap()
}

pub fn status_command() -> MockBuilder {
    Mock::given(method("POST"))
        .and(path(PLUGIN_PATH))
        .and(header("content-type", "application/json; charset=UTF-8"))
        .and(body_json(json!({"command": "are_lights_turn_on"})))
}

pub fn next_command() -> MockBuilder {
    Mock::given(method("POST"))
        .and(path(PLUGIN_PATH))
        .and(header("content-type", "application/json; charset=UTF-8"))
        .and(body_json(json!({"command": "next_lighitng_state"})))
}

pub fn lights(on: bool) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"state": on}))
}

/// Requests received so far carrying the given command.
pub async fn count_commands(server: &MockServer, command: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| {
            serde_json::from_slice::<serde_json::Value>(&r.body)
                .map(|b| b["command"] == command)
                .unwrap_or(false)
        })
        .count()
}

/// Wait until at least `n` requests with `command` arrived, or give up after two seconds.
pub async fn wait_for_commands(server: &MockServer, command: &str, n: usize) -> usize {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let count = count_commands(server, command).await;
        if count >= n || tokio::time::Instant::now() >= deadline {
            return count;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
