use serde_json::json;
use tabled::Tabled;
use tracing::warn;

use crate::cli::output::print_output;
use crate::config::RuntimeConfig;
use crate::error::AppError;
use crate::models::mode::Mode;
use crate::resolve;

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Plugin")]
    plugin: String,
    #[tabled(rename = "Lights")]
    lights: &'static str,
}

#[derive(Tabled)]
struct ModeRow {
    #[tabled(rename = "Index")]
    index: usize,
    #[tabled(rename = "Mode")]
    mode: &'static str,
    #[tabled(rename = "Behaviour")]
    description: &'static str,
}

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Setting")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

pub async fn handle_status(config: &RuntimeConfig) -> Result<(), AppError> {
    let api = resolve::build_api(config)?;
    let on = api.are_lights_on().await?;
    let rows = [StatusRow {
        plugin: api.plugin().to_string(),
        lights: on_off(on),
    }];
    print_output(&json!({"lights": on_off(on)}), &rows, config.output_mode);
    Ok(())
}

pub async fn handle_next(config: &RuntimeConfig) -> Result<(), AppError> {
    let api = resolve::build_api(config)?;
    let source = resolve::resolve_settings(config, &api);

    // The plugin does not report the mode it moved to, so predict it from settings.
    let previous = match source.load().await.and_then(|s| s.mode()) {
        Ok(mode) => Some(mode),
        Err(err) => {
            warn!(error = %err, "cannot read current mode; sending command anyway");
            None
        }
    };

    api.next_lighting_state().await?;

    let next = previous.map(|m| m.next());
    let rows: Vec<ModeRow> = next
        .into_iter()
        .map(|m| ModeRow {
            index: m.index(),
            mode: m.label(),
            description: m.description(),
        })
        .collect();
    print_output(
        &json!({"previous": previous, "mode": next}),
        &rows,
        config.output_mode,
    );
    Ok(())
}

pub fn handle_modes(config: &RuntimeConfig) -> Result<(), AppError> {
    let rows: Vec<ModeRow> = Mode::ALL
        .iter()
        .map(|m| ModeRow {
            index: m.index(),
            mode: m.label(),
            description: m.description(),
        })
        .collect();
    let value = json!(rows
        .iter()
        .map(|r| json!({"index": r.index, "mode": r.mode, "description": r.description}))
        .collect::<Vec<_>>());
    print_output(&value, &rows, config.output_mode);
    Ok(())
}

pub async fn handle_settings(config: &RuntimeConfig) -> Result<(), AppError> {
    let api = resolve::build_api(config)?;
    let source = resolve::resolve_settings(config, &api);
    let settings = source.load().await?;

    let mut value = serde_json::to_value(&settings)?;
    value["source"] = json!(source.describe());
    value["mode"] = json!(settings.mode().ok());

    let rows: Vec<SettingRow> = value
        .as_object()
        .map(|obj| {
            obj.iter()
                .map(|(k, v)| SettingRow {
                    key: k.clone(),
                    value: v.as_str().map_or_else(|| v.to_string(), str::to_string),
                })
                .collect()
        })
        .unwrap_or_default();
    print_output(&value, &rows, config.output_mode);
    Ok(())
}
