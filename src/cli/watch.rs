use std::sync::Arc;

use tabled::Tabled;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::cli::output::{print_json_line, print_table};
use crate::config::{OutputMode, RuntimeConfig};
use crate::error::AppError;
use crate::resolve;
use crate::widget::{SurfaceSnapshot, WidgetBuilder};

#[derive(Tabled)]
struct SnapshotRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Lights")]
    lights: &'static str,
    #[tabled(rename = "Sync")]
    sync: String,
}

impl From<&SurfaceSnapshot> for SnapshotRow {
    fn from(snap: &SurfaceSnapshot) -> Self {
        Self {
            time: snap.at.format("%H:%M:%S").to_string(),
            mode: snap.label.clone(),
            lights: if snap.lights_on { "on" } else { "off" },
            sync: format!("{:?}", snap.sync).to_lowercase(),
        }
    }
}

fn render(snap: &SurfaceSnapshot, mode: OutputMode) {
    match mode {
        OutputMode::Json => print_json_line(snap),
        OutputMode::Table => print_table(&[SnapshotRow::from(snap)]),
    }
}

pub async fn handle(config: &RuntimeConfig) -> Result<(), AppError> {
    if config.poll.interval.is_zero() {
        return Err(AppError::InvalidInput(
            "Poll interval must be greater than zero".into(),
        ));
    }

    let api = resolve::build_api(config)?;
    let settings = resolve::resolve_settings(config, &api);
    let widget = WidgetBuilder::new(api)
        .settings(settings)
        .poll(config.poll)
        .bind()
        .await?;

    let sync = Arc::clone(widget.synchronizer());
    let mut updates = widget.subscribe();
    let mut last = updates.borrow_and_update().clone();
    render(&last, config.output_mode);

    let mut outcome = Ok(());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                last = updates.borrow_and_update().clone();
                render(&last, config.output_mode);
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) if line.trim().eq_ignore_ascii_case("q") => break,
                Ok(Some(_)) => {
                    if let Err(err) = widget.click() {
                        outcome = Err(err);
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!(error = %err, "stdin closed");
                    break;
                }
            },
        }
    }

    widget.shutdown().await;

    // Changes made while shutting down (answered clicks) are shown once more.
    let last_state = sync.snapshot();
    if !last_state.same_state(&last) {
        render(&last_state, config.output_mode);
    }
    outcome
}
