pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod resolve;
pub mod widget;

use std::time::Duration;

use cli::output::print_error;
use config::{OutputMode, PollConfig, RuntimeConfig, ServiceConfig};
use error::AppError;
use models::mode::Mode;

pub async fn run(cli_args: cli::Cli) -> i32 {
    logging::init(cli_args.verbose);

    let config = RuntimeConfig {
        output_mode: if cli_args.table {
            OutputMode::Table
        } else {
            OutputMode::Json
        },
        service: ServiceConfig {
            base_url: cli_args.url,
            plugin: cli_args.plugin,
            api_key: cli_args.api_key,
            timeout: Duration::from_secs(cli_args.timeout_secs),
        },
        poll: PollConfig::default(),
        settings_path: cli_args.settings,
        mode_override: cli_args.mode.and_then(|i| Mode::from_index(i.into())),
    };

    let result = dispatch(cli_args.command, &config).await;

    match result {
        Ok(()) => 0,
        Err(err) => {
            print_error(&err);
            err.exit_code()
        }
    }
}

async fn dispatch(command: cli::Commands, config: &RuntimeConfig) -> Result<(), AppError> {
    match command {
        cli::Commands::Status => cli::light::handle_status(config).await,
        cli::Commands::Next => cli::light::handle_next(config).await,
        cli::Commands::Modes => cli::light::handle_modes(config),
        cli::Commands::Settings => cli::light::handle_settings(config).await,
        cli::Commands::Watch {
            poll_interval_ms,
            max_backoff_ms,
        } => {
            let mut config = config.clone();
            config.poll = PollConfig {
                interval: Duration::from_millis(poll_interval_ms),
                max_backoff: Duration::from_millis(max_backoff_ms),
            };
            cli::watch::handle(&config).await
        }
    }
}
