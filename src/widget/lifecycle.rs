use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::poller::{PollHandle, Poller};
use super::surface::SurfaceSnapshot;
use super::synchronizer::StateSynchronizer;
use crate::api::client::PluginApi;
use crate::config::PollConfig;
use crate::error::AppError;
use crate::models::settings::SettingsSource;

/// Collects the widget's dependencies; [`bind`](Self::bind) runs the one-time setup.
pub struct WidgetBuilder {
    api: PluginApi,
    settings: Option<SettingsSource>,
    poll: PollConfig,
}

impl WidgetBuilder {
    pub fn new(api: PluginApi) -> Self {
        Self {
            api,
            settings: None,
            poll: PollConfig::default(),
        }
    }

    pub fn settings(mut self, settings: SettingsSource) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Seed the mode from settings, reveal the widget, start polling and
    /// attach the click handler, in that order. Nothing is started if the
    /// settings are missing or hold an invalid mode.
    pub async fn bind(self) -> Result<Widget, AppError> {
        let settings = self.settings.ok_or(AppError::MissingSettings)?;
        let persisted = settings.load().await?;
        let mode = persisted.mode()?;
        info!(mode = %mode, source = %settings.describe(), "binding widget");

        let sync = Arc::new(StateSynchronizer::new(self.api, settings));
        sync.write_displayed_mode(mode);
        sync.reveal();

        let token = CancellationToken::new();
        let poll = Poller::new(Arc::clone(&sync), self.poll).spawn(token.child_token());

        let (clicks, rx) = mpsc::unbounded_channel();
        let click_task = tokio::spawn(handle_clicks(Arc::clone(&sync), rx, token.child_token()));

        Ok(Widget {
            sync,
            clicks,
            poll,
            click_task,
            token,
        })
    }
}

async fn handle_clicks(
    sync: Arc<StateSynchronizer>,
    mut rx: mpsc::UnboundedReceiver<()>,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            click = rx.recv() => match click {
                Some(()) => {
                    sync.advance_mode_detached();
                }
                None => break,
            },
        }
    }
    // Clicks accepted before the stop still count.
    rx.close();
    while let Ok(()) = rx.try_recv() {
        sync.advance_mode_detached();
    }
    debug!("click handler detached");
}

/// A bound widget. Polling and click handling run until [`shutdown`](Self::shutdown).
pub struct Widget {
    sync: Arc<StateSynchronizer>,
    clicks: mpsc::UnboundedSender<()>,
    poll: PollHandle,
    click_task: JoinHandle<()>,
    token: CancellationToken,
}

impl Widget {
    pub fn synchronizer(&self) -> &Arc<StateSynchronizer> {
        &self.sync
    }

    pub fn subscribe(&self) -> watch::Receiver<SurfaceSnapshot> {
        self.sync.subscribe()
    }

    /// Activate the root element.
    pub fn click(&self) -> Result<(), AppError> {
        if self.token.is_cancelled() {
            return Err(AppError::AlreadyStopped);
        }
        self.clicks.send(()).map_err(|_| AppError::AlreadyStopped)
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Stop polling and click handling without waiting for the tasks to exit.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Stop and wait for the poll loop and click handler to finish. Commands
    /// for clicks accepted before the stop are sent and answered first.
    pub async fn shutdown(self) {
        self.token.cancel();
        self.poll.join().await;
        if let Err(err) = self.click_task.await {
            debug!(error = %err, "click handler ended abnormally");
        }
        self.sync.flush_commands().await;
        info!("widget shut down");
    }
}
