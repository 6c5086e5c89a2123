use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::synchronizer::StateSynchronizer;
use crate::config::PollConfig;

/// Drives the light status refresh. Each cycle runs one poll and decides how
/// long to wait before the next one.
pub struct Poller {
    sync: Arc<StateSynchronizer>,
    config: PollConfig,
    failures: u32,
}

impl Poller {
    pub fn new(sync: Arc<StateSynchronizer>, config: PollConfig) -> Self {
        Self {
            sync,
            config,
            failures: 0,
        }
    }

    /// Failed polls since the last successful one.
    pub fn consecutive_failures(&self) -> u32 {
        self.failures
    }

    /// Run one poll and return the delay before the next one.
    pub async fn cycle(&mut self) -> Duration {
        match self.sync.poll_once().await {
            Ok(on) => {
                self.failures = 0;
                debug!(lights_on = on, "polled light status");
            }
            Err(err) => {
                self.failures = self.failures.saturating_add(1);
                warn!(error = %err, failures = self.failures, "light status poll failed");
            }
        }
        self.config.delay_after(self.failures)
    }

    /// Start the poll loop. The first poll runs after one interval; the token
    /// is honoured between cycles and while a request is in flight.
    pub fn spawn(mut self, token: CancellationToken) -> PollHandle {
        let task_token = token.clone();
        let task = tokio::spawn(async move {
            let mut delay = self.config.interval;
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
                delay = tokio::select! {
                    _ = task_token.cancelled() => break,
                    next = self.cycle() => next,
                };
            }
            debug!("poll loop stopped");
        });
        PollHandle { token, task }
    }
}

/// Handle to a running poll loop.
pub struct PollHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Request the loop to stop without waiting for it.
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the loop and wait for it to exit.
    pub async fn join(self) {
        self.token.cancel();
        if let Err(err) = self.task.await {
            warn!(error = %err, "poll task ended abnormally");
        }
    }
}
