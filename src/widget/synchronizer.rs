use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use super::surface::{ModeSync, Surface, SurfaceSnapshot, HIDDEN_CLASS, LIGHT_ON_CLASS};
use crate::api::client::PluginApi;
use crate::error::AppError;
use crate::models::mode::Mode;
use crate::models::settings::SettingsSource;

struct State {
    surface: Surface,
    sync: ModeSync,
    /// Bumped by every advance, so a late acknowledgment of an older advance
    /// does not confirm a newer one.
    generation: u64,
    /// Advances whose command has not been answered yet.
    in_flight: u32,
}

/// Local belief about the displayed mode and light status, kept in step with
/// the plugin.
pub struct StateSynchronizer {
    api: PluginApi,
    settings: SettingsSource,
    state: Mutex<State>,
    updates: watch::Sender<SurfaceSnapshot>,
    commands: TaskTracker,
}

impl StateSynchronizer {
    pub fn new(api: PluginApi, settings: SettingsSource) -> Self {
        let surface = Surface::default();
        let (updates, _) = watch::channel(SurfaceSnapshot::capture(&surface, ModeSync::Confirmed));
        Self {
            api,
            settings,
            state: Mutex::new(State {
                surface,
                sync: ModeSync::Confirmed,
                generation: 0,
                in_flight: 0,
            }),
            updates,
            commands: TaskTracker::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a change to the state and publish the result if it changed.
    fn update<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let (result, snapshot) = {
            let mut state = self.lock();
            let result = f(&mut state);
            (result, SurfaceSnapshot::capture(&state.surface, state.sync))
        };
        self.updates.send_if_modified(|current| {
            if current.same_state(&snapshot) {
                false
            } else {
                *current = snapshot;
                true
            }
        });
        result
    }

    pub fn subscribe(&self) -> watch::Receiver<SurfaceSnapshot> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> SurfaceSnapshot {
        let state = self.lock();
        SurfaceSnapshot::capture(&state.surface, state.sync)
    }

    /// Mode currently shown, or `None` if the label holds no known mode.
    pub fn read_displayed_mode(&self) -> Option<Mode> {
        Mode::from_label(self.lock().surface.label())
    }

    pub fn write_displayed_mode(&self, mode: Mode) {
        self.update(|state| state.surface.set_label(mode.label()));
    }

    pub fn read_light_status(&self) -> bool {
        self.lock().surface.has_class(LIGHT_ON_CLASS)
    }

    pub fn write_light_status(&self, on: bool) {
        self.update(|state| state.surface.toggle_class(LIGHT_ON_CLASS, on));
    }

    pub fn mode_sync(&self) -> ModeSync {
        self.lock().sync
    }

    pub(crate) fn reveal(&self) {
        self.update(|state| state.surface.toggle_class(HIDDEN_CLASS, false));
    }

    /// Optimistic half of an advance: show the next mode and mark it pending.
    fn begin_advance(&self) -> (Mode, u64) {
        self.update(|state| {
            let next = Mode::after_label(state.surface.label());
            state.surface.set_label(next.label());
            state.generation += 1;
            state.in_flight += 1;
            if state.sync != ModeSync::Diverged {
                state.sync = ModeSync::Pending;
            }
            (next, state.generation)
        })
    }

    fn finish_advance(&self, generation: u64, result: &Result<(), AppError>) {
        self.update(|state| {
            state.in_flight = state.in_flight.saturating_sub(1);
            match result {
                Ok(()) => {
                    if state.sync == ModeSync::Pending && state.generation == generation {
                        state.sync = ModeSync::Confirmed;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "mode change was not acknowledged; display may disagree with the plugin");
                    state.sync = ModeSync::Diverged;
                }
            }
        });
    }

    /// Show the next mode immediately, then tell the plugin. The display is not
    /// rolled back on failure; the mode is marked diverged instead.
    pub async fn advance_mode(&self) -> Result<Mode, AppError> {
        let (next, generation) = self.begin_advance();
        debug!(mode = %next, "advancing mode");
        let result = self.api.next_lighting_state().await;
        self.finish_advance(generation, &result);
        result.map(|()| next)
    }

    /// Same as [`advance_mode`](Self::advance_mode) but returns as soon as the
    /// display is updated; the command is sent from a spawned task.
    pub fn advance_mode_detached(self: &Arc<Self>) -> Mode {
        let (next, generation) = self.begin_advance();
        debug!(mode = %next, "advancing mode");
        let this = Arc::clone(self);
        self.commands.spawn(async move {
            let result = this.api.next_lighting_state().await;
            this.finish_advance(generation, &result);
        });
        next
    }

    /// Wait for every command started by
    /// [`advance_mode_detached`](Self::advance_mode_detached) to be answered.
    pub async fn flush_commands(&self) {
        self.commands.close();
        self.commands.wait().await;
    }

    /// One poll cycle: ask the plugin for the light status and show it. A
    /// diverged mode is reconciled from the settings source afterwards.
    pub async fn poll_once(&self) -> Result<bool, AppError> {
        let on = self.api.are_lights_on().await?;
        self.write_light_status(on);

        if self.mode_sync() == ModeSync::Diverged {
            self.reconcile_mode().await;
        }
        Ok(on)
    }

    async fn reconcile_mode(&self) {
        if !self.settings.is_live() {
            return;
        }
        let (generation, in_flight) = {
            let state = self.lock();
            (state.generation, state.in_flight)
        };
        // An unanswered advance may still move the plugin; settings would be stale.
        if in_flight > 0 {
            return;
        }
        let mode = match self.settings.load().await.and_then(|s| s.mode()) {
            Ok(mode) => mode,
            Err(err) => {
                warn!(error = %err, "cannot reconcile mode from settings");
                return;
            }
        };
        self.update(|state| {
            // A click during the reload wins over the reloaded value.
            if state.generation == generation && state.in_flight == 0 {
                info!(mode = %mode, "reconciled mode from settings");
                state.surface.set_label(mode.label());
                state.sync = ModeSync::Confirmed;
            }
        });
    }
}
