use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::mode::Mode;

/// Present on the root element until the widget has been bound.
pub const HIDDEN_CLASS: &str = "is-hidden";
/// Present on the root element while the lights are reported on.
pub const LIGHT_ON_CLASS: &str = "is-turned-on";

/// In-memory presentation surface: a root element with a class list and a
/// label holding the mode text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    label: String,
    classes: BTreeSet<String>,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            label: String::new(),
            classes: BTreeSet::from([HIDDEN_CLASS.to_string()]),
        }
    }
}

impl Surface {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, text: impl Into<String>) {
        self.label = text.into();
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn toggle_class(&mut self, class: &str, present: bool) {
        if present {
            self.classes.insert(class.to_string());
        } else {
            self.classes.remove(class);
        }
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }
}

/// Whether the displayed mode has been acknowledged by the plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeSync {
    Confirmed,
    Pending,
    Diverged,
}

/// What observers of the widget see after each change.
#[derive(Debug, Clone, Serialize)]
pub struct SurfaceSnapshot {
    pub mode: Option<Mode>,
    pub label: String,
    pub lights_on: bool,
    pub visible: bool,
    pub sync: ModeSync,
    pub at: DateTime<Utc>,
}

impl SurfaceSnapshot {
    pub fn capture(surface: &Surface, sync: ModeSync) -> Self {
        Self {
            mode: Mode::from_label(surface.label()),
            label: surface.label().to_string(),
            lights_on: surface.has_class(LIGHT_ON_CLASS),
            visible: !surface.has_class(HIDDEN_CLASS),
            sync,
            at: Utc::now(),
        }
    }

    /// Equal apart from the capture time.
    pub fn same_state(&self, other: &SurfaceSnapshot) -> bool {
        self.label == other.label
            && self.lights_on == other.lights_on
            && self.visible == other.visible
            && self.sync == other.sync
    }
}
