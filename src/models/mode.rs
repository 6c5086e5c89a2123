use serde::Serialize;

/// Lighting mode of the chamber, in the order the plugin cycles through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Mode {
    Manual,
    Auto,
    On,
    Off,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Manual, Mode::Auto, Mode::On, Mode::Off];

    pub fn from_index(index: usize) -> Option<Mode> {
        Self::ALL.get(index).copied()
    }

    pub fn index(&self) -> usize {
        match self {
            Mode::Manual => 0,
            Mode::Auto => 1,
            Mode::On => 2,
            Mode::Off => 3,
        }
    }

    /// Label text shown on the widget.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Manual => "Manual",
            Mode::Auto => "Auto",
            Mode::On => "On",
            Mode::Off => "Off",
        }
    }

    /// Exact label lookup; anything else is not a mode.
    pub fn from_label(text: &str) -> Option<Mode> {
        Self::ALL.into_iter().find(|m| m.label() == text)
    }

    pub fn next(&self) -> Mode {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Mode following the given label. Text that matches no mode counts as
    /// position -1, so it advances to the first mode.
    pub fn after_label(text: &str) -> Mode {
        Self::from_label(text).map_or(Self::ALL[0], |m| m.next())
    }

    pub fn description(&self) -> &'static str {
        match self {
            Mode::Manual => "Lights follow the door sensor",
            Mode::Auto => "Lights turn on with the door and stay on for the hold time after it closes",
            Mode::On => "Lights forced on",
            Mode::Off => "Lights forced off",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
