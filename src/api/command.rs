use serde::Serialize;

/// Commands understood by the plugin's simple API endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PluginCommand {
    #[serde(rename = "are_lights_turn_on")]
    AreLightsOn,
    // The server registers the command under this exact (misspelled) name.
    #[serde(rename = "next_lighitng_state")]
    NextLightingState,
}

impl PluginCommand {
    pub fn wire_name(&self) -> &'static str {
        match self {
            PluginCommand::AreLightsOn => "are_lights_turn_on",
            PluginCommand::NextLightingState => "next_lighitng_state",
        }
    }
}

impl std::fmt::Display for PluginCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[derive(Debug, Serialize)]
pub struct CommandBody {
    pub command: PluginCommand,
}

impl From<PluginCommand> for CommandBody {
    fn from(command: PluginCommand) -> Self {
        Self { command }
    }
}
