#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    #[error("Unexpected response from plugin: {0}")]
    MalformedResponse(String),

    #[error("No settings source was supplied to the widget")]
    MissingSettings,

    #[error("Persisted lighting mode index {0} is out of range (expected 0-3)")]
    InvalidMode(usize),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Widget is already shut down")]
    AlreadyStopped,

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::MissingSettings | AppError::InvalidMode(_) | AppError::Settings(_) => 2,
            AppError::Http(_) => 3,
            AppError::Api { .. } | AppError::MalformedResponse(_) => 4,
            _ => 1,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Api { .. } => "api",
            AppError::MalformedResponse(_) => "malformed_response",
            AppError::MissingSettings => "missing_settings",
            AppError::InvalidMode(_) => "invalid_mode",
            AppError::Settings(_) => "settings",
            AppError::AlreadyStopped => "already_stopped",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::Http(_) => "http",
            AppError::Json(_) => "json",
            AppError::Io(_) => "io",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::json!({
            "error": self.error_type(),
            "message": self.to_string(),
        });
        if let AppError::Api {
            status: Some(status),
            ..
        } = self
        {
            obj["status"] = serde_json::json!(status);
        }
        obj
    }
}
