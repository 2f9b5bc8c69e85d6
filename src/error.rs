//! Error types with fix suggestions

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MoodlightError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// All error variants are part of the public API.
///
/// Display strings double as the `message` of HTTP error bodies, so they
/// stay short and free of internals.
#[derive(Error, Debug)]
pub enum MoodlightError {
    // ─────────────────────────────────────────────────────────────
    // Request / configuration
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    BadRequest(String),

    #[error("Missing {name} in environment")]
    MissingConfig { name: String },

    #[error("Unknown provider: '{0}'. Available: openai, mock")]
    UnknownProvider(String),

    #[error("Unknown preset: '{0}'")]
    UnknownPreset(String),

    // ─────────────────────────────────────────────────────────────
    // Upstream completion API
    // ─────────────────────────────────────────────────────────────
    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("{0}")]
    Transport(String),

    // ─────────────────────────────────────────────────────────────
    // Collaborators
    // ─────────────────────────────────────────────────────────────
    #[error("Weather upstream error ({status})")]
    WeatherUpstream { status: u16 },

    #[error("Invalid weather response")]
    InvalidWeather,

    #[error("{0}")]
    Storage(String),

    // ─────────────────────────────────────────────────────────────
    // Parsing / IO
    // ─────────────────────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MoodlightError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        MoodlightError::BadRequest(message.into())
    }

    pub fn missing_config(name: impl Into<String>) -> Self {
        MoodlightError::MissingConfig { name: name.into() }
    }

    /// HTTP status the error is surfaced with
    pub fn status_code(&self) -> u16 {
        match self {
            MoodlightError::BadRequest(_)
            | MoodlightError::UnknownProvider(_)
            | MoodlightError::UnknownPreset(_) => 400,
            MoodlightError::Upstream { status, .. } => *status,
            MoodlightError::WeatherUpstream { status } => *status,
            MoodlightError::InvalidWeather => 502,
            MoodlightError::MissingConfig { .. }
            | MoodlightError::Transport(_)
            | MoodlightError::Storage(_)
            | MoodlightError::Json(_)
            | MoodlightError::YamlParse(_)
            | MoodlightError::Io(_) => 500,
        }
    }
}

impl FixSuggestion for MoodlightError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            MoodlightError::BadRequest(_) => Some("Send a JSON body with the required fields"),
            MoodlightError::MissingConfig { .. } => {
                Some("Set the variable in the environment or in a .env file")
            }
            MoodlightError::UnknownProvider(_) => Some("Use --provider openai or --provider mock"),
            MoodlightError::UnknownPreset(_) => Some("Run `moodlight presets` to list presets"),
            MoodlightError::Upstream { .. } => Some("Check the model name and OPENAI_API_KEY"),
            MoodlightError::Transport(_) => Some("Check OPENAI_BASE_URL and network access"),
            MoodlightError::WeatherUpstream { .. } | MoodlightError::InvalidWeather => {
                Some("Check MOODLIGHT_WEATHER_URL")
            }
            MoodlightError::Storage(_) => Some("Check KV / Google Sheets credentials"),
            MoodlightError::Json(_) => Some("Ensure the input is valid JSON (try parsing with jq)"),
            MoodlightError::YamlParse(_) => Some("Check YAML syntax: indentation and quoting"),
            MoodlightError::Io(_) => Some("Check file path and permissions"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(MoodlightError::bad_request("x").status_code(), 400);
        assert_eq!(MoodlightError::missing_config("OPENAI_API_KEY").status_code(), 500);
        assert_eq!(
            MoodlightError::Upstream {
                status: 429,
                message: "slow down".into()
            }
            .status_code(),
            429
        );
        assert_eq!(MoodlightError::InvalidWeather.status_code(), 502);
        assert_eq!(MoodlightError::Transport("refused".into()).status_code(), 500);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            MoodlightError::missing_config("OPENAI_API_KEY").to_string(),
            "Missing OPENAI_API_KEY in environment"
        );
        assert_eq!(
            MoodlightError::WeatherUpstream { status: 503 }.to_string(),
            "Weather upstream error (503)"
        );
        assert_eq!(
            MoodlightError::Upstream {
                status: 401,
                message: "Incorrect API key".into()
            }
            .to_string(),
            "Incorrect API key"
        );
    }

    #[test]
    fn test_every_variant_has_suggestion() {
        let errors = [
            MoodlightError::bad_request("x"),
            MoodlightError::UnknownPreset("9".into()),
            MoodlightError::Storage("kv".into()),
        ];
        for e in errors {
            assert!(e.fix_suggestion().is_some());
        }
    }
}
