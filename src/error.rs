#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    NoConfigDir,

    #[error("Catalog is not configured: {0}")]
    Configuration(String),

    #[error("Catalog API error: {status} {status_text}")]
    Upstream { status: u16, status_text: String },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Movie {0} not found")]
    NotFound(u64),

    #[error("Unexpected catalog response: {0}")]
    Schema(String),
}

impl Error {
    pub fn missing_api_key() -> Self {
        Error::Configuration(
            "no API key set. Export TMDB_API_KEY or add `api_key` under [catalog] in config.toml"
                .to_string(),
        )
    }

    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Upstream { .. } | Error::Transport(_))
    }

    /// Text shown in the UI for a failed listing fetch.
    pub fn user_message(&self) -> String {
        self.user_message_for("movies")
    }

    /// Text shown in the UI when loading `subject` failed.
    pub fn user_message_for(&self, subject: &str) -> String {
        match self {
            Error::Configuration(detail) => format!(
                "Setup required: {}. Get a key at https://www.themoviedb.org/settings/api",
                detail
            ),
            Error::NotFound(_) => "Movie not found".to_string(),
            other if other.is_retryable() => {
                format!("Failed to load {} ({}). Press r to retry.", subject, other)
            }
            other => format!("Failed to load {} ({})", subject, other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
