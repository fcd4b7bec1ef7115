//! Error types.
//!
//! Only setup paths return errors: opening the audio output, loading settings
//! and parsing melodies. Runtime synthesis calls degrade to silence instead.

/// Crate error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no default output device available")]
    NoOutputDevice,

    #[error("failed to fetch default output config: {0}")]
    OutputConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("malformed melody: {0}")]
    Melody(#[from] serde_json::Error),

    #[error("malformed settings: {0}")]
    Settings(#[from] toml::de::Error),

    #[error("invalid setting `{field}`: {reason}")]
    InvalidSetting {
        field: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;
