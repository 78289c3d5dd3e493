use thiserror::Error;

#[derive(Error, Debug)]
pub enum PalfixError {
    #[error("Invalid correction factor: {0}")]
    InvalidFactor(String),

    #[error("Malformed timestamp: {0}")]
    MalformedTimestamp(String),

    #[error("Audio track {track_id} has no sample rate")]
    MissingSampleRate { track_id: u32 },

    #[error("Required tool not found: {0}")]
    ToolMissing(String),

    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("Could not read track information: {0}")]
    TrackInfo(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, PalfixError>;
