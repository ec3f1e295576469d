use std::path::PathBuf;

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

    #[error("Data directory not found")]
    NoDataDir,

    #[error("Input directory not found: {0}")]
    InputDirNotFound(PathBuf),

    #[error("Invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Show or episode not resolved for {0}")]
    IncompleteResult(PathBuf),

    #[error("Format rendered an empty path for {0}")]
    EmptyDestination(PathBuf),

    #[error("Destination already exists: {0}")]
    DestinationExists(PathBuf),

    #[error("Operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;
