use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GymError {
    #[error("Config directory not found at {0}. Run 'gym init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Invalid member: {0}")]
    InvalidRecord(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Member '{0}' not found")]
    NotFound(String),

    #[error("Invalid member index '{0}'. Use 'gym list' to see available members.")]
    InvalidMemberIndex(String),

    #[error("CSV is empty or has no header row")]
    EmptyOrMalformedCsv,

    #[error("No valid rows found in CSV")]
    NoValidRows,

    #[error("Refusing to delete '{0}' without --yes")]
    ConfirmationRequired(String),

    #[error("Failed to read stored members under key '{key}': {source}")]
    Store {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GymError>;
