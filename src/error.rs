use thiserror::Error;

#[derive(Error, Debug)]
pub enum DayTrackerError {
    #[error("Invalid date key: {0}. Expected YYYY-MM-DD")]
    InvalidDateKey(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Storage error for key '{key}': {details}")]
    StorageError { key: String, details: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DayTrackerError>;
