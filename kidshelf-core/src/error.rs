//! Error types for kidshelf-core

use thiserror::Error;

/// Main error type for the kidshelf-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Metadata provider (TMDB) error
    #[error("provider error: {0}")]
    Provider(String),

    /// AI safety assessment error
    #[error("assessment error: {0}")]
    Assessment(String),

    /// A predecessor stage has not produced its output file yet
    #[error("no {stage} output at {path} (run `kidshelf {command}` first)")]
    MissingStage {
        stage: String,
        path: String,
        command: String,
    },
}

impl Error {
    /// Build a missing-stage error naming the prerequisite command.
    pub fn missing_stage(stage: &str, path: &std::path::Path, command: &str) -> Self {
        Error::MissingStage {
            stage: stage.to_string(),
            path: path.display().to_string(),
            command: command.to_string(),
        }
    }
}

/// Result type alias for kidshelf-core
pub type Result<T> = std::result::Result<T, Error>;
