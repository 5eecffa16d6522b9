// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CotaskError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Remote service error: {0}")]
    RemoteError(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<reqwest::Error> for CotaskError {
    fn from(err: reqwest::Error) -> Self {
        CotaskError::RemoteError(err.to_string())
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CotaskError>;
