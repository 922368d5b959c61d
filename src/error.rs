//! Error types

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that end the process (exit code 1)
#[derive(Debug, Error)]
pub enum Error {
    #[error("Backing store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Settings {path}: {reason}")]
    Settings { path: PathBuf, reason: String },

    #[error("Terminal error: {0}")]
    Terminal(#[from] io::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
