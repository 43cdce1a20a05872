//! Error type definitions
//!
//! A small hierarchical error system: per-site grabber failures are values
//! (the scheduler's `failed` list), never `Err`, so the variants here cover
//! the paths that legitimately abort a run or a phase of it.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Startup and configuration errors (missing manifest, bad flag combinations)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Sites file errors when no fallback directory is available
    #[error("Sites error: {path}: {message}")]
    Sites { path: PathBuf, message: String },

    /// Playlist loading errors (unreadable file, failed fetch)
    #[error("Playlist error: {source_ref} - {message}")]
    Playlist { source_ref: String, message: String },

    /// Guide output errors; these fail the whole run
    #[error("Guide write error: {path}: {source}")]
    GuideWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The run was interrupted before it could deliver a guide
    #[error("interrupted: {message}")]
    Interrupted { message: String },

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AppError {
    /// Create a configuration error with a custom message
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a playlist error
    pub fn playlist<R: Into<String>, M: Into<String>>(source_ref: R, message: M) -> Self {
        Self::Playlist {
            source_ref: source_ref.into(),
            message: message.into(),
        }
    }
}
