//! git-pair - share one git commit identity between pairing programmers.
//!
//! This library provides the core functionality for the `git-pair` CLI tool:
//! the `.pairs` roster parser, the combined identity codec, and the pairing
//! session that writes the combined identity into git configuration.

pub mod cli;
pub mod commands;
pub mod config;
pub mod git;
pub mod pairing;
pub mod yaml;

use std::path::PathBuf;

/// Library-level error type for git-pair operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("git {command} failed: {message}")]
    Git { command: String, message: String },

    #[error("git {command} timed out after {millis}ms")]
    Timeout { command: String, millis: u64 },

    #[error("No roster found at {}", .0.display())]
    NoRoster(PathBuf),

    #[error("Team member not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for git-pair operations.
pub type Result<T> = std::result::Result<T, Error>;
