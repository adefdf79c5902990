//! Backlog - a prioritized work-item list for the command line.
//!
//! This library provides the core functionality for the `blg` CLI tool:
//! a named collection of entries (title, score, duration) with a derived
//! priority, stable column sorting, display rescaling, and JSON/CSV
//! import/export with per-workspace snapshot persistence.

pub mod cli;
pub mod commands;
pub mod csv;
pub mod models;
pub mod storage;

/// Library-level error type for backlog operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for backlog operations.
pub type Result<T> = std::result::Result<T, Error>;
