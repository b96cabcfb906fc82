// src/error.rs

//! Error types shared across the recipe-generation pipeline
//!
//! Per-package failures never cross the batch boundary as panics or aborts;
//! they surface as one of these variants and are counted by the generator.

use thiserror::Error;

/// Convenience result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while generating recipes
#[derive(Debug, Error)]
pub enum Error {
    /// Failure setting up a client, cache directory, or other run-scoped state
    #[error("initialization error: {0}")]
    InitError(String),

    /// Local filesystem error
    #[error("I/O error: {0}")]
    IoError(String),

    /// Network fetch failed after exhausting retries
    #[error("download error: {0}")]
    DownloadError(String),

    /// Malformed index, manifest, or table data
    #[error("parse error: {0}")]
    ParseError(String),

    /// Package name not present as a release package in the snapshot
    #[error("package '{0}' not found in distribution")]
    PackageNotFound(String),

    /// One or more dependency identifiers have no target-ecosystem mapping;
    /// the recipe must not be written while any remain
    #[error("package '{package}' has unresolved dependencies: {deps:?}")]
    UnresolvedDependencies { package: String, deps: Vec<String> },

    /// A required manifest field (license, description) is absent or malformed
    #[error("package '{package}' is missing required metadata field '{field}'")]
    MissingMetadata { package: String, field: &'static str },

    /// Failed to persist a generated recipe to disk
    #[error("failed to write recipe: {0}")]
    WriteError(String),
}
