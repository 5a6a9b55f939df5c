//! Library-level error type. The UI layer wraps these in `anyhow` with extra
//! context; everything below it returns `songbook::Result`.

use std::path::PathBuf;

use thiserror::Error;

/// Failure modes of the catalog, configuration and booklet-link layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Reading a catalog or config file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON catalog could not be parsed.
    #[error("invalid JSON catalog: {0}")]
    Json(#[from] serde_json::Error),

    /// A SQLite catalog could not be read.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The TOML config file is malformed.
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    /// The catalog path has an extension we do not know how to read.
    #[error("unsupported catalog format: {}", .0.display())]
    UnsupportedCatalog(PathBuf),

    /// The system clipboard refused the write.
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),

    /// The browser could not be launched.
    #[error("failed to open link: {0}")]
    Open(String),

    /// The background ranking thread is gone.
    #[error("search worker stopped")]
    SearchWorker,

    #[error("could not locate home directory")]
    HomeDirectory,
}

/// Result alias used across the library modules.
pub type Result<T> = std::result::Result<T, Error>;
