//! Core library surface for the songbook TUI: a song catalog browser with a
//! collapsible search sidebar, partition/tag filters, fuzzy search and
//! shareable booklet links.
pub mod booklet;
pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod search;
pub mod ui;

pub use booklet::Booklet;
pub use catalog::Catalog;
pub use config::Config;
pub use error::{Error, Result};

/// The two primary domain types that other layers manipulate.
pub use models::{Partition, Song};

/// The interactive application entry point and state container.
pub use ui::{run_app, App, AppSettings};
