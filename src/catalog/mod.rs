//! Read-only song catalog: the songs plus the partition and tag lists offered
//! by the filter pickers. Loaded once at startup from JSON or SQLite.

mod json;
mod sqlite;

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

pub use json::{load_json, parse_json};
pub use sqlite::{load_from_connection, load_sqlite};

use crate::error::{Error, Result};
use crate::models::{Partition, Song};

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    /// Source-of-truth song list, shared with the search pipeline.
    pub songs: Arc<[Song]>,
    pub partitions: Vec<Partition>,
    pub tags: Vec<String>,
}

impl Catalog {
    /// Assemble a catalog, deriving the tag list from the songs when none is
    /// supplied.
    pub fn new(songs: Vec<Song>, partitions: Vec<Partition>, tags: Option<Vec<String>>) -> Self {
        let tags = tags.unwrap_or_else(|| derive_tags(&songs));
        Self {
            songs: songs.into(),
            partitions,
            tags,
        }
    }

    pub fn song(&self, id: &str) -> Option<&Song> {
        self.songs.iter().find(|s| s.id == id)
    }
}

/// Pick the loader from the file extension.
pub fn load(path: &Path) -> Result<Catalog> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let catalog = match extension.as_deref() {
        Some("json") => load_json(path)?,
        Some("sqlite" | "sqlite3" | "db") => load_sqlite(path)?,
        _ => return Err(Error::UnsupportedCatalog(path.to_path_buf())),
    };

    info!(
        path = %path.display(),
        songs = catalog.songs.len(),
        partitions = catalog.partitions.len(),
        tags = catalog.tags.len(),
        "loaded catalog"
    );
    Ok(catalog)
}

/// Sorted, de-duplicated union of every song's tags.
fn derive_tags(songs: &[Song]) -> Vec<String> {
    songs
        .iter()
        .filter_map(|s| s.tags.as_ref())
        .flatten()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
