//! Category filters applied before fuzzy ranking.

use std::collections::BTreeSet;

use crate::models::Song;

/// Sentinel used by the picker for "every song".
pub const ALL_PARTITIONS: i64 = -1;
/// Sentinel used by the picker for "songs without a partition".
pub const UNPARTITIONED: i64 = -2;

/// Which partition the song list is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartitionFilter {
    #[default]
    All,
    /// Only songs that have no partition at all.
    Unpartitioned,
    Only(i64),
}

impl PartitionFilter {
    pub fn matches(&self, song: &Song) -> bool {
        match self {
            PartitionFilter::All => true,
            PartitionFilter::Unpartitioned => song.partition.is_none(),
            PartitionFilter::Only(id) => song.partition == Some(*id),
        }
    }

    /// Integer form understood by external callers (`-1`, `-2` or an id).
    pub fn sentinel(&self) -> i64 {
        match self {
            PartitionFilter::All => ALL_PARTITIONS,
            PartitionFilter::Unpartitioned => UNPARTITIONED,
            PartitionFilter::Only(id) => *id,
        }
    }
}

impl From<i64> for PartitionFilter {
    fn from(value: i64) -> Self {
        match value {
            UNPARTITIONED => PartitionFilter::Unpartitioned,
            id if id >= 0 => PartitionFilter::Only(id),
            _ => PartitionFilter::All,
        }
    }
}

/// A song passes when nothing is chosen, or when it carries every chosen tag.
pub fn tags_match(chosen: &BTreeSet<String>, song: &Song) -> bool {
    if chosen.is_empty() {
        return true;
    }
    match &song.tags {
        Some(tags) => chosen.iter().all(|tag| tags.contains(tag)),
        None => false,
    }
}

/// The complete filter input of the sidebar. Owned by the search bar and
/// passed explicitly into every pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    search: String,
    pub partition: PartitionFilter,
    pub tags: BTreeSet<String>,
}

impl FilterState {
    /// Search text, already trimmed.
    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, text: &str) {
        self.search = text.trim().to_string();
    }

    /// Flip membership of a tag. Returns whether the tag is now chosen.
    pub fn toggle_tag(&mut self, tag: &str) -> bool {
        if self.tags.remove(tag) {
            false
        } else {
            self.tags.insert(tag.to_string());
            true
        }
    }

    /// Reset partition and tags while keeping the search text.
    pub fn clear_categories(&mut self) {
        self.partition = PartitionFilter::All;
        self.tags.clear();
    }

    pub fn matches(&self, song: &Song) -> bool {
        self.partition.matches(song) && tags_match(&self.tags, song)
    }

    /// Project the catalog through the category filters, keeping catalog order.
    pub fn apply(&self, songs: &[Song]) -> Vec<Song> {
        songs.iter().filter(|s| self.matches(s)).cloned().collect()
    }
}
