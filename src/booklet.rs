//! The booklet: the ordered selection of songs the user is putting together,
//! plus the shareable link built from it.

use tracing::{info, warn};

use crate::error::{Error, Result};

/// Base URL used when the config does not name one.
pub const DEFAULT_BASE_URL: &str = "https://audio.datasektionen.se";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Booklet {
    ids: Vec<String>,
}

impl Booklet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a list of ids, dropping duplicates but keeping first-seen order.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut booklet = Self::new();
        for id in ids {
            booklet.add(id);
        }
        booklet
    }

    /// Append a song id. Returns `false` when it is already in the booklet.
    pub fn add(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn remove_at(&mut self, index: usize) -> Option<String> {
        (index < self.ids.len()).then(|| self.ids.remove(index))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The copy/open link controls are only enabled with at least one song.
    pub fn link_enabled(&self) -> bool {
        !self.is_empty()
    }

    /// `<base>/?id1,id2,...`
    pub fn share_link(&self, base_url: &str) -> String {
        format!("{}/?{}", base_url.trim_end_matches('/'), self.ids.join(","))
    }
}

/// Write the booklet link to the system clipboard.
pub fn copy_link(booklet: &Booklet, base_url: &str) -> Result<String> {
    let url = booklet.share_link(base_url);
    let mut clipboard = arboard::Clipboard::new().map_err(|e| {
        warn!("clipboard unavailable: {e}");
        Error::Clipboard(e.to_string())
    })?;
    clipboard.set_text(url.clone()).map_err(|e| {
        warn!("clipboard write failed: {e}");
        Error::Clipboard(e.to_string())
    })?;
    info!(songs = booklet.len(), "copied booklet link");
    Ok(url)
}

/// Open the booklet link in the default browser.
pub fn open_link(booklet: &Booklet, base_url: &str) -> Result<String> {
    let url = booklet.share_link(base_url);
    open::that(&url).map_err(|e| Error::Open(e.to_string()))?;
    info!(songs = booklet.len(), "opened booklet link");
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_lists_ids_in_order() {
        let booklet = Booklet::from_ids(["12", "4", "7"]);
        assert_eq!(
            booklet.share_link(DEFAULT_BASE_URL),
            "https://audio.datasektionen.se/?12,4,7"
        );
    }

    #[test]
    fn trailing_slash_is_normalised() {
        let booklet = Booklet::from_ids(["1"]);
        assert_eq!(booklet.share_link("https://example.org/"), "https://example.org/?1");
    }

    #[test]
    fn duplicates_are_ignored() {
        let mut booklet = Booklet::new();
        assert!(booklet.add("1"));
        assert!(booklet.add("2"));
        assert!(!booklet.add("1"));
        assert_eq!(booklet.ids(), ["1", "2"]);
    }

    #[test]
    fn link_enabled_iff_not_empty() {
        let mut booklet = Booklet::new();
        assert!(!booklet.link_enabled());
        booklet.add("3");
        assert!(booklet.link_enabled());
        assert_eq!(booklet.remove_at(0).as_deref(), Some("3"));
        assert!(!booklet.link_enabled());
        assert_eq!(booklet.remove_at(0), None);
    }
}
