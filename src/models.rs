//! Domain models shared by the catalog loaders, the search pipeline and the
//! TUI. These stay plain data holders; filtering and ranking live in
//! `crate::search`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One entry of the song catalog. Only `id` and `title` are mandatory; the
/// optional fields double as filter signals (a song without `partition` is an
/// "other song", a song without `tags` never matches a tag selection).
pub struct Song {
    /// Stable identifier used in booklet links. Catalogs store it either as a
    /// number or a string, so it is normalised to text on load.
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: String,
    /// Title shown in lists and search results.
    pub title: String,
    /// Alternative title, rendered in parentheses after the title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alttitle: Option<String>,
    /// First line of the lyrics. Searchable but never rendered in the list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firstline: Option<String>,
    /// Partition (category) id, when the song belongs to one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<i64>,
    /// Free-form labels for the tag picker, in catalog order. `None` and an
    /// empty list both fail any tag selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Song {
    /// Convenience constructor for a song carrying only the mandatory fields.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            alttitle: None,
            firstline: None,
            partition: None,
            tags: None,
        }
    }

    /// Place the song in partition `partition`.
    pub fn with_partition(mut self, partition: i64) -> Self {
        self.partition = Some(partition);
        self
    }

    /// Replace the tag list.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Set the alternative title.
    pub fn with_alttitle(mut self, alttitle: impl Into<String>) -> Self {
        self.alttitle = Some(alttitle.into());
        self
    }

    /// Set the searchable first line.
    pub fn with_firstline(mut self, firstline: impl Into<String>) -> Self {
        self.firstline = Some(firstline.into());
        self
    }

    /// `Title (Alttitle)` or just `Title` when there is no alternative title.
    pub fn display_title(&self) -> String {
        match self.alttitle.as_deref().map(str::trim) {
            Some(alt) if !alt.is_empty() => format!("{} ({})", self.title, alt),
            _ => self.title.clone(),
        }
    }

    /// True when the song carries the given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags
            .as_ref()
            .is_some_and(|tags| tags.iter().any(|t| t == tag))
    }
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_title())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A named song category offered by the partition picker.
pub struct Partition {
    /// Matched against `Song::partition`. Catalog ids are non-negative, since
    /// `-1` and `-2` are reserved as filter sentinels.
    pub id: i64,
    /// Label shown in the picker.
    pub name: String,
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_title_appends_alttitle() {
        let song = Song::new("1", "Helan går").with_alttitle("Snapsvisa");
        assert_eq!(song.display_title(), "Helan går (Snapsvisa)");
        assert_eq!(Song::new("2", "Kalmarevisan").display_title(), "Kalmarevisan");
    }

    #[test]
    fn blank_alttitle_is_ignored() {
        let song = Song::new("1", "Helan går").with_alttitle("  ");
        assert_eq!(song.display_title(), "Helan går");
    }

    #[test]
    fn numeric_and_text_ids_deserialize() {
        let numeric: Song = serde_json::from_str(r#"{"id": 7, "title": "A"}"#).unwrap();
        let text: Song = serde_json::from_str(r#"{"id": "x7", "title": "B"}"#).unwrap();
        assert_eq!(numeric.id, "7");
        assert_eq!(text.id, "x7");
        assert!(numeric.partition.is_none());
        assert!(numeric.tags.is_none());
    }

    #[test]
    fn has_tag_requires_tags_field() {
        let song = Song::new("1", "A").with_tags(["snaps"]);
        assert!(song.has_tag("snaps"));
        assert!(!song.has_tag("sittning"));
        assert!(!Song::new("2", "B").has_tag("snaps"));
    }
}
