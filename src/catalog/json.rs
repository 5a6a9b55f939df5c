use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::Catalog;
use crate::error::Result;
use crate::models::{Partition, Song};

/// Accepted JSON shapes: a full catalog object or a bare song array.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Full {
        songs: Vec<Song>,
        #[serde(default)]
        partitions: Vec<Partition>,
        #[serde(default)]
        tags: Option<Vec<String>>,
    },
    Songs(Vec<Song>),
}

pub fn load_json(path: &Path) -> Result<Catalog> {
    let raw = fs::read_to_string(path)?;
    parse_json(&raw)
}

pub fn parse_json(raw: &str) -> Result<Catalog> {
    let catalog = match serde_json::from_str::<CatalogFile>(raw)? {
        CatalogFile::Full {
            songs,
            partitions,
            tags,
        } => Catalog::new(songs, partitions, tags),
        CatalogFile::Songs(songs) => Catalog::new(songs, Vec::new(), None),
    };
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn parses_full_catalog() {
        let catalog = parse_json(
            r#"{
                "songs": [
                    {"id": 1, "title": "Kalmarevisan"},
                    {"id": 2, "title": "Helan går", "alttitle": "Snapsvisa",
                     "firstline": "Helan går, sjung hopp faderallan lallan lej",
                     "partition": 2, "tags": ["snaps"]}
                ],
                "partitions": [{"id": 2, "name": "Snapsvisor"}],
                "tags": ["snaps", "taube"]
            }"#,
        )
        .unwrap();

        assert_eq!(catalog.songs.len(), 2);
        assert_eq!(catalog.songs[1].partition, Some(2));
        assert_eq!(catalog.partitions[0].name, "Snapsvisor");
        assert_eq!(catalog.tags, ["snaps", "taube"]);
    }

    #[test]
    fn parses_bare_song_array() {
        let catalog =
            parse_json(r#"[{"id": "a", "title": "A", "tags": ["x"]}, {"id": "b", "title": "B"}]"#)
                .unwrap();
        assert_eq!(catalog.songs.len(), 2);
        assert!(catalog.partitions.is_empty());
        assert_eq!(catalog.tags, ["x"]);
    }

    #[test]
    fn rejects_songs_without_title() {
        let err = parse_json(r#"[{"id": 1}]"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
