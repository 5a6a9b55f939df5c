use std::collections::HashMap;
use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};

use super::Catalog;
use crate::error::Result;
use crate::models::{Partition, Song};

/// Open a SQLite catalog without write access and read everything from it.
///
/// Expected tables: `songs(id, title, alttitle, firstline, partition)`,
/// `partitions(id, name)` and `song_tags(song_id, tag)`. Row order of `songs`
/// is the catalog order.
pub fn load_sqlite(path: &Path) -> Result<Catalog> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    load_from_connection(&conn)
}

pub fn load_from_connection(conn: &Connection) -> Result<Catalog> {
    let mut tags = fetch_song_tags(conn)?;
    let songs = fetch_songs(conn)?
        .into_iter()
        .map(|mut song| {
            song.tags = tags.remove(&song.id);
            song
        })
        .collect();
    let partitions = fetch_partitions(conn)?;
    Ok(Catalog::new(songs, partitions, None))
}

fn fetch_songs(conn: &Connection) -> Result<Vec<Song>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, alttitle, firstline, partition
         FROM songs
         ORDER BY rowid",
    )?;

    let songs = stmt
        .query_map([], |row| {
            Ok(Song {
                id: id_text(row.get(0)?),
                title: row.get(1)?,
                alttitle: row.get(2)?,
                firstline: row.get(3)?,
                partition: row.get(4)?,
                tags: None,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(songs)
}

fn fetch_partitions(conn: &Connection) -> Result<Vec<Partition>> {
    let mut stmt = conn.prepare("SELECT id, name FROM partitions ORDER BY id")?;
    let partitions = stmt
        .query_map([], |row| {
            Ok(Partition {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(partitions)
}

/// Tags grouped per song id, in insertion order.
fn fetch_song_tags(conn: &Connection) -> Result<HashMap<String, Vec<String>>> {
    let mut stmt = conn.prepare("SELECT song_id, tag FROM song_tags ORDER BY rowid")?;
    let mut rows = stmt.query([])?;

    let mut tags: HashMap<String, Vec<String>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let song_id = id_text(row.get(0)?);
        let tag: String = row.get(1)?;
        tags.entry(song_id).or_default().push(tag);
    }
    Ok(tags)
}

/// Song ids may be stored as INTEGER or TEXT.
fn id_text(value: Value) -> String {
    match value {
        Value::Integer(n) => n.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s,
        Value::Blob(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Value::Null => String::new(),
    }
}
