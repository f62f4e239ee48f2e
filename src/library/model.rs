use std::time::Duration;

/// One audio file. `uri` is the path relative to the music directory.
#[derive(Debug, Clone)]
pub struct Song {
    pub uri: String,
    pub title: String,
    pub number: u32,
    pub duration: Option<Duration>,
}

/// Songs grouped under one (artist, album) pair. Tracks of a grouped album
/// may still live in more than one directory on disk.
#[derive(Debug, Clone)]
pub struct Album {
    pub artist: String,
    pub album: String,
    pub date: String,
    pub songs: Vec<Song>,
}

/// Immutable snapshot of the scanned music directory.
#[derive(Debug, Clone, Default)]
pub struct Library {
    pub albums: Vec<Album>,
}

impl Library {
    pub fn is_empty(&self) -> bool {
        self.albums.is_empty()
    }
}
