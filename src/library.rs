//! Library snapshot: albums and songs scanned from the music directory.
//!
//! A [`Library`] is an immutable snapshot. Edit sessions are seeded from it
//! and, once an apply completes, a fresh snapshot is requested through the
//! [`LibrarySource`] seam so the session never re-reads stale data.

mod model;
mod scan;

use std::path::{Path, PathBuf};

pub use model::{Album, Library, Song};
pub use scan::scan;

use crate::config::LibrarySettings;

/// Capability to (re)load a library snapshot from the audio source.
pub trait LibrarySource {
    fn load(&self) -> Result<Library, std::io::Error>;
}

/// [`LibrarySource`] that scans a directory tree on disk.
pub struct FsLibrarySource {
    music_dir: PathBuf,
    settings: LibrarySettings,
}

impl FsLibrarySource {
    pub fn new(music_dir: impl Into<PathBuf>, settings: LibrarySettings) -> Self {
        Self {
            music_dir: music_dir.into(),
            settings,
        }
    }

    pub fn music_dir(&self) -> &Path {
        &self.music_dir
    }
}

impl LibrarySource for FsLibrarySource {
    fn load(&self) -> Result<Library, std::io::Error> {
        // Scanning itself skips unreadable entries, but a missing root is an
        // error the caller needs to see.
        std::fs::metadata(&self.music_dir)?;
        Ok(scan(&self.music_dir, &self.settings))
    }
}
