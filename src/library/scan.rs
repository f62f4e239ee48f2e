use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use lofty::prelude::*;
use lofty::tag::ItemKey;
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::model::{Album, Library, Song};

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn tag_string(tag: &lofty::tag::Tag, key: &ItemKey) -> Option<String> {
    tag.get_string(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Scan `dir` and group every audio file into an album-keyed [`Library`].
///
/// Unreadable files still appear (with filename-derived fallbacks) so that
/// broken tracks stay visible to integrity checks and edit sessions.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Library {
    // Keyed by (artist, album) lowercased for grouping; values keep the
    // first-seen spelling.
    let mut albums: BTreeMap<(String, String), Album> = BTreeMap::new();

    for entry in WalkDir::new(dir)
        .follow_links(settings.follow_links)
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !path.is_file() || !is_audio_file(path, settings) {
            continue;
        }

        let Ok(relative) = path.strip_prefix(dir) else {
            continue;
        };
        let Some(uri) = relative.to_str().map(str::to_string) else {
            continue;
        };

        let default_title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string();

        let mut title = default_title;
        let mut artist = String::new();
        let mut album = String::new();
        let mut date = String::new();
        let mut number: u32 = 0;
        let mut duration: Option<Duration> = None;

        if let Ok(tagged) = lofty::read_from_path(path) {
            duration = Some(tagged.properties().duration());

            if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                if let Some(v) = tag_string(tag, &ItemKey::TrackTitle) {
                    title = v;
                }
                // Group by the album artist when one is set, so multi-artist
                // albums stay together.
                artist = tag_string(tag, &ItemKey::AlbumArtist)
                    .or_else(|| tag_string(tag, &ItemKey::TrackArtist))
                    .unwrap_or_default();
                album = tag_string(tag, &ItemKey::AlbumTitle).unwrap_or_default();
                date = tag_string(tag, &ItemKey::RecordingDate)
                    .or_else(|| tag_string(tag, &ItemKey::Year))
                    .unwrap_or_default();
                number = tag_string(tag, &ItemKey::TrackNumber)
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
            }
        }

        let key = (artist.to_lowercase(), album.to_lowercase());
        let entry = albums.entry(key).or_insert_with(|| Album {
            artist: artist.clone(),
            album: album.clone(),
            date: date.clone(),
            songs: Vec::new(),
        });
        if entry.date.is_empty() && !date.is_empty() {
            entry.date = date;
        }
        entry.songs.push(Song {
            uri,
            title,
            number,
            duration,
        });
    }

    let mut albums: Vec<Album> = albums.into_values().collect();
    for album in &mut albums {
        album
            .songs
            .sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.uri.cmp(&b.uri)));
    }
    albums.sort_by(|a, b| {
        (a.artist.to_lowercase(), a.album.to_lowercase())
            .cmp(&(b.artist.to_lowercase(), b.album.to_lowercase()))
    });

    Library { albums }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn is_audio_file_matches_configured_extensions_case_insensitive() {
        let settings = LibrarySettings::default();
        assert!(is_audio_file(Path::new("/tmp/a.mp3"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.MP3"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.flac"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.opus"), &settings));
        assert!(!is_audio_file(Path::new("/tmp/a.txt"), &settings));
        assert!(!is_audio_file(Path::new("/tmp/a"), &settings));
    }

    #[test]
    fn scan_skips_non_audio_and_uses_relative_uris() {
        let dir = tempdir().unwrap();
        let album_dir = dir.path().join("Some Album");
        fs::create_dir_all(&album_dir).unwrap();
        fs::write(album_dir.join("01 - a.mp3"), b"not a real mp3").unwrap();
        fs::write(album_dir.join("notes.txt"), b"ignore me").unwrap();

        let library = scan(dir.path(), &LibrarySettings::default());
        assert_eq!(library.albums.len(), 1);
        assert_eq!(library.albums[0].songs.len(), 1);
        assert_eq!(library.albums[0].songs[0].uri, "Some Album/01 - a.mp3");
        // Unreadable tags fall back to the file stem.
        assert_eq!(library.albums[0].songs[0].title, "01 - a");
    }

    #[test]
    fn scan_respects_include_hidden_false() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".hidden.mp3"), b"not real").unwrap();
        fs::write(dir.path().join("visible.mp3"), b"not real").unwrap();

        let settings = LibrarySettings {
            include_hidden: false,
            ..LibrarySettings::default()
        };
        let library = scan(dir.path(), &settings);

        let uris: Vec<&str> = library
            .albums
            .iter()
            .flat_map(|a| a.songs.iter().map(|s| s.uri.as_str()))
            .collect();
        assert_eq!(uris, vec!["visible.mp3"]);
    }

    #[test]
    fn fs_library_source_fails_on_missing_root() {
        let source = crate::library::FsLibrarySource::new(
            "/nonexistent/music",
            LibrarySettings::default(),
        );
        assert!(crate::library::LibrarySource::load(&source).is_err());
    }
}
