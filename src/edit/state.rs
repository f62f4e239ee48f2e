use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::config::EditSettings;
use crate::integrity;
use crate::library::Album;

use super::cover;

/// Number of album-level fields (Album, Artist, Date, Directory, Cover).
pub const ALBUM_FIELD_COUNT: usize = 5;
/// Number of per-track fields (Number, Title, Filename).
pub const TRACK_FIELD_COUNT: usize = 3;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AlbumField {
    Album = 0,
    Artist = 1,
    Date = 2,
    Directory = 3,
    Cover = 4,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TrackField {
    Number = 0,
    Title = 1,
    Filename = 2,
}

/// Stable index addressing one editable field for the lifetime of a session.
///
/// Album fields occupy indices 0-4; track fields occupy
/// `5 + track * 3 + offset`. Diff entries, apply commands and UI rows all
/// correlate through this index and nothing else.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldId(usize);

/// A decoded [`FieldId`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Album(AlbumField),
    Track { track: usize, field: TrackField },
}

impl FieldId {
    pub fn album(field: AlbumField) -> Self {
        FieldId(field as usize)
    }

    pub fn track(track: usize, field: TrackField) -> Self {
        FieldId(ALBUM_FIELD_COUNT + track * TRACK_FIELD_COUNT + field as usize)
    }

    pub fn index(self) -> usize {
        self.0
    }

    pub fn from_index(index: usize) -> Self {
        FieldId(index)
    }

    pub fn kind(self) -> FieldKind {
        if self.0 < ALBUM_FIELD_COUNT {
            FieldKind::Album(match self.0 {
                0 => AlbumField::Album,
                1 => AlbumField::Artist,
                2 => AlbumField::Date,
                3 => AlbumField::Directory,
                _ => AlbumField::Cover,
            })
        } else {
            let rel = self.0 - ALBUM_FIELD_COUNT;
            FieldKind::Track {
                track: rel / TRACK_FIELD_COUNT,
                field: match rel % TRACK_FIELD_COUNT {
                    0 => TrackField::Number,
                    1 => TrackField::Title,
                    _ => TrackField::Filename,
                },
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self.kind() {
            FieldKind::Album(AlbumField::Album) => "Album",
            FieldKind::Album(AlbumField::Artist) => "Artist",
            FieldKind::Album(AlbumField::Date) => "Date",
            FieldKind::Album(AlbumField::Directory) => "Dir",
            FieldKind::Album(AlbumField::Cover) => "Cover",
            FieldKind::Track { field: TrackField::Number, .. } => "Track",
            FieldKind::Track { field: TrackField::Title, .. } => "Title",
            FieldKind::Track { field: TrackField::Filename, .. } => "File",
        }
    }
}

/// The five album-level values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlbumFields {
    pub album: String,
    pub artist: String,
    pub date: String,
    pub directory: String,
    pub cover: String,
}

impl AlbumFields {
    pub fn get(&self, field: AlbumField) -> &str {
        match field {
            AlbumField::Album => &self.album,
            AlbumField::Artist => &self.artist,
            AlbumField::Date => &self.date,
            AlbumField::Directory => &self.directory,
            AlbumField::Cover => &self.cover,
        }
    }

    pub fn set(&mut self, field: AlbumField, value: String) {
        match field {
            AlbumField::Album => self.album = value,
            AlbumField::Artist => self.artist = value,
            AlbumField::Date => self.date = value,
            AlbumField::Directory => self.directory = value,
            AlbumField::Cover => self.cover = value,
        }
    }
}

/// The three per-track values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackFields {
    pub number: String,
    pub title: String,
    pub filename: String,
}

impl TrackFields {
    pub fn get(&self, field: TrackField) -> &str {
        match field {
            TrackField::Number => &self.number,
            TrackField::Title => &self.title,
            TrackField::Filename => &self.filename,
        }
    }

    pub fn set(&mut self, field: TrackField, value: String) {
        match field {
            TrackField::Number => self.number = value,
            TrackField::Title => self.title = value,
            TrackField::Filename => self.filename = value,
        }
    }
}

/// Edit state for one track: current/original values, the directory the file
/// lives in (relative to the music root), and the per-track Album/Artist
/// overrides that only mixed-origin albums use.
#[derive(Debug, Clone, Default)]
pub struct TrackEdit {
    pub current: TrackFields,
    pub original: TrackFields,
    pub dir: String,
    pub album_override: Option<String>,
    pub artist_override: Option<String>,
    /// Set at seed time from the integrity verifier; display-only.
    pub corrupted: bool,
}

/// One album's edit session: current and original values for every field,
/// plus the cover/art flags the cover field folds in.
///
/// Created when an album is opened for editing, discarded when the session
/// exits or a completed apply triggers a library reload.
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    pub music_dir: PathBuf,
    pub album: AlbumFields,
    pub original: AlbumFields,
    pub tracks: Vec<TrackEdit>,
    /// Cover image filename detected on disk, if any.
    pub cover_file: Option<String>,
    /// Whether the first track carries embedded artwork.
    pub has_embedded_art: bool,
    /// Strip embedded artwork from every track on the next apply.
    pub strip_embedded_art: bool,
    /// Downloaded cover image waiting to be installed, as a temp file path.
    pub pending_cover: Option<PathBuf>,
}

fn parent_dir(uri: &str) -> String {
    match Path::new(uri).parent() {
        Some(p) if p != Path::new("") => p.to_string_lossy().into_owned(),
        _ => String::new(),
    }
}

impl EditSession {
    /// Seed a session from a library snapshot: copy tag values, probe the
    /// album directory for a cover file, the first track for embedded art,
    /// and run the integrity check on every track.
    pub fn begin(music_dir: &Path, album: &Album, settings: &EditSettings) -> Self {
        let dir = album
            .songs
            .first()
            .map(|s| parent_dir(&s.uri))
            .unwrap_or_default();

        let album_dir = music_dir.join(&dir);
        let cover_file = cover::detect_cover_file(&album_dir, &settings.cover_candidates);
        let cover_name = cover_file
            .clone()
            .unwrap_or_else(|| settings.default_cover_name.clone());

        let fields = AlbumFields {
            album: album.album.clone(),
            artist: album.artist.clone(),
            date: album.date.clone(),
            directory: dir,
            cover: cover_name,
        };

        let tracks: Vec<TrackEdit> = album
            .songs
            .iter()
            .map(|song| {
                let path = music_dir.join(&song.uri);
                let fields = TrackFields {
                    number: song.number.to_string(),
                    title: song.title.clone(),
                    filename: Path::new(&song.uri)
                        .file_name()
                        .map(|f| f.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                };
                TrackEdit {
                    current: fields.clone(),
                    original: fields,
                    dir: parent_dir(&song.uri),
                    album_override: None,
                    artist_override: None,
                    corrupted: integrity::check_file(&path).is_err(),
                }
            })
            .collect();

        let has_embedded_art = album
            .songs
            .first()
            .map(|song| cover::detect_embedded_art(&music_dir.join(&song.uri)))
            .unwrap_or(false);

        Self {
            music_dir: music_dir.to_path_buf(),
            original: fields.clone(),
            album: fields,
            tracks,
            cover_file,
            has_embedded_art,
            strip_embedded_art: false,
            pending_cover: None,
        }
    }

    /// Total number of addressable fields.
    pub fn field_count(&self) -> usize {
        ALBUM_FIELD_COUNT + self.tracks.len() * TRACK_FIELD_COUNT
    }

    /// Current value of `field`, or `""` for an out-of-range track index.
    pub fn value(&self, field: FieldId) -> &str {
        match field.kind() {
            FieldKind::Album(f) => self.album.get(f),
            FieldKind::Track { track, field } => self
                .tracks
                .get(track)
                .map(|t| t.current.get(field))
                .unwrap_or(""),
        }
    }

    pub fn set_value(&mut self, field: FieldId, value: String) {
        match field.kind() {
            FieldKind::Album(f) => self.album.set(f, value),
            FieldKind::Track { track, field } => {
                if let Some(t) = self.tracks.get_mut(track) {
                    t.current.set(field, value);
                }
            }
        }
    }

    /// Whether the album's tracks come from more than one source directory.
    pub fn is_mixed(&self) -> bool {
        let dirs: BTreeSet<&str> = self.tracks.iter().map(|t| t.dir.as_str()).collect();
        dirs.len() > 1
    }

    /// The value a tag write should carry for an album-level field on one
    /// track: the per-track override when present (mixed albums), else the
    /// album-level current value.
    pub fn album_tag_value(&self, field: AlbumField, track: usize) -> &str {
        if let Some(t) = self.tracks.get(track) {
            match field {
                AlbumField::Album => {
                    if let Some(v) = t.album_override.as_deref() {
                        return v;
                    }
                }
                AlbumField::Artist => {
                    if let Some(v) = t.artist_override.as_deref() {
                        return v;
                    }
                }
                _ => {}
            }
        }
        self.album.get(field)
    }

    /// Restore `field` to its original value. Reverting Album/Artist also
    /// drops per-track overrides; reverting Cover cancels pending strip and
    /// install requests.
    pub fn revert(&mut self, field: FieldId) {
        match field.kind() {
            FieldKind::Album(f) => {
                self.album.set(f, self.original.get(f).to_string());
                match f {
                    AlbumField::Album => {
                        for t in &mut self.tracks {
                            t.album_override = None;
                        }
                    }
                    AlbumField::Artist => {
                        for t in &mut self.tracks {
                            t.artist_override = None;
                        }
                    }
                    AlbumField::Cover => {
                        self.strip_embedded_art = false;
                        self.pending_cover = None;
                    }
                    _ => {}
                }
            }
            FieldKind::Track { track, field } => {
                if let Some(t) = self.tracks.get_mut(track) {
                    t.current.set(field, t.original.get(field).to_string());
                }
            }
        }
    }

    /// Restore every field to its original value.
    pub fn revert_all(&mut self) {
        self.album = self.original.clone();
        self.strip_embedded_art = false;
        self.pending_cover = None;
        for t in &mut self.tracks {
            t.current = t.original.clone();
            t.album_override = None;
            t.artist_override = None;
        }
    }

    /// Derive directory, filenames and cover name from the current tag
    /// values: `Artist - Album` for the directory, `NN - Title.ext` per
    /// track. Requests an embedded-art strip when artwork was detected.
    pub fn sync_filenames(&mut self) {
        self.album.directory =
            sanitize_filename(&format!("{} - {}", self.album.artist, self.album.album));

        for (i, t) in self.tracks.iter_mut().enumerate() {
            let ext = file_extension(&t.original.filename);
            let number: u32 = t.current.number.parse().unwrap_or(i as u32 + 1);
            t.current.filename = format!(
                "{:02} - {}{}",
                number,
                sanitize_filename(&t.current.title),
                ext
            );
        }

        if self.cover_file.is_some() {
            let ext = file_extension(&self.original.cover);
            self.album.cover = format!("cover{ext}");
        }

        if self.has_embedded_art {
            self.strip_embedded_art = true;
        }
    }

    /// The inverse of [`sync_filenames`](Self::sync_filenames): parse tag
    /// values out of the directory name (`Artist - Album (YYYY)`) and track
    /// filenames (`NN - Title.ext`). On mixed-origin albums the album-level
    /// fields become `"mixed"` and each track gets overrides parsed from its
    /// own directory.
    pub fn fill_from_filenames(&mut self) {
        if self.is_mixed() {
            self.album.album = "mixed".to_string();
            self.album.artist = "mixed".to_string();
            for t in &mut self.tracks {
                let (artist, album, _) = parse_dir_name(dir_base(&t.dir));
                t.artist_override = artist;
                t.album_override = Some(album);
            }
        } else {
            let (artist, album, date) = parse_dir_name(dir_base(&self.original.directory));
            if let Some(artist) = artist {
                self.album.artist = artist;
            }
            self.album.album = album;
            if let Some(date) = date {
                self.album.date = date;
            }
        }

        for t in &mut self.tracks {
            if let Some((number, title)) = parse_track_filename(&t.original.filename) {
                t.current.number = number;
                t.current.title = title;
            }
        }
    }

    /// Commit a successfully applied field: copy its current value into the
    /// original slot, re-establishing `current == original`. Committing the
    /// cover field also resolves the strip/install flags.
    pub fn commit_applied(&mut self, field: FieldId) {
        match field.kind() {
            FieldKind::Album(f) => {
                self.original.set(f, self.album.get(f).to_string());
                if f == AlbumField::Cover {
                    self.strip_embedded_art = false;
                    self.has_embedded_art = false;
                    if self.pending_cover.take().is_some() {
                        self.cover_file = Some(self.album.cover.clone());
                    }
                }
            }
            FieldKind::Track { track, field } => {
                if let Some(t) = self.tracks.get_mut(track) {
                    t.original.set(field, t.current.get(field).to_string());
                }
            }
        }
    }
}

/// Replace path separators so a tag value is usable as a file name.
pub fn sanitize_filename(s: &str) -> String {
    s.replace('/', "-")
}

fn file_extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default()
}

/// Last path component of a relative directory, or the whole string when it
/// has no separators.
fn dir_base(dir: &str) -> &str {
    dir.rsplit('/').next().unwrap_or(dir)
}

fn dir_year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\((\d{4})\)\s*$").expect("dir year regex"))
}

fn track_filename_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)[\s.\-]+(.+)\.\w+$").expect("track filename regex"))
}

/// Parse `Artist - Album (YYYY)` into its parts. Artist and year are
/// optional; everything before the first ` - ` is the artist.
fn parse_dir_name(dir: &str) -> (Option<String>, String, Option<String>) {
    let mut date = None;
    let mut rest = dir;
    if let Some(m) = dir_year_re().captures(dir) {
        date = Some(m[1].to_string());
        rest = dir[..dir.len() - m[0].len()].trim_end();
    }
    match rest.split_once(" - ") {
        Some((artist, album)) => (Some(artist.to_string()), album.to_string(), date),
        None => (None, rest.to_string(), date),
    }
}

/// Parse `NN - Title.ext` into (number, title). Leading zeros are dropped
/// from the number when it parses.
fn parse_track_filename(name: &str) -> Option<(String, String)> {
    let caps = track_filename_re().captures(name)?;
    let number = match caps[1].parse::<u32>() {
        Ok(n) => n.to_string(),
        Err(_) => caps[1].to_string(),
    };
    Some((number, caps[2].to_string()))
}
