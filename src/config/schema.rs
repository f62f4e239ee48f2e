use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/maestro/config.toml` or `~/.config/maestro/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `MAESTRO__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub edit: EditSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Root of the music library. Defaults to `~/music` when unset.
    pub music_dir: Option<PathBuf>,
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            music_dir: None,
            extensions: vec![
                "flac".into(),
                "mp3".into(),
                "ogg".into(),
                "opus".into(),
                "m4a".into(),
                "m4b".into(),
                "mp4".into(),
                "aac".into(),
                "wav".into(),
                "wave".into(),
            ],
            follow_links: true,
            include_hidden: false,
        }
    }
}

impl LibrarySettings {
    /// Resolve the music directory: explicit setting, else `$HOME/music`.
    pub fn resolve_music_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.music_dir {
            return Some(dir.clone());
        }
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join("music"))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EditSettings {
    /// Filenames probed (case-insensitively, in order) when looking for an
    /// album's cover image on disk.
    pub cover_candidates: Vec<String>,
    /// Cover filename assumed when no cover file exists yet; also the name
    /// suggested for downloaded covers.
    pub default_cover_name: String,
}

impl Default for EditSettings {
    fn default() -> Self {
        Self {
            cover_candidates: vec![
                "cover.jpg".into(),
                "cover.jpeg".into(),
                "cover.png".into(),
                "folder.jpg".into(),
                "folder.jpeg".into(),
                "folder.png".into(),
                "front.jpg".into(),
                "front.jpeg".into(),
                "front.png".into(),
            ],
            default_cover_name: "cover.jpg".to_string(),
        }
    }
}
