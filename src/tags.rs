//! Tag writing: the capability the apply pipeline uses to mutate file tags.
//!
//! The pipeline only sees the [`TagWriter`] trait; [`LoftyTagWriter`] is the
//! production implementation. Both calls are synchronous black boxes from the
//! pipeline's point of view: they either succeed or fail with a [`TagError`].

use std::fmt;
use std::path::Path;

use lofty::config::WriteOptions;
use lofty::file::TaggedFileExt;
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::{ItemKey, Tag, TagType};

/// Logical tag fields the edit session can write.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TagField {
    Album,
    Artist,
    Date,
    TrackNumber,
    Title,
}

impl TagField {
    /// Primary `ItemKey` used for generic `Tag` writes.
    fn item_key(self) -> ItemKey {
        match self {
            TagField::Album => ItemKey::AlbumTitle,
            TagField::Artist => ItemKey::TrackArtist,
            TagField::Date => ItemKey::RecordingDate,
            TagField::TrackNumber => ItemKey::TrackNumber,
            TagField::Title => ItemKey::TrackTitle,
        }
    }
}

impl fmt::Display for TagField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TagField::Album => "Album",
            TagField::Artist => "Artist",
            TagField::Date => "Date",
            TagField::TrackNumber => "Track Number",
            TagField::Title => "Title",
        };
        f.write_str(name)
    }
}

/// A set of field/value pairs to write to one file. Apply commands carry
/// one-entry patches, but the writer accepts any number.
pub type TagPatch = Vec<(TagField, String)>;

#[derive(Debug, thiserror::Error)]
pub enum TagError {
    /// lofty open/read/write failures.
    #[error("{0}")]
    Io(String),
    /// The container cannot hold the tag type we need.
    #[error("{0}")]
    Unsupported(String),
}

/// Synchronous tag-writing capability consumed by the apply executor.
pub trait TagWriter: Send {
    /// Write every field in `patch` to the file at `path`.
    fn write_tags(&self, path: &Path, patch: &TagPatch) -> Result<(), TagError>;
    /// Remove all embedded artwork from the file at `path`.
    fn strip_pictures(&self, path: &Path) -> Result<(), TagError>;
}

/// [`TagWriter`] backed by lofty's generic `Tag` API.
#[derive(Debug, Default)]
pub struct LoftyTagWriter;

impl LoftyTagWriter {
    /// Read the file and hand its primary tag (created when absent) to `f`,
    /// then save in place.
    fn with_primary_tag(
        &self,
        path: &Path,
        f: impl FnOnce(&mut Tag),
    ) -> Result<(), TagError> {
        let mut tagged_file = Probe::open(path)
            .map_err(|e| TagError::Io(format!("cannot open {}: {e}", path.display())))?
            .read()
            .map_err(|e| TagError::Io(format!("cannot read {}: {e}", path.display())))?;

        let tag_type = tagged_file.primary_tag_type();
        if tagged_file.primary_tag().is_none() {
            tagged_file.insert_tag(Tag::new(tag_type));
        }
        let tag = tagged_file.primary_tag_mut().ok_or_else(|| {
            TagError::Unsupported(format!(
                "{} does not support {tag_type:?} tags",
                path.display()
            ))
        })?;

        f(tag);

        tag.save_to_path(path, WriteOptions::default())
            .map_err(|e| TagError::Io(format!("cannot write {}: {e}", path.display())))
    }
}

impl TagWriter for LoftyTagWriter {
    fn write_tags(&self, path: &Path, patch: &TagPatch) -> Result<(), TagError> {
        self.with_primary_tag(path, |tag| {
            for (field, value) in patch {
                tag.insert_text(field.item_key(), value.clone());
                // ID3/MP4 players often read YEAR rather than the recording
                // date. Vorbis Comments use DATE, where a second key would
                // only create a duplicate field.
                if *field == TagField::Date && tag.tag_type() != TagType::VorbisComments {
                    tag.insert_text(ItemKey::Year, value.clone());
                }
            }
        })
    }

    fn strip_pictures(&self, path: &Path) -> Result<(), TagError> {
        self.with_primary_tag(path, |tag| {
            while !tag.pictures().is_empty() {
                tag.remove_picture(0);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_field_display_names_match_writer_keys() {
        assert_eq!(TagField::Album.to_string(), "Album");
        assert_eq!(TagField::Artist.to_string(), "Artist");
        assert_eq!(TagField::Date.to_string(), "Date");
        assert_eq!(TagField::TrackNumber.to_string(), "Track Number");
        assert_eq!(TagField::Title.to_string(), "Title");
    }

    #[test]
    fn write_tags_on_missing_file_reports_io_error() {
        let writer = LoftyTagWriter;
        let err = writer
            .write_tags(
                Path::new("/nonexistent/track.flac"),
                &vec![(TagField::Title, "x".to_string())],
            )
            .unwrap_err();
        assert!(matches!(err, TagError::Io(_)));
    }
}
