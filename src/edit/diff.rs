use super::state::{AlbumField, EditSession, FieldId, FieldKind};

impl EditSession {
    /// Whether `field` differs from its original value.
    ///
    /// Album and Artist also count as modified while any track carries a
    /// per-track override, since those overrides only exist as pending tag
    /// writes. Cover is modified when a strip or install is queued, even if
    /// the cover filename itself is unchanged.
    pub fn is_modified(&self, field: FieldId) -> bool {
        match field.kind() {
            FieldKind::Album(f) => {
                if self.album.get(f) != self.original.get(f) {
                    return true;
                }
                match f {
                    AlbumField::Album => {
                        self.tracks.iter().any(|t| t.album_override.is_some())
                    }
                    AlbumField::Artist => {
                        self.tracks.iter().any(|t| t.artist_override.is_some())
                    }
                    AlbumField::Cover => {
                        self.strip_embedded_art || self.pending_cover.is_some()
                    }
                    _ => false,
                }
            }
            FieldKind::Track { track, field } => self
                .tracks
                .get(track)
                .map(|t| t.current.get(field) != t.original.get(field))
                .unwrap_or(false),
        }
    }

    /// All modified fields, in stable index order.
    pub fn modified_fields(&self) -> Vec<FieldId> {
        (0..self.field_count())
            .map(FieldId::from_index)
            .filter(|f| self.is_modified(*f))
            .collect()
    }

    pub fn any_modified(&self) -> bool {
        (0..self.field_count())
            .map(FieldId::from_index)
            .any(|f| self.is_modified(f))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::edit::state::{
        AlbumField, AlbumFields, EditSession, FieldId, TrackEdit, TrackField, TrackFields,
    };

    fn session() -> EditSession {
        let fields = AlbumFields {
            album: "Album".to_string(),
            artist: "Artist".to_string(),
            date: "2020".to_string(),
            directory: "Artist - Album".to_string(),
            cover: "cover.jpg".to_string(),
        };
        let track = TrackFields {
            number: "1".to_string(),
            title: "One".to_string(),
            filename: "01 - One.flac".to_string(),
        };
        EditSession {
            music_dir: PathBuf::from("/music"),
            album: fields.clone(),
            original: fields,
            tracks: vec![TrackEdit {
                current: track.clone(),
                original: track,
                dir: "Artist - Album".to_string(),
                ..TrackEdit::default()
            }],
            ..EditSession::default()
        }
    }

    #[test]
    fn clean_session_has_no_modified_fields() {
        let s = session();
        assert!(!s.any_modified());
        assert!(s.modified_fields().is_empty());
    }

    #[test]
    fn edited_values_show_up_as_modified() {
        let mut s = session();
        s.album.date = "2021".to_string();
        s.tracks[0].current.title = "Renamed".to_string();

        assert!(s.is_modified(FieldId::album(AlbumField::Date)));
        assert!(s.is_modified(FieldId::track(0, TrackField::Title)));
        assert!(!s.is_modified(FieldId::track(0, TrackField::Number)));
        assert_eq!(
            s.modified_fields(),
            vec![
                FieldId::album(AlbumField::Date),
                FieldId::track(0, TrackField::Title)
            ]
        );
    }

    #[test]
    fn overrides_mark_album_and_artist_modified() {
        let mut s = session();
        s.tracks[0].album_override = Some("Other".to_string());
        assert!(s.is_modified(FieldId::album(AlbumField::Album)));
        assert!(!s.is_modified(FieldId::album(AlbumField::Artist)));

        s.tracks[0].artist_override = Some("Other".to_string());
        assert!(s.is_modified(FieldId::album(AlbumField::Artist)));
    }

    #[test]
    fn cover_flags_mark_cover_modified() {
        let mut s = session();
        assert!(!s.is_modified(FieldId::album(AlbumField::Cover)));
        s.strip_embedded_art = true;
        assert!(s.is_modified(FieldId::album(AlbumField::Cover)));

        s.strip_embedded_art = false;
        s.pending_cover = Some(PathBuf::from("/tmp/dl.png"));
        assert!(s.is_modified(FieldId::album(AlbumField::Cover)));
    }

    #[test]
    fn out_of_range_track_field_is_never_modified() {
        let s = session();
        assert!(!s.is_modified(FieldId::track(5, TrackField::Title)));
    }
}
