use std::path::PathBuf;

use crate::tags::{TagField, TagPatch};

use super::state::{AlbumField, EditSession, FieldId, FieldKind, TrackField};

/// One filesystem or tag mutation. Paths are absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyAction {
    WriteTags { path: PathBuf, patch: TagPatch },
    Rename { src: PathBuf, dst: PathBuf },
    StripArt { path: PathBuf },
    InstallCover { src: PathBuf, dst: PathBuf },
}

/// An [`ApplyAction`] tagged with the field it belongs to, so the executor
/// can commit whole field groups as they complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyCommand {
    pub field: FieldId,
    pub action: ApplyAction,
}

impl EditSession {
    fn track_path(&self, dir: &str, file: &str) -> PathBuf {
        if dir.is_empty() {
            self.music_dir.join(file)
        } else {
            self.music_dir.join(dir).join(file)
        }
    }

    fn album_tag_commands(&self, field: AlbumField, out: &mut Vec<ApplyCommand>) {
        let tag = match field {
            AlbumField::Album => TagField::Album,
            AlbumField::Artist => TagField::Artist,
            AlbumField::Date => TagField::Date,
            _ => return,
        };
        let id = FieldId::album(field);
        for (i, track) in self.tracks.iter().enumerate() {
            out.push(ApplyCommand {
                field: id,
                action: ApplyAction::WriteTags {
                    path: self.track_path(&track.dir, &track.original.filename),
                    patch: vec![(tag, self.album_tag_value(field, i).to_string())],
                },
            });
        }
    }

    /// Cover install or rename, relative to `dir` (the album directory as it
    /// will exist when the command runs). Art stripping is handled by the
    /// callers since the two builders disagree on track directories.
    fn cover_commands(&self, dir: &str, out: &mut Vec<ApplyCommand>) {
        let id = FieldId::album(AlbumField::Cover);
        if let Some(pending) = &self.pending_cover {
            out.push(ApplyCommand {
                field: id,
                action: ApplyAction::InstallCover {
                    src: pending.clone(),
                    dst: self.track_path(dir, &self.album.cover),
                },
            });
        } else if self.album.cover != self.original.cover {
            // Renaming only makes sense when a cover file exists on disk.
            if let Some(existing) = &self.cover_file {
                out.push(ApplyCommand {
                    field: id,
                    action: ApplyAction::Rename {
                        src: self.track_path(dir, existing),
                        dst: self.track_path(dir, &self.album.cover),
                    },
                });
            }
        }
    }

    /// Commands for applying a single field, against the current on-disk
    /// layout. Returns an empty list when the field is unmodified.
    pub fn build_field_commands(&self, field: FieldId) -> Vec<ApplyCommand> {
        let mut out = Vec::new();
        if !self.is_modified(field) {
            return out;
        }
        match field.kind() {
            FieldKind::Album(
                f @ (AlbumField::Album | AlbumField::Artist | AlbumField::Date),
            ) => self.album_tag_commands(f, &mut out),
            FieldKind::Album(AlbumField::Directory) => out.push(ApplyCommand {
                field,
                action: ApplyAction::Rename {
                    src: self.music_dir.join(&self.original.directory),
                    dst: self.music_dir.join(&self.album.directory),
                },
            }),
            FieldKind::Album(AlbumField::Cover) => {
                self.cover_commands(&self.original.directory, &mut out);
                if self.strip_embedded_art {
                    for track in &self.tracks {
                        out.push(ApplyCommand {
                            field,
                            action: ApplyAction::StripArt {
                                path: self.track_path(&track.dir, &track.original.filename),
                            },
                        });
                    }
                }
            }
            FieldKind::Track { track, field: tf } => {
                let Some(t) = self.tracks.get(track) else {
                    return out;
                };
                let path = self.track_path(&t.dir, &t.original.filename);
                let action = match tf {
                    TrackField::Number => ApplyAction::WriteTags {
                        path,
                        patch: vec![(TagField::TrackNumber, t.current.number.clone())],
                    },
                    TrackField::Title => ApplyAction::WriteTags {
                        path,
                        patch: vec![(TagField::Title, t.current.title.clone())],
                    },
                    TrackField::Filename => ApplyAction::Rename {
                        src: path,
                        dst: self.track_path(&t.dir, &t.current.filename),
                    },
                };
                out.push(ApplyCommand { field, action });
            }
        }
        out
    }

    /// Commands for applying every modified field in one pass.
    ///
    /// Order matters: tag writes for album-level fields go first against the
    /// original paths, then the directory rename, then cover work and the
    /// per-track fields against the directories as they exist after the
    /// rename. Tracks whose directory was something other than the renamed
    /// album directory keep their own paths.
    pub fn build_all_commands<'a>(&'a self) -> Vec<ApplyCommand> {
        let mut out = Vec::new();

        for f in [AlbumField::Album, AlbumField::Artist, AlbumField::Date] {
            if self.is_modified(FieldId::album(f)) {
                self.album_tag_commands(f, &mut out);
            }
        }

        let dir_renamed = self.is_modified(FieldId::album(AlbumField::Directory));
        if dir_renamed {
            out.push(ApplyCommand {
                field: FieldId::album(AlbumField::Directory),
                action: ApplyAction::Rename {
                    src: self.music_dir.join(&self.original.directory),
                    dst: self.music_dir.join(&self.album.directory),
                },
            });
        }
        let effective_dir = |track_dir: &'a String| {
            if dir_renamed && *track_dir == self.original.directory {
                &self.album.directory
            } else {
                track_dir
            }
        };

        if self.is_modified(FieldId::album(AlbumField::Cover)) {
            let album_dir = if dir_renamed {
                self.album.directory.as_str()
            } else {
                self.original.directory.as_str()
            };
            self.cover_commands(album_dir, &mut out);
            if self.strip_embedded_art {
                for track in &self.tracks {
                    out.push(ApplyCommand {
                        field: FieldId::album(AlbumField::Cover),
                        action: ApplyAction::StripArt {
                            path: self
                                .track_path(effective_dir(&track.dir), &track.original.filename),
                        },
                    });
                }
            }
        }

        for (i, track) in self.tracks.iter().enumerate() {
            let dir = effective_dir(&track.dir);
            if self.is_modified(FieldId::track(i, TrackField::Number)) {
                out.push(ApplyCommand {
                    field: FieldId::track(i, TrackField::Number),
                    action: ApplyAction::WriteTags {
                        path: self.track_path(dir, &track.original.filename),
                        patch: vec![(TagField::TrackNumber, track.current.number.clone())],
                    },
                });
            }
            if self.is_modified(FieldId::track(i, TrackField::Title)) {
                out.push(ApplyCommand {
                    field: FieldId::track(i, TrackField::Title),
                    action: ApplyAction::WriteTags {
                        path: self.track_path(dir, &track.original.filename),
                        patch: vec![(TagField::Title, track.current.title.clone())],
                    },
                });
            }
            if self.is_modified(FieldId::track(i, TrackField::Filename)) {
                out.push(ApplyCommand {
                    field: FieldId::track(i, TrackField::Filename),
                    action: ApplyAction::Rename {
                        src: self.track_path(dir, &track.original.filename),
                        dst: self.track_path(dir, &track.current.filename),
                    },
                });
            }
        }

        out
    }
}
