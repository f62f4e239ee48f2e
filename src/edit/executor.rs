use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use crate::tags::{TagError, TagWriter};

use super::apply::{ApplyAction, ApplyCommand};
use super::fsops;
use super::state::{EditSession, FieldId};

#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("writing tags to {}: {source}", .path.display())]
    TagWrite { path: PathBuf, source: TagError },
    #[error("stripping artwork from {}: {source}", .path.display())]
    StripArt { path: PathBuf, source: TagError },
    #[error("renaming {} to {}: {source}", .src.display(), .dst.display())]
    Rename {
        src: PathBuf,
        dst: PathBuf,
        source: std::io::Error,
    },
    #[error("installing cover {}: {source}", .dst.display())]
    InstallCover {
        dst: PathBuf,
        source: std::io::Error,
    },
    #[error("apply worker exited unexpectedly")]
    WorkerGone,
}

/// Outcome of feeding one command result into [`ApplyExecutor::advance`].
#[derive(Debug)]
pub enum ApplyProgress {
    /// The next command was dispatched.
    Advanced { next: FieldId },
    /// Every command completed and the last field was committed.
    Finished,
    /// A command failed; the remaining queue was discarded.
    Failed(ApplyError),
}

fn run_action(writer: &dyn TagWriter, action: &ApplyAction) -> Result<(), ApplyError> {
    match action {
        ApplyAction::WriteTags { path, patch } => writer
            .write_tags(path, patch)
            .map_err(|source| ApplyError::TagWrite {
                path: path.clone(),
                source,
            }),
        ApplyAction::StripArt { path } => {
            writer
                .strip_pictures(path)
                .map_err(|source| ApplyError::StripArt {
                    path: path.clone(),
                    source,
                })
        }
        ApplyAction::Rename { src, dst } => {
            fsops::rename_or_merge(src, dst).map_err(|source| ApplyError::Rename {
                src: src.clone(),
                dst: dst.clone(),
                source,
            })
        }
        ApplyAction::InstallCover { src, dst } => {
            fsops::copy_file(src, dst).map_err(|source| ApplyError::InstallCover {
                dst: dst.clone(),
                source,
            })
        }
    }
}

/// Runs a queue of apply commands on a worker thread, one command in flight
/// at a time.
///
/// As command results come back, [`advance`](Self::advance) moves a cursor
/// through the queue and commits each field group into the session once the
/// last command of the group succeeds. The first failure discards the rest
/// of the queue; fields already committed stay committed, everything after
/// the failure keeps its pending edits.
pub struct ApplyExecutor {
    queue: Vec<ApplyCommand>,
    cursor: usize,
    tx: Option<Sender<ApplyCommand>>,
    rx: Receiver<Result<(), ApplyError>>,
    worker: Option<JoinHandle<()>>,
}

impl ApplyExecutor {
    /// Spawn the worker and dispatch the first command. Returns `None` for
    /// an empty queue.
    pub fn start(queue: Vec<ApplyCommand>, writer: Box<dyn TagWriter>) -> Option<Self> {
        if queue.is_empty() {
            return None;
        }
        let (cmd_tx, cmd_rx) = mpsc::channel::<ApplyCommand>();
        let (result_tx, result_rx) = mpsc::channel();
        let worker = thread::spawn(move || {
            while let Ok(cmd) = cmd_rx.recv() {
                let outcome = run_action(writer.as_ref(), &cmd.action);
                if result_tx.send(outcome).is_err() {
                    break;
                }
            }
        });
        tracing::debug!(commands = queue.len(), "starting apply");
        let mut executor = Self {
            queue,
            cursor: 0,
            tx: Some(cmd_tx),
            rx: result_rx,
            worker: Some(worker),
        };
        // A send failure here surfaces as WorkerGone on the first recv.
        executor.dispatch(0).ok();
        Some(executor)
    }

    fn dispatch(&self, index: usize) -> Result<(), ApplyError> {
        let cmd = self.queue[index].clone();
        tracing::debug!(
            index,
            field = cmd.field.index(),
            label = cmd.field.label(),
            "dispatching apply command"
        );
        match &self.tx {
            Some(tx) => tx.send(cmd).map_err(|_| ApplyError::WorkerGone),
            None => Err(ApplyError::WorkerGone),
        }
    }

    /// Block until the in-flight command reports its outcome.
    pub fn recv(&self) -> Result<(), ApplyError> {
        self.rx.recv().unwrap_or(Err(ApplyError::WorkerGone))
    }

    /// Poll for the in-flight command's outcome without blocking.
    pub fn try_recv(&self) -> Option<Result<(), ApplyError>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(ApplyError::WorkerGone)),
        }
    }

    /// Consume one command outcome: commit the field group when it closed,
    /// dispatch the next command, or stop on failure or exhaustion.
    pub fn advance(
        &mut self,
        outcome: Result<(), ApplyError>,
        session: &mut EditSession,
    ) -> ApplyProgress {
        if let Err(err) = outcome {
            self.tx = None;
            return ApplyProgress::Failed(err);
        }
        let done = self.queue[self.cursor].field;
        let next = self.cursor + 1;
        if next >= self.queue.len() {
            session.commit_applied(done);
            self.tx = None;
            return ApplyProgress::Finished;
        }
        let next_field = self.queue[next].field;
        if next_field != done {
            session.commit_applied(done);
        }
        self.cursor = next;
        match self.dispatch(next) {
            Ok(()) => ApplyProgress::Advanced { next: next_field },
            Err(err) => ApplyProgress::Failed(err),
        }
    }

    /// Run the whole queue to completion, blocking between commands.
    pub fn drive(mut self, session: &mut EditSession) -> Result<(), ApplyError> {
        loop {
            let outcome = self.recv();
            match self.advance(outcome, session) {
                ApplyProgress::Advanced { .. } => {}
                ApplyProgress::Finished => return Ok(()),
                ApplyProgress::Failed(err) => return Err(err),
            }
        }
    }
}

impl Drop for ApplyExecutor {
    fn drop(&mut self) {
        // Closing the command channel lets the worker's recv loop end.
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::edit::state::{AlbumField, AlbumFields, TrackEdit, TrackField, TrackFields};
    use crate::library::{Library, LibrarySource};
    use crate::tags::TagPatch;

    struct ScriptedWriter {
        fail_on: Option<&'static str>,
        written: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl TagWriter for ScriptedWriter {
        fn write_tags(&self, path: &Path, _patch: &TagPatch) -> Result<(), TagError> {
            if let Some(fragment) = self.fail_on {
                if path.to_string_lossy().contains(fragment) {
                    return Err(TagError::Io("scripted failure".to_string()));
                }
            }
            self.written.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }

        fn strip_pictures(&self, _path: &Path) -> Result<(), TagError> {
            Ok(())
        }
    }

    fn session(tracks: usize) -> EditSession {
        let fields = AlbumFields {
            album: "Album".to_string(),
            artist: "Artist".to_string(),
            date: "2020".to_string(),
            directory: "Artist - Album".to_string(),
            cover: "cover.jpg".to_string(),
        };
        EditSession {
            music_dir: PathBuf::from("/music"),
            album: fields.clone(),
            original: fields,
            tracks: (0..tracks)
                .map(|i| {
                    let f = TrackFields {
                        number: (i + 1).to_string(),
                        title: format!("Track {}", i + 1),
                        filename: format!("{:02} - Track {}.flac", i + 1, i + 1),
                    };
                    TrackEdit {
                        current: f.clone(),
                        original: f,
                        dir: "Artist - Album".to_string(),
                        ..TrackEdit::default()
                    }
                })
                .collect(),
            ..EditSession::default()
        }
    }

    #[test]
    fn empty_queue_never_starts() {
        let writer = Box::new(ScriptedWriter {
            fail_on: None,
            written: Arc::default(),
        });
        assert!(ApplyExecutor::start(Vec::new(), writer).is_none());
    }

    #[test]
    fn drive_commits_every_field_on_success() {
        let mut s = session(2);
        s.album.artist = "New Artist".to_string();
        s.tracks[0].current.title = "Renamed".to_string();

        let written = Arc::new(Mutex::new(Vec::new()));
        let writer = Box::new(ScriptedWriter {
            fail_on: None,
            written: written.clone(),
        });
        let executor = ApplyExecutor::start(s.build_all_commands(), writer).unwrap();
        executor.drive(&mut s).unwrap();

        assert!(!s.any_modified());
        assert_eq!(written.lock().unwrap().len(), 3);
    }

    #[test]
    fn failure_keeps_completed_fields_and_discards_the_rest() {
        let mut s = session(2);
        s.album.artist = "New Artist".to_string();
        s.tracks[0].current.title = "Renamed".to_string();

        // Artist writes both tracks first; the title write fails.
        let writer = Box::new(ScriptedWriter {
            fail_on: Some("Renamed"),
            written: Arc::default(),
        });
        let queue = {
            let mut q = s.build_field_commands(FieldId::album(AlbumField::Artist));
            q.extend(s.build_field_commands(FieldId::track(0, TrackField::Title)));
            q
        };
        let err = ApplyExecutor::start(queue, writer)
            .unwrap()
            .drive(&mut s)
            .unwrap_err();
        assert!(matches!(err, ApplyError::TagWrite { .. }));

        assert!(!s.is_modified(FieldId::album(AlbumField::Artist)));
        assert!(s.is_modified(FieldId::track(0, TrackField::Title)));
    }

    #[test]
    fn failure_never_commits_a_half_applied_field_group() {
        let mut s = session(2);
        s.album.artist = "New Artist".to_string();

        // Fails on the second track of the artist group.
        let writer = Box::new(ScriptedWriter {
            fail_on: Some("02 - Track 2"),
            written: Arc::default(),
        });
        let queue = s.build_field_commands(FieldId::album(AlbumField::Artist));
        ApplyExecutor::start(queue, writer)
            .unwrap()
            .drive(&mut s)
            .unwrap_err();

        assert!(s.is_modified(FieldId::album(AlbumField::Artist)));
    }

    struct StubSource(Library);

    impl LibrarySource for StubSource {
        fn load(&self) -> Result<Library, std::io::Error> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn run_apply_with_no_commands_skips_the_reload() {
        let mut s = session(1);
        let writer = Box::new(ScriptedWriter {
            fail_on: None,
            written: Arc::default(),
        });
        let source = StubSource(Library::default());
        let reloaded = crate::edit::run_apply(&mut s, Vec::new(), writer, &source).unwrap();
        assert!(reloaded.is_none());
    }

    #[test]
    fn run_apply_reloads_after_success() {
        let mut s = session(1);
        s.album.date = "2021".to_string();

        let writer = Box::new(ScriptedWriter {
            fail_on: None,
            written: Arc::default(),
        });
        let source = StubSource(Library::default());
        let commands = s.build_all_commands();
        let reloaded = crate::edit::run_apply(&mut s, commands, writer, &source).unwrap();
        assert!(reloaded.is_some());
        assert!(!s.any_modified());
    }
}
