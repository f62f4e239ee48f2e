//! Album edit sessions and the apply pipeline.
//!
//! An [`EditSession`] pairs every editable field with its original value:
//! five album-level fields (album, artist, date, directory, cover name) and
//! three per track (number, title, filename), each addressed by a stable
//! [`FieldId`]. The diff ([`EditSession::is_modified`]) feeds the command
//! builders, which turn edits into an ordered [`ApplyCommand`] queue; the
//! [`ApplyExecutor`] runs that queue one command at a time, committing
//! current values into original slots as each field group completes.
//!
//! A failed step aborts the rest of the queue but never rolls back finished
//! steps: already-committed fields read as unmodified, the failed and
//! pending ones stay modified, and the user re-applies once the cause is
//! fixed.

mod apply;
mod cover;
mod diff;
mod executor;
mod fsops;
mod state;

pub use apply::{ApplyAction, ApplyCommand};
pub use cover::{detect_cover_file, detect_embedded_art};
pub use executor::{ApplyError, ApplyExecutor, ApplyProgress};
pub use fsops::{copy_file, rename_or_merge};
pub use state::{
    AlbumField, AlbumFields, EditSession, FieldId, FieldKind, TrackEdit, TrackField, TrackFields,
};

use crate::library::{Library, LibrarySource};
use crate::tags::TagWriter;

/// Run a command queue to completion and reload the library.
///
/// Returns `Ok(None)` when there was nothing to do (empty queue) or when the
/// post-apply reload failed; in the latter case the session state is already
/// committed and the caller keeps its previous snapshot.
pub fn run_apply(
    session: &mut EditSession,
    commands: Vec<ApplyCommand>,
    writer: Box<dyn TagWriter>,
    source: &dyn LibrarySource,
) -> Result<Option<Library>, ApplyError> {
    let Some(executor) = ApplyExecutor::start(commands, writer) else {
        return Ok(None);
    };
    executor.drive(session)?;

    match source.load() {
        Ok(library) => Ok(Some(library)),
        Err(err) => {
            tracing::warn!("library reload after apply failed: {err}");
            Ok(None)
        }
    }
}
