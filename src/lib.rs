//! maestro: album metadata editing and integrity checking for music libraries.
//!
//! The crate is built around two independent cores:
//!
//! * [`integrity`] — byte-level verification of audio file headers. Formats
//!   are detected from magic bytes (never from the extension), each format's
//!   structural invariants are checked, and a detected/extension mismatch is
//!   reported as its own error.
//! * [`edit`] — an album edit session holding current/original values per
//!   field, a diff over them, and an apply pipeline that turns the diff into
//!   an ordered command queue executed one step at a time (tag writes, file
//!   and directory renames, artwork stripping, cover installation).
//!
//! Playback, interactive rendering and cover downloads live in the consuming
//! application; this crate only takes the seams they plug into ([`tags`] for
//! tag writing, [`library`] for snapshot reloads).

pub mod config;
pub mod edit;
pub mod integrity;
pub mod library;
pub mod tags;
