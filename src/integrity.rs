//! Library integrity checking: format detection and header validation.
//!
//! [`check_file`] classifies a file from its leading bytes (the extension is
//! never trusted), runs the structural checks for the detected container and
//! finally compares the detected format against the extension. Checks are
//! bounded reads: a small fixed prefix is enough for every validator.
//!
//! Failures are informational. Callers flag the track and move on; nothing
//! here repairs or retries.

mod format;
mod validators;

use std::fs::File;
use std::io::Read;
use std::path::Path;

pub use format::DetectedFormat;
use format::Signature;
pub use format::expected_format;
pub use validators::FormatViolation;

/// Bytes read from the head of the file. Every validator works within this.
const PREFIX_LEN: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum IntegrityError {
    #[error("cannot stat: {0}")]
    Stat(#[source] std::io::Error),
    #[error("zero-byte file")]
    ZeroByte,
    #[error("cannot open: {0}")]
    Open(#[source] std::io::Error),
    #[error("cannot read: {0}")]
    Read(#[source] std::io::Error),
    #[error("unrecognized audio format")]
    Unrecognized,
    #[error("extension {extension} but content is {detected}")]
    ExtensionMismatch {
        extension: String,
        detected: DetectedFormat,
    },
    #[error(transparent)]
    Format(#[from] FormatViolation),
}

/// Validate the file at `path`: detect its container from magic bytes, check
/// the container's structural invariants, then check extension consistency.
///
/// Returns the first failure encountered, or `Ok(())` for a sound file.
pub fn check_file(path: &Path) -> Result<(), IntegrityError> {
    let meta = std::fs::metadata(path).map_err(IntegrityError::Stat)?;
    if meta.len() == 0 {
        return Err(IntegrityError::ZeroByte);
    }

    let mut file = File::open(path).map_err(IntegrityError::Open)?;
    let mut buf = [0u8; PREFIX_LEN];
    let n = file.read(&mut buf).map_err(IntegrityError::Read)?;
    let buf = &buf[..n];

    let signature = Signature::sniff(buf).ok_or(IntegrityError::Unrecognized)?;

    match signature {
        Signature::Flac => validators::check_flac(buf)?,
        Signature::Id3 => validators::check_id3(buf, meta.len())?,
        Signature::Mp3Frame => validators::check_mp3_frame(buf)?,
        Signature::Ogg => validators::check_ogg(buf)?,
        Signature::M4a => validators::check_m4a(buf, meta.len())?,
        Signature::Wav => validators::check_wav(buf, meta.len())?,
    }

    let detected = signature.format();
    if let Some(expected) = expected_format(path) {
        if expected != detected {
            let extension = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| format!(".{}", e.to_ascii_lowercase()))
                .unwrap_or_default();
            return Err(IntegrityError::ExtensionMismatch {
                extension,
                detected,
            });
        }
    }

    Ok(())
}
