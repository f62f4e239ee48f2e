use std::fmt;
use std::path::Path;

/// Container format derived purely from magic bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DetectedFormat {
    Flac,
    Mp3,
    Ogg,
    M4a,
    Wav,
}

impl fmt::Display for DetectedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DetectedFormat::Flac => "flac",
            DetectedFormat::Mp3 => "mp3",
            DetectedFormat::Ogg => "ogg",
            DetectedFormat::M4a => "m4a",
            DetectedFormat::Wav => "wav",
        };
        f.write_str(name)
    }
}

/// A matched magic-byte signature. Finer-grained than [`DetectedFormat`]
/// because MP3 files open with either an ID3v2 tag or a raw frame, and the
/// two need different validators.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(super) enum Signature {
    Flac,
    Ogg,
    Id3,
    Mp3Frame,
    M4a,
    Wav,
}

impl Signature {
    /// Match the prefix against known signatures, in fixed priority order.
    /// Needs at least 12 bytes; anything shorter matches nothing.
    pub(super) fn sniff(buf: &[u8]) -> Option<Self> {
        if buf.len() < 12 {
            return None;
        }

        if buf.starts_with(b"fLaC") {
            return Some(Signature::Flac);
        }
        if buf.starts_with(b"OggS") {
            return Some(Signature::Ogg);
        }
        if buf.starts_with(b"ID3") {
            return Some(Signature::Id3);
        }
        // Raw MPEG frame: 11-bit sync word (FF Ex / FF Fx).
        if buf[0] == 0xFF && buf[1] & 0xE0 == 0xE0 {
            return Some(Signature::Mp3Frame);
        }
        if &buf[4..8] == b"ftyp" {
            return Some(Signature::M4a);
        }
        if buf.starts_with(b"RIFF") && &buf[8..12] == b"WAVE" {
            return Some(Signature::Wav);
        }

        None
    }

    pub(super) fn format(self) -> DetectedFormat {
        match self {
            Signature::Flac => DetectedFormat::Flac,
            Signature::Ogg => DetectedFormat::Ogg,
            Signature::Id3 | Signature::Mp3Frame => DetectedFormat::Mp3,
            Signature::M4a => DetectedFormat::M4a,
            Signature::Wav => DetectedFormat::Wav,
        }
    }
}

/// Map a file extension (case-insensitive) to the format it promises.
/// Unknown extensions return `None` and are not checked for consistency.
pub fn expected_format(path: &Path) -> Option<DetectedFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "flac" => Some(DetectedFormat::Flac),
        "mp3" => Some(DetectedFormat::Mp3),
        "ogg" | "opus" => Some(DetectedFormat::Ogg),
        "m4a" | "m4b" | "mp4" | "aac" => Some(DetectedFormat::M4a),
        "wav" | "wave" => Some(DetectedFormat::Wav),
        _ => None,
    }
}
