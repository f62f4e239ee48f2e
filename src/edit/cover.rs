use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Upper bound on how much of an ID3 tag gets scanned for artwork frames.
const ID3_SCAN_LIMIT: u64 = 256 * 1024;

/// Look for a cover image in `dir`: the first candidate name that matches a
/// directory entry, compared case-insensitively. Returns the entry's actual
/// name. Unreadable directories report no cover.
pub fn detect_cover_file(dir: &Path, candidates: &[String]) -> Option<String> {
    let entries = fs::read_dir(dir).ok()?;
    let mut names = Vec::new();
    for entry in entries.flatten() {
        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }
    for candidate in candidates {
        let wanted = candidate.to_lowercase();
        if let Some(name) = names.iter().find(|n| n.to_lowercase() == wanted) {
            return Some(name.clone());
        }
    }
    None
}

/// Whether a FLAC or MP3 file carries embedded artwork. Unsupported formats
/// and any read error report `false`.
pub fn detect_embedded_art(path: &Path) -> bool {
    detect(path).unwrap_or(false)
}

fn detect(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic)?;
    if &magic == b"fLaC" {
        flac_has_picture(&mut file)
    } else if &magic[..3] == b"ID3" {
        id3_has_picture(&mut file, magic[3])
    } else {
        Ok(false)
    }
}

/// Walk the FLAC metadata blocks looking for a PICTURE block (type 6).
fn flac_has_picture(file: &mut File) -> io::Result<bool> {
    loop {
        let mut header = [0u8; 4];
        file.read_exact(&mut header)?;
        let last = header[0] & 0x80 != 0;
        let block_type = header[0] & 0x7F;
        if block_type == 6 {
            return Ok(true);
        }
        if last {
            return Ok(false);
        }
        let length =
            (u64::from(header[1]) << 16) | (u64::from(header[2]) << 8) | u64::from(header[3]);
        file.seek(SeekFrom::Current(length as i64))?;
    }
}

fn synchsafe(bytes: &[u8; 4]) -> u64 {
    (u64::from(bytes[0]) << 21)
        | (u64::from(bytes[1]) << 14)
        | (u64::from(bytes[2]) << 7)
        | u64::from(bytes[3])
}

/// Walk ID3v2 frames looking for an artwork frame (`PIC` in v2.2, `APIC`
/// from v2.3 on). Reads at most [`ID3_SCAN_LIMIT`] bytes of tag data.
fn id3_has_picture(file: &mut File, version: u8) -> io::Result<bool> {
    // "ID3" and the version major were already consumed.
    let mut rest = [0u8; 6];
    file.read_exact(&mut rest)?;
    let tag_size = synchsafe(&[rest[2], rest[3], rest[4], rest[5]]);

    let mut buf = Vec::new();
    file.take(tag_size.min(ID3_SCAN_LIMIT)).read_to_end(&mut buf)?;

    let (id_len, header_len) = if version == 2 { (3, 6) } else { (4, 10) };
    let mut pos = 0usize;
    while pos + header_len <= buf.len() {
        let frame = &buf[pos..pos + header_len];
        // Padding starts with a zero byte.
        if frame[0] == 0 {
            break;
        }
        let id = &frame[..id_len];
        if id == b"APIC" || id == b"PIC" {
            return Ok(true);
        }
        let size = match version {
            2 => (u64::from(frame[3]) << 16) | (u64::from(frame[4]) << 8) | u64::from(frame[5]),
            4 => synchsafe(&[frame[4], frame[5], frame[6], frame[7]]),
            _ => u64::from(u32::from_be_bytes([frame[4], frame[5], frame[6], frame[7]])),
        };
        if size == 0 {
            break;
        }
        pos = match pos.checked_add(header_len + size as usize) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(false)
}
