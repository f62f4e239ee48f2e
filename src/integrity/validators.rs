//! Per-format structural validators.
//!
//! Each check inspects a bounded prefix of the file and fails with the one
//! [`FormatViolation`] naming the first broken invariant. Offsets below are
//! absolute positions in the file prefix.

/// A named structural invariant violation. The `Display` text states the
/// observed and expected values so failures are diagnosable without
/// re-inspecting the file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatViolation {
    // FLAC
    #[error("flac header truncated")]
    FlacTruncated,
    #[error("flac first block is {0}, expected STREAMINFO (0)")]
    FlacFirstBlockNotStreamInfo(u8),
    #[error("flac STREAMINFO length {0}, expected 34")]
    FlacStreamInfoLength(u32),
    #[error("flac min block size {0} < 16")]
    FlacMinBlockSize(u16),
    #[error("flac max block size {max} < min {min}")]
    FlacMaxBlockSize { max: u16, min: u16 },
    #[error("flac sample rate is 0")]
    FlacZeroSampleRate,

    // MP3 with ID3v2 tag
    #[error("mp3 ID3 header truncated")]
    Id3Truncated,
    #[error("mp3 ID3v2.{0} unsupported")]
    Id3UnsupportedVersion(u8),
    #[error("mp3 ID3 size byte {index} invalid: 0x{value:02X}")]
    Id3SizeByteNotSynchsafe { index: usize, value: u8 },
    #[error("mp3 ID3 tag size {tag_size} >= file size {file_size} (no audio data)")]
    Id3TagConsumesFile { tag_size: u64, file_size: u64 },

    // MP3 raw frame
    #[error("mp3 frame header truncated")]
    Mp3FrameTruncated,
    #[error("mp3 reserved MPEG version")]
    Mp3ReservedVersion,
    #[error("mp3 reserved layer")]
    Mp3ReservedLayer,
    #[error("mp3 invalid bitrate index")]
    Mp3InvalidBitrate,
    #[error("mp3 reserved sample rate")]
    Mp3ReservedSampleRate,

    // Ogg container
    #[error("ogg page header truncated")]
    OggTruncated,
    #[error("ogg stream version {0}, expected 0")]
    OggStreamVersion(u8),
    #[error("ogg first page missing BOS flag")]
    OggMissingBos,
    #[error("ogg segment table truncated")]
    OggSegmentTableTruncated,
    #[error("ogg payload is neither Vorbis nor Opus")]
    OggUnknownCodec,

    // Vorbis identification header
    #[error("vorbis identification header truncated")]
    VorbisTruncated,
    #[error("vorbis version {0}, expected 0")]
    VorbisVersion(u32),
    #[error("vorbis channel count is 0")]
    VorbisZeroChannels,
    #[error("vorbis sample rate is 0")]
    VorbisZeroSampleRate,

    // Opus identification header
    #[error("opus header truncated")]
    OpusTruncated,
    #[error("opus major version {0}, expected 0")]
    OpusMajorVersion(u8),
    #[error("opus channel count is 0")]
    OpusZeroChannels,

    // M4A/AAC
    #[error("m4a ftyp box truncated")]
    M4aTruncated,
    #[error("m4a ftyp box size {0} < 16")]
    M4aBoxTooSmall(u64),
    #[error("m4a ftyp box size {size} > file size {file_size}")]
    M4aBoxExceedsFile { size: u64, file_size: u64 },
    #[error("m4a major brand contains non-ASCII byte 0x{0:02X}")]
    M4aBrandNotAscii(u8),
    #[error("m4a second box type contains non-ASCII byte 0x{0:02X}")]
    M4aSecondBoxNotAscii(u8),

    // WAV
    #[error("wav header truncated")]
    WavTruncated,
    #[error("wav RIFF size {riff_size} > file size {file_size}")]
    WavRiffSizeExceedsFile { riff_size: u64, file_size: u64 },
    #[error("wav missing fmt chunk at expected offset")]
    WavMissingFmtChunk,
    #[error("wav unknown audio format {0}")]
    WavUnknownAudioFormat(u16),
    #[error("wav channel count {0} out of range 1-8")]
    WavChannelCount(u16),
    #[error("wav sample rate {0} out of range 8000-384000")]
    WavSampleRate(u32),
    #[error("wav bits per sample {0} not 8/16/24/32")]
    WavBitsPerSample(u16),
}

/// FLAC: "fLaC" followed by a STREAMINFO block (type 0, length 34, sane fields).
pub(super) fn check_flac(buf: &[u8]) -> Result<(), FormatViolation> {
    if buf.len() < 42 {
        return Err(FormatViolation::FlacTruncated);
    }

    let block_type = buf[4] & 0x7F;
    if block_type != 0 {
        return Err(FormatViolation::FlacFirstBlockNotStreamInfo(block_type));
    }

    let block_len = u32::from(buf[5]) << 16 | u32::from(buf[6]) << 8 | u32::from(buf[7]);
    if block_len != 34 {
        return Err(FormatViolation::FlacStreamInfoLength(block_len));
    }

    let min_block = u16::from_be_bytes([buf[8], buf[9]]);
    let max_block = u16::from_be_bytes([buf[10], buf[11]]);
    if min_block < 16 {
        return Err(FormatViolation::FlacMinBlockSize(min_block));
    }
    if max_block < min_block {
        return Err(FormatViolation::FlacMaxBlockSize {
            max: max_block,
            min: min_block,
        });
    }

    // Sample rate: 20 bits packed into bytes 18-20.
    let sample_rate =
        u32::from(buf[18]) << 12 | u32::from(buf[19]) << 4 | u32::from(buf[20]) >> 4;
    if sample_rate == 0 {
        return Err(FormatViolation::FlacZeroSampleRate);
    }

    Ok(())
}

/// MP3 opening with an ID3v2 tag: validate the tag header and make sure
/// audio data remains after the declared tag.
pub(super) fn check_id3(buf: &[u8], file_size: u64) -> Result<(), FormatViolation> {
    if buf.len() < 10 {
        return Err(FormatViolation::Id3Truncated);
    }

    let version = buf[3];
    if !matches!(version, 2 | 3 | 4) {
        return Err(FormatViolation::Id3UnsupportedVersion(version));
    }

    // Size bytes must be synchsafe (high bit clear).
    for i in 6..10 {
        if buf[i] >= 0x80 {
            return Err(FormatViolation::Id3SizeByteNotSynchsafe {
                index: i - 6,
                value: buf[i],
            });
        }
    }

    let tag_size = u64::from(buf[6]) << 21
        | u64::from(buf[7]) << 14
        | u64::from(buf[8]) << 7
        | u64::from(buf[9]);
    let tag_size = tag_size + 10; // header included
    if tag_size >= file_size {
        return Err(FormatViolation::Id3TagConsumesFile {
            tag_size,
            file_size,
        });
    }

    Ok(())
}

/// MP3 opening with a raw MPEG frame: validate the sync word fields.
pub(super) fn check_mp3_frame(buf: &[u8]) -> Result<(), FormatViolation> {
    if buf.len() < 4 {
        return Err(FormatViolation::Mp3FrameTruncated);
    }

    // Version: bits 4-3 of byte 1; 1 is reserved.
    if (buf[1] >> 3) & 0x03 == 1 {
        return Err(FormatViolation::Mp3ReservedVersion);
    }

    // Layer: bits 2-1 of byte 1; 0 is reserved.
    if (buf[1] >> 1) & 0x03 == 0 {
        return Err(FormatViolation::Mp3ReservedLayer);
    }

    // Bitrate index: upper nibble of byte 2; 0xF is reserved.
    if buf[2] >> 4 == 0x0F {
        return Err(FormatViolation::Mp3InvalidBitrate);
    }

    // Sample rate index: bits 3-2 of byte 2; 3 is reserved.
    if (buf[2] >> 2) & 0x03 == 0x03 {
        return Err(FormatViolation::Mp3ReservedSampleRate);
    }

    Ok(())
}

/// Ogg container: validate the first page header, then route to the Vorbis
/// or Opus identification check depending on the payload signature.
pub(super) fn check_ogg(buf: &[u8]) -> Result<(), FormatViolation> {
    if buf.len() < 28 {
        return Err(FormatViolation::OggTruncated);
    }

    if buf[4] != 0x00 {
        return Err(FormatViolation::OggStreamVersion(buf[4]));
    }

    if buf[5] & 0x02 == 0 {
        return Err(FormatViolation::OggMissingBos);
    }

    let num_segments = usize::from(buf[26]);
    let seg_table_end = 27 + num_segments;
    if buf.len() < seg_table_end {
        return Err(FormatViolation::OggSegmentTableTruncated);
    }

    let payload = &buf[seg_table_end..];

    if payload.len() >= 7 && payload[0] == 0x01 && &payload[1..7] == b"vorbis" {
        return check_vorbis(&payload[7..]);
    }

    if payload.len() >= 8 && &payload[..8] == b"OpusHead" {
        return check_opus(&payload[8..]);
    }

    Err(FormatViolation::OggUnknownCodec)
}

fn check_vorbis(buf: &[u8]) -> Result<(), FormatViolation> {
    // version(4) + channels(1) + sample_rate(4)
    if buf.len() < 9 {
        return Err(FormatViolation::VorbisTruncated);
    }

    let version = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if version != 0 {
        return Err(FormatViolation::VorbisVersion(version));
    }

    if buf[4] == 0 {
        return Err(FormatViolation::VorbisZeroChannels);
    }

    let sample_rate = u32::from_le_bytes([buf[5], buf[6], buf[7], buf[8]]);
    if sample_rate == 0 {
        return Err(FormatViolation::VorbisZeroSampleRate);
    }

    Ok(())
}

fn check_opus(buf: &[u8]) -> Result<(), FormatViolation> {
    // version(1) + channels(1)
    if buf.len() < 2 {
        return Err(FormatViolation::OpusTruncated);
    }

    if buf[0] >> 4 != 0 {
        return Err(FormatViolation::OpusMajorVersion(buf[0] >> 4));
    }

    if buf[1] == 0 {
        return Err(FormatViolation::OpusZeroChannels);
    }

    Ok(())
}

/// M4A/AAC: validate the leading `ftyp` box structure.
pub(super) fn check_m4a(buf: &[u8], file_size: u64) -> Result<(), FormatViolation> {
    if buf.len() < 12 {
        return Err(FormatViolation::M4aTruncated);
    }

    let box_size = u64::from(u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]));
    if box_size < 16 {
        return Err(FormatViolation::M4aBoxTooSmall(box_size));
    }
    if box_size > file_size {
        return Err(FormatViolation::M4aBoxExceedsFile {
            size: box_size,
            file_size,
        });
    }

    // Major brand (bytes 8-11) should be printable ASCII.
    for &b in &buf[8..12] {
        if !(0x20..=0x7E).contains(&b) {
            return Err(FormatViolation::M4aBrandNotAscii(b));
        }
    }

    // If a following box header fits in the prefix, its type must also be
    // printable ASCII.
    if (buf.len() as u64) > box_size + 7 {
        let start = box_size as usize + 4;
        for &b in &buf[start..start + 4] {
            if !(0x20..=0x7E).contains(&b) {
                return Err(FormatViolation::M4aSecondBoxNotAscii(b));
            }
        }
    }

    Ok(())
}

/// WAV: validate the RIFF/WAVE header and the fmt chunk.
pub(super) fn check_wav(buf: &[u8], file_size: u64) -> Result<(), FormatViolation> {
    if buf.len() < 36 {
        return Err(FormatViolation::WavTruncated);
    }

    let riff_size = u64::from(u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]));
    if riff_size > file_size {
        return Err(FormatViolation::WavRiffSizeExceedsFile {
            riff_size,
            file_size,
        });
    }

    if &buf[12..16] != b"fmt " {
        return Err(FormatViolation::WavMissingFmtChunk);
    }

    let audio_format = u16::from_le_bytes([buf[20], buf[21]]);
    // PCM, IEEE float, A-law, mu-law, extensible.
    if !matches!(audio_format, 1 | 3 | 6 | 7 | 0xFFFE) {
        return Err(FormatViolation::WavUnknownAudioFormat(audio_format));
    }

    let channels = u16::from_le_bytes([buf[22], buf[23]]);
    if channels == 0 || channels > 8 {
        return Err(FormatViolation::WavChannelCount(channels));
    }

    let sample_rate = u32::from_le_bytes([buf[24], buf[25], buf[26], buf[27]]);
    if !(8000..=384000).contains(&sample_rate) {
        return Err(FormatViolation::WavSampleRate(sample_rate));
    }

    let bits_per_sample = u16::from_le_bytes([buf[34], buf[35]]);
    if !matches!(bits_per_sample, 8 | 16 | 24 | 32) {
        return Err(FormatViolation::WavBitsPerSample(bits_per_sample));
    }

    Ok(())
}
