//! WAV container utilities.
//!
//! Generates the canonical 44-byte RIFF header for interleaved 32-bit float
//! PCM and patches its two size fields once the payload length is known.

use std::io::{Seek, SeekFrom, Write};

use crate::models::audio_models::BYTES_PER_SAMPLE;

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Offset of the RIFF chunk size field.
pub const CHUNK_SIZE_OFFSET: u64 = 4;

/// Offset of the data sub-chunk size field.
pub const DATA_SIZE_OFFSET: u64 = 40;

/// Bytes covered by the RIFF chunk size besides the payload:
/// `"WAVE"` + fmt sub-chunk (8 + 16) + data sub-chunk header (8).
pub const RIFF_OVERHEAD: u32 = 36;

/// Largest payload whose sizes still fit the 32-bit header fields.
pub const MAX_DATA_SIZE: u64 = (u32::MAX - RIFF_OVERHEAD) as u64;

/// WAVE_FORMAT_IEEE_FLOAT.
const FORMAT_IEEE_FLOAT: u16 = 3;

const BITS_PER_SAMPLE: u16 = (BYTES_PER_SAMPLE * 8) as u16;

/// Generate a 44-byte WAV RIFF header for 32-bit float samples.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    36 + data_size
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (fmt chunk size)
/// [20-21]  3 (IEEE float)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * channels * 4
/// [32-33]  block_align = channels * 4
/// [34-35]  32
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
/// For a header written before the payload size is known, use
/// [`placeholder_header`].
pub fn generate_wav_header(sample_rate: u32, channels: u16, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let block_align = channels * BYTES_PER_SAMPLE as u16;
    let byte_rate = sample_rate * block_align as u32;
    let chunk_size = RIFF_OVERHEAD.saturating_add(data_size);

    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&FORMAT_IEEE_FLOAT.to_le_bytes());
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Header with both size fields zeroed, written when a file is opened.
/// [`patch_sizes`] fills them in before the file is closed.
pub fn placeholder_header(sample_rate: u32, channels: u16) -> [u8; WAV_HEADER_SIZE] {
    let mut header = generate_wav_header(sample_rate, channels, 0);
    header[CHUNK_SIZE_OFFSET as usize..CHUNK_SIZE_OFFSET as usize + 4].fill(0);
    header
}

/// Whether appending `packet_len` bytes to a payload of `data_size` bytes
/// would overflow the 32-bit size fields.
pub fn would_overflow(data_size: u64, packet_len: u64) -> bool {
    data_size.saturating_add(packet_len) > MAX_DATA_SIZE
}

/// Seek to both placeholders and write the final sizes.
///
/// The stream position is left after the data size field; callers close the
/// file right after.
pub fn patch_sizes<W: Write + Seek>(out: &mut W, data_size: u32) -> std::io::Result<()> {
    let chunk_size = RIFF_OVERHEAD.saturating_add(data_size);

    out.seek(SeekFrom::Start(CHUNK_SIZE_OFFSET))?;
    out.write_all(&chunk_size.to_le_bytes())?;

    out.seek(SeekFrom::Start(DATA_SIZE_OFFSET))?;
    out.write_all(&data_size.to_le_bytes())?;
    Ok(())
}
