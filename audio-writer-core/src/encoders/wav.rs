use crate::encoders::find_encoder;
use crate::models::audio_models::AudioFrame;
use crate::models::error::WriterError;
use crate::processing::interleave::fill_interleaved;
use crate::processing::wav_format::{self, MAX_DATA_SIZE};
use crate::session::pipeline::Pipeline;
use crate::storage::output_file::OutputFile;

pub const NAME: &str = "internal-wav";

/// Append the block to a WAV file, writing the header first if needed.
///
/// When the block would push the payload past what the 32-bit size fields
/// can describe, the current file is finalized and a new one started.
pub fn write_wav_packet(pipeline: &Pipeline, frame: &AudioFrame<'_>) -> Result<(), WriterError> {
    let format = pipeline.stream_format(frame);
    let packet_len = (frame.frame_count * format.bytes_per_frame()) as u64;
    let encoder = find_encoder(NAME);

    let mut output = pipeline.output.lock();
    if !pipeline.is_selected(encoder) {
        return Ok(());
    }
    let file = &mut output.file;

    if file.is_open()
        && file.encoder() == Some(encoder)
        && wav_format::would_overflow(file.bytes_written(), packet_len)
    {
        log::info!("WAV size limit reached after {} bytes, starting a new file", file.bytes_written());
        if let Err(e) = file.close() {
            log::error!("Failed to finalize full WAV file: {}", e);
        }
    }

    file.open(encoder)?;
    if !file.has_header() {
        file.write_header(&wav_format::placeholder_header(format.sample_rate, format.channels))?;
    }

    let mut producer = pipeline.producer.lock();
    let bytes = fill_interleaved(frame, format.channels as usize, &mut producer.interleaved);
    file.write(bytes)
}

/// Patch the RIFF and data chunk sizes. Runs right before the file closes.
pub fn finish_wav(file: &mut OutputFile) -> Result<(), WriterError> {
    if !file.has_header() {
        return Ok(());
    }

    let data_size = file.bytes_written().min(MAX_DATA_SIZE) as u32;
    let handle = file.handle_mut().ok_or(WriterError::OutputUnavailable)?;
    wav_format::patch_sizes(handle, data_size)
        .map_err(|e| WriterError::StorageError(format!("failed to patch WAV header: {}", e)))
}
