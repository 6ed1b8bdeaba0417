use crate::encoders::find_encoder;
use crate::models::audio_models::AudioFrame;
use crate::models::error::WriterError;
use crate::processing::interleave::fill_interleaved;
use crate::session::pipeline::Pipeline;

pub const NAME: &str = "internal-raw";

/// Append the block as headerless interleaved f32 PCM.
pub fn write_raw_packet(pipeline: &Pipeline, frame: &AudioFrame<'_>) -> Result<(), WriterError> {
    let format = pipeline.stream_format(frame);
    let encoder = find_encoder(NAME);

    let mut output = pipeline.output.lock();
    if !pipeline.is_selected(encoder) {
        return Ok(());
    }
    output.file.open(encoder)?;

    let mut producer = pipeline.producer.lock();
    let bytes = fill_interleaved(frame, format.channels as usize, &mut producer.interleaved);
    output.file.write(bytes)
}
