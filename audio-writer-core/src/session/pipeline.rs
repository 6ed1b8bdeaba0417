use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::encoders::aac::AacPullEncoder;
use crate::encoders::{EncoderDescriptor, ENCODERS};
use crate::models::audio_models::{AudioFrame, StreamFormat};
use crate::processing::ring_buffer::RingBuffer;
use crate::storage::output_file::OutputFile;
use crate::traits::codec::CodecProvider;

/// State guarded by the writer's output lock.
#[derive(Debug)]
pub(crate) struct OutputState {
    pub file: OutputFile,
    pub aac: AacPullEncoder,
}

/// Buffers filled on the audio thread.
///
/// Only contended by the codec pull callback, which runs on the audio thread
/// too. Always locked after the output lock, never before it.
#[derive(Debug, Default)]
pub(crate) struct ProducerBuffers {
    pub interleaved: RingBuffer,
    pub input: RingBuffer,
}

/// Everything an encoder touches while writing one block.
///
/// Owned by one [`FilterDriver`](crate::session::filter_driver::FilterDriver);
/// never shared between instances.
pub struct Pipeline {
    pub(crate) format: OnceLock<StreamFormat>,
    pub(crate) output: Mutex<OutputState>,
    pub(crate) producer: Mutex<ProducerBuffers>,
    pub(crate) codec: Arc<dyn CodecProvider>,
    pub(crate) codec_unavailable: AtomicBool,
    /// Index into [`ENCODERS`]. Read lock-free for dispatch; only changed
    /// with the output lock held.
    encoder: AtomicUsize,
}

impl Pipeline {
    pub(crate) fn new(file: OutputFile, encoder: usize, codec: Arc<dyn CodecProvider>) -> Self {
        Self {
            format: OnceLock::new(),
            output: Mutex::new(OutputState {
                file,
                aac: AacPullEncoder::new(),
            }),
            producer: Mutex::new(ProducerBuffers::default()),
            codec,
            codec_unavailable: AtomicBool::new(false),
            encoder: AtomicUsize::new(encoder.min(ENCODERS.len() - 1)),
        }
    }

    /// Stream format, fixed by the first frame ever observed.
    pub fn stream_format(&self, frame: &AudioFrame<'_>) -> StreamFormat {
        *self.format.get_or_init(|| frame.format())
    }

    /// Currently selected encoder.
    pub fn encoder(&self) -> &'static EncoderDescriptor {
        &ENCODERS[self.encoder.load(Ordering::Acquire)]
    }

    /// Whether `encoder` is still the selected one. Writers check this after
    /// taking the output lock, so a block dispatched just before a switch is
    /// dropped instead of reopening the old format.
    pub fn is_selected(&self, encoder: &EncoderDescriptor) -> bool {
        self.encoder() == encoder
    }

    /// Select encoder `index`; returns the previous index. Call with the
    /// output lock held.
    pub(crate) fn select_encoder(&self, index: usize) -> usize {
        self.encoder.swap(index.min(ENCODERS.len() - 1), Ordering::AcqRel)
    }

    /// Stream format if a frame has been seen.
    pub fn observed_format(&self) -> Option<StreamFormat> {
        self.format.get().copied()
    }
}
