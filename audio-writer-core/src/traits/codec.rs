use crate::models::audio_models::{StreamFormat, BYTES_PER_SAMPLE};
use crate::models::error::WriterError;

/// Highest VBR sound quality accepted by AAC codecs.
pub const MAX_VBR_QUALITY: u32 = 127;

/// Input side of a converter: interleaved, packed 32-bit float PCM with one
/// frame per packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmFormat {
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * BYTES_PER_SAMPLE
    }

    /// Bytes in one input packet (one frame).
    pub fn bytes_per_packet(&self) -> usize {
        self.bytes_per_frame()
    }
}

impl From<StreamFormat> for PcmFormat {
    fn from(format: StreamFormat) -> Self {
        Self {
            sample_rate: format.sample_rate,
            channels: format.channels,
        }
    }
}

/// Output side of a converter: AAC-LC, variable bit rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AacFormat {
    pub sample_rate: u32,
    pub channels: u16,
    /// VBR sound quality, `0..=MAX_VBR_QUALITY`.
    pub vbr_quality: u32,
}

impl AacFormat {
    /// AAC-LC matching `input`, at maximum VBR quality.
    pub fn matching(input: &PcmFormat) -> Self {
        Self {
            sample_rate: input.sample_rate,
            channels: input.channels,
            vbr_quality: MAX_VBR_QUALITY,
        }
    }
}

/// Answer to a converter's request for input.
#[derive(Debug, PartialEq, Eq)]
pub enum InputData<'a> {
    /// Exactly the requested number of packets, interleaved.
    Packets(&'a [u8]),
    /// Not enough input buffered yet; the converter must stop and report
    /// zero output packets for this round.
    MoreDataRequired,
}

/// Pull callback the converter invokes while it is being driven.
///
/// Implemented by the writer core over its ring buffers. The returned slice
/// is owned by the implementor and stays valid until the next call to
/// [`provide`](Self::provide) or until [`AudioConverter::fill`] returns.
pub trait InputDataProvider {
    fn provide(&mut self, packets: u32) -> InputData<'_>;
}

/// One codec instance.
///
/// Owned by a single writer and only driven with the writer's output lock
/// held, so implementations need `Send` but not `Sync`.
pub trait AudioConverter: Send {
    /// Largest packet the converter can emit, if it reports one.
    fn max_output_packet_size(&self) -> Option<usize>;

    /// Produce at most one output packet into `output`.
    ///
    /// Pulls input through `input` as many times as the codec needs.
    /// Returns `Ok(Some(len))` when a packet of `len` bytes was written,
    /// `Ok(None)` when the codec is still waiting for input.
    fn fill(&mut self, input: &mut dyn InputDataProvider, output: &mut [u8]) -> Result<Option<usize>, WriterError>;
}

/// Access to a platform codec library that may or may not be present.
pub trait CodecProvider: Send + Sync {
    /// Whether the library could be loaded.
    fn is_available(&self) -> bool;

    /// Create an AAC converter for `input`.
    ///
    /// Fails with [`WriterError::CodecUnavailable`] when the library is
    /// missing and [`WriterError::EncodingFailed`] when the codec rejects the
    /// configuration.
    fn create_aac_converter(
        &self,
        input: &PcmFormat,
        output: &AacFormat,
    ) -> Result<Box<dyn AudioConverter>, WriterError>;
}

/// Provider for hosts without any codec library.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCodecProvider;

impl CodecProvider for NoCodecProvider {
    fn is_available(&self) -> bool {
        false
    }

    fn create_aac_converter(
        &self,
        _input: &PcmFormat,
        _output: &AacFormat,
    ) -> Result<Box<dyn AudioConverter>, WriterError> {
        Err(WriterError::CodecUnavailable("no codec library configured".into()))
    }
}
