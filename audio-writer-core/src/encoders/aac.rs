use std::fmt;
use std::sync::atomic::Ordering;

use crate::encoders::find_encoder;
use crate::models::audio_models::{AudioFrame, StreamFormat};
use crate::models::error::WriterError;
use crate::processing::adts::{adts_header, ADTS_HEADER_LENGTH, MAX_FRAME_LENGTH};
use crate::processing::interleave::fill_interleaved;
use crate::processing::ring_buffer::RingBuffer;
use crate::session::pipeline::Pipeline;
use crate::traits::codec::{AacFormat, AudioConverter, CodecProvider, InputData, InputDataProvider, PcmFormat};

pub const NAME: &str = "coreaudio-aac";

/// Output scratch size when the codec does not report a maximum packet size.
const DEFAULT_OUTPUT_PACKET_SIZE: usize = 32 * 1024;

/// Adapts block-by-block audio delivery to a pull-driven AAC codec.
///
/// The converter is created on first use and lives as long as the writer,
/// across file rotations.
pub struct AacPullEncoder {
    converter: Option<Box<dyn AudioConverter>>,
    bytes_per_input_packet: usize,
    /// Staging area the pull callback hands to the codec.
    encode_buffer: RingBuffer,
    /// Scratch the codec writes one compressed packet into.
    output_buffer: RingBuffer,
}

impl AacPullEncoder {
    pub fn new() -> Self {
        Self {
            converter: None,
            bytes_per_input_packet: 0,
            encode_buffer: RingBuffer::new(),
            output_buffer: RingBuffer::new(),
        }
    }

    pub fn has_converter(&self) -> bool {
        self.converter.is_some()
    }

    pub fn bytes_per_input_packet(&self) -> usize {
        self.bytes_per_input_packet
    }

    /// Create the converter for `format` unless one already exists.
    pub fn ensure_converter(&mut self, codec: &dyn CodecProvider, format: StreamFormat) -> Result<(), WriterError> {
        if self.converter.is_some() {
            return Ok(());
        }

        let input = PcmFormat::from(format);
        let converter = codec.create_aac_converter(&input, &AacFormat::matching(&input))?;

        let max_packet = converter
            .max_output_packet_size()
            .filter(|&size| size > 0)
            .unwrap_or(DEFAULT_OUTPUT_PACKET_SIZE);
        self.bytes_per_input_packet = input.bytes_per_packet();
        self.output_buffer.upsize(max_packet);

        log::info!(
            "Created AAC converter: {} Hz, {} channels, max packet {} bytes",
            format.sample_rate,
            format.channels,
            max_packet
        );
        self.converter = Some(converter);
        Ok(())
    }

    /// Drive the converter once, pulling from `input`.
    ///
    /// Returns the compressed packet, or `None` while the codec waits for
    /// more input.
    pub fn encode(&mut self, input: &mut RingBuffer) -> Result<Option<&[u8]>, WriterError> {
        let Some(converter) = self.converter.as_mut() else {
            return Ok(None);
        };

        let mut source = PullSource {
            input,
            staging: &mut self.encode_buffer,
            bytes_per_packet: self.bytes_per_input_packet,
        };
        let capacity = self.output_buffer.size();
        let output = self.output_buffer.front_mut(capacity);

        match converter.fill(&mut source, output)? {
            Some(len) => Ok(Some(&output[..len.min(capacity)])),
            None => Ok(None),
        }
    }
}

impl Default for AacPullEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AacPullEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AacPullEncoder")
            .field("has_converter", &self.converter.is_some())
            .field("bytes_per_input_packet", &self.bytes_per_input_packet)
            .field("output_capacity", &self.output_buffer.size())
            .finish()
    }
}

/// Pull callback over the input ring buffer.
struct PullSource<'a> {
    input: &'a mut RingBuffer,
    staging: &'a mut RingBuffer,
    bytes_per_packet: usize,
}

impl InputDataProvider for PullSource<'_> {
    fn provide(&mut self, packets: u32) -> InputData<'_> {
        let required = packets as usize * self.bytes_per_packet;
        if required == 0 || self.input.size() < required {
            return InputData::MoreDataRequired;
        }

        self.staging.upsize(required);
        let region = self.staging.front_mut(required);
        self.input.pop_front(region);
        InputData::Packets(region)
    }
}

/// Buffer the block and, if the output lock is free, encode one AAC packet.
///
/// Never waits for the output lock: under contention the block stays in the
/// input buffer and is encoded by a later call.
pub fn write_aac_packet(pipeline: &Pipeline, frame: &AudioFrame<'_>) -> Result<(), WriterError> {
    if pipeline.codec_unavailable.load(Ordering::Acquire) {
        return Ok(());
    }
    let format = pipeline.stream_format(frame);

    {
        let mut producer = pipeline.producer.lock();
        let producer = &mut *producer;
        let bytes = fill_interleaved(frame, format.channels as usize, &mut producer.interleaved);
        producer.input.push_back(bytes);
    }

    let Some(mut guard) = pipeline.output.try_lock() else {
        return Ok(());
    };
    let output = &mut *guard;
    let encoder = find_encoder(NAME);
    if !pipeline.is_selected(encoder) {
        pipeline.producer.lock().input.reset();
        return Ok(());
    }

    if let Err(e) = output.aac.ensure_converter(pipeline.codec.as_ref(), format) {
        pipeline.codec_unavailable.store(true, Ordering::Release);
        pipeline.producer.lock().input.reset();
        log::warn!("AAC output disabled for this source");
        return Err(e);
    }

    if let Err(e) = output.file.open(encoder) {
        pipeline.producer.lock().input.reset();
        return Err(e);
    }

    let mut producer = pipeline.producer.lock();
    let packet = match output.aac.encode(&mut producer.input) {
        Ok(packet) => packet,
        Err(e) => {
            pipeline.codec_unavailable.store(true, Ordering::Release);
            producer.input.reset();
            log::warn!("AAC output disabled after codec failure");
            return Err(e);
        }
    };

    let Some(payload) = packet else {
        return Ok(());
    };
    if payload.len() + ADTS_HEADER_LENGTH > MAX_FRAME_LENGTH {
        return Err(WriterError::EncodingFailed(format!(
            "{} byte AAC packet does not fit an ADTS frame",
            payload.len()
        )));
    }

    output.file.write(&adts_header(payload.len(), format.sample_rate, format.channels))?;
    output.file.write(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoders::encoder_index;
    use crate::models::config::WriterSettings;
    use crate::storage::output_file::OutputFile;
    use crate::traits::codec::NoCodecProvider;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use tempfile::tempdir;

    /// Emits its pulled input unchanged as the "compressed" packet.
    struct PassthroughConverter {
        packets_per_fill: u32,
        max_packet: Option<usize>,
    }

    impl AudioConverter for PassthroughConverter {
        fn max_output_packet_size(&self) -> Option<usize> {
            self.max_packet
        }

        fn fill(&mut self, input: &mut dyn InputDataProvider, output: &mut [u8]) -> Result<Option<usize>, WriterError> {
            match input.provide(self.packets_per_fill) {
                InputData::MoreDataRequired => Ok(None),
                InputData::Packets(data) => {
                    let len = data.len().min(output.len());
                    output[..len].copy_from_slice(&data[..len]);
                    Ok(Some(len))
                }
            }
        }
    }

    struct FailingConverter;

    impl AudioConverter for FailingConverter {
        fn max_output_packet_size(&self) -> Option<usize> {
            None
        }

        fn fill(&mut self, _input: &mut dyn InputDataProvider, _output: &mut [u8]) -> Result<Option<usize>, WriterError> {
            Err(WriterError::EncodingFailed("status -50".into()))
        }
    }

    struct FakeCodec {
        created: AtomicUsize,
        packets_per_fill: u32,
        max_packet: Option<usize>,
        failing: bool,
    }

    impl FakeCodec {
        fn new(packets_per_fill: u32) -> Self {
            Self {
                created: AtomicUsize::new(0),
                packets_per_fill,
                max_packet: Some(4096),
                failing: false,
            }
        }
    }

    impl CodecProvider for FakeCodec {
        fn is_available(&self) -> bool {
            true
        }

        fn create_aac_converter(
            &self,
            input: &PcmFormat,
            output: &AacFormat,
        ) -> Result<Box<dyn AudioConverter>, WriterError> {
            assert_eq!(input.sample_rate, output.sample_rate);
            self.created.fetch_add(1, Ordering::SeqCst);
            if self.failing {
                return Ok(Box::new(FailingConverter));
            }
            Ok(Box::new(PassthroughConverter {
                packets_per_fill: self.packets_per_fill,
                max_packet: self.max_packet,
            }))
        }
    }

    fn pipeline_with(folder: &Path, codec: Arc<dyn CodecProvider>) -> Pipeline {
        let settings = WriterSettings {
            folder_path: folder.to_path_buf(),
            output_encoder: NAME.to_string(),
            ..Default::default()
        };
        Pipeline::new(OutputFile::new("Mic", &settings), encoder_index(NAME), codec)
    }

    fn close(pipeline: &Pipeline) -> PathBuf {
        let mut output = pipeline.output.lock();
        output.file.close().unwrap();
        output.file.path().unwrap().to_path_buf()
    }

    fn stereo_ramp(start: f32, frames: usize) -> (Vec<f32>, Vec<f32>) {
        let left = (0..frames).map(|i| start + i as f32).collect();
        let right = (0..frames).map(|i| -(start + i as f32)).collect();
        (left, right)
    }

    /// Split an ADTS stream into payloads, checking each header on the way.
    fn adts_payloads(bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut payloads = Vec::new();
        let mut offset = 0;
        while offset < bytes.len() {
            let header = &bytes[offset..offset + ADTS_HEADER_LENGTH];
            assert_eq!(header[0], 0xFF);
            assert_eq!(header[1] & 0xF0, 0xF0);
            let frame_length =
                (((header[3] & 0x03) as usize) << 11) | ((header[4] as usize) << 3) | ((header[5] as usize) >> 5);
            payloads.push(bytes[offset + ADTS_HEADER_LENGTH..offset + frame_length].to_vec());
            offset += frame_length;
        }
        payloads
    }

    #[test]
    fn underbuffered_input_produces_nothing() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline_with(dir.path(), Arc::new(FakeCodec::new(4)));

        let (left, right) = stereo_ramp(1.0, 2);
        let planes = [Some(&left[..]), Some(&right[..])];
        write_aac_packet(&pipeline, &AudioFrame::new(&planes, 2, 48000)).unwrap();

        assert_eq!(pipeline.producer.lock().input.size(), 16);
        let output = pipeline.output.lock();
        assert!(output.aac.has_converter());
        assert_eq!(output.aac.bytes_per_input_packet(), 8);
        assert_eq!(output.file.bytes_written(), 0);
    }

    #[test]
    fn packet_written_with_adts_header() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline_with(dir.path(), Arc::new(FakeCodec::new(4)));

        let (left_a, right_a) = stereo_ramp(1.0, 2);
        let (left_b, right_b) = stereo_ramp(3.0, 2);
        let first = [Some(&left_a[..]), Some(&right_a[..])];
        let second = [Some(&left_b[..]), Some(&right_b[..])];
        write_aac_packet(&pipeline, &AudioFrame::new(&first, 2, 48000)).unwrap();
        write_aac_packet(&pipeline, &AudioFrame::new(&second, 2, 48000)).unwrap();

        let path = close(&pipeline);
        assert_eq!(path.extension().unwrap(), "aac");
        let bytes = fs::read(path).unwrap();
        assert_eq!(bytes.len(), ADTS_HEADER_LENGTH + 32);
        assert_eq!(bytes[..ADTS_HEADER_LENGTH], adts_header(32, 48000, 2));

        let samples: Vec<f32> = bytes[ADTS_HEADER_LENGTH..]
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        assert_eq!(samples, vec![1.0, -1.0, 2.0, -2.0, 3.0, -3.0, 4.0, -4.0]);
    }

    #[test]
    fn payloads_are_an_ordered_prefix_of_input() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline_with(dir.path(), Arc::new(FakeCodec::new(3)));

        let mut expected = Vec::new();
        for block in 0..10 {
            let (left, right) = stereo_ramp(block as f32 * 5.0, 5);
            for i in 0..5 {
                expected.extend_from_slice(&left[i].to_le_bytes());
                expected.extend_from_slice(&right[i].to_le_bytes());
            }
            let planes = [Some(&left[..]), Some(&right[..])];
            write_aac_packet(&pipeline, &AudioFrame::new(&planes, 5, 44100)).unwrap();
        }

        let remaining = pipeline.producer.lock().input.size();
        let payloads = adts_payloads(&fs::read(close(&pipeline)).unwrap());
        assert_eq!(payloads.len(), 10);

        let encoded: Vec<u8> = payloads.concat();
        assert_eq!(encoded.len() + remaining, expected.len());
        assert_eq!(encoded[..], expected[..encoded.len()]);
    }

    #[test]
    fn contention_defers_without_losing_input() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline_with(dir.path(), Arc::new(FakeCodec::new(4)));

        let (left, right) = stereo_ramp(1.0, 4);
        let planes = [Some(&left[..]), Some(&right[..])];
        let frame = AudioFrame::new(&planes, 4, 48000);

        {
            let _held = pipeline.output.lock();
            write_aac_packet(&pipeline, &frame).unwrap();
        }
        assert_eq!(pipeline.producer.lock().input.size(), 32);
        assert!(!pipeline.output.lock().aac.has_converter());

        write_aac_packet(&pipeline, &frame).unwrap();
        assert_eq!(pipeline.producer.lock().input.size(), 32);

        let payloads = adts_payloads(&fs::read(close(&pipeline)).unwrap());
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].len(), 32);
    }

    #[test]
    fn unavailable_codec_is_reported_once() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline_with(dir.path(), Arc::new(NoCodecProvider));

        let samples = [0.25f32; 8];
        let planes = [Some(&samples[..])];
        let frame = AudioFrame::new(&planes, 8, 48000);

        let first = write_aac_packet(&pipeline, &frame).unwrap_err();
        assert!(matches!(first, WriterError::CodecUnavailable(_)));

        for _ in 0..5 {
            write_aac_packet(&pipeline, &frame).unwrap();
        }
        assert!(pipeline.producer.lock().input.is_empty());
        assert!(pipeline.output.lock().file.path().is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn converter_created_once() {
        let dir = tempdir().unwrap();
        let codec = Arc::new(FakeCodec::new(2));
        let pipeline = pipeline_with(dir.path(), codec.clone());

        let samples = [0.5f32; 4];
        let planes = [Some(&samples[..]), Some(&samples[..])];
        for _ in 0..4 {
            write_aac_packet(&pipeline, &AudioFrame::new(&planes, 4, 48000)).unwrap();
        }
        // A new file does not mean a new converter.
        pipeline.output.lock().file.close().unwrap();
        write_aac_packet(&pipeline, &AudioFrame::new(&planes, 4, 48000)).unwrap();

        assert_eq!(codec.created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn output_scratch_falls_back_when_unreported() {
        let dir = tempdir().unwrap();
        let mut codec = FakeCodec::new(1);
        codec.max_packet = None;
        let pipeline = pipeline_with(dir.path(), Arc::new(codec));

        let samples = [0.5f32; 1];
        let planes = [Some(&samples[..])];
        write_aac_packet(&pipeline, &AudioFrame::new(&planes, 1, 48000)).unwrap();

        assert_eq!(pipeline.output.lock().aac.output_buffer.size(), DEFAULT_OUTPUT_PACKET_SIZE);
    }

    #[test]
    fn codec_failure_disables_compressed_output() {
        let dir = tempdir().unwrap();
        let mut codec = FakeCodec::new(1);
        codec.failing = true;
        let pipeline = pipeline_with(dir.path(), Arc::new(codec));

        let samples = [0.5f32; 4];
        let planes = [Some(&samples[..])];
        let frame = AudioFrame::new(&planes, 4, 48000);

        let first = write_aac_packet(&pipeline, &frame).unwrap_err();
        assert!(matches!(first, WriterError::EncodingFailed(_)));
        write_aac_packet(&pipeline, &frame).unwrap();
        assert!(pipeline.producer.lock().input.is_empty());
    }

    #[test]
    fn deselected_encoder_discards_buffered_input() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline_with(dir.path(), Arc::new(FakeCodec::new(1)));
        pipeline.select_encoder(encoder_index("internal-raw"));

        let samples = [0.5f32; 4];
        let planes = [Some(&samples[..])];
        write_aac_packet(&pipeline, &AudioFrame::new(&planes, 4, 48000)).unwrap();

        assert!(pipeline.producer.lock().input.is_empty());
        assert!(!pipeline.output.lock().aac.has_converter());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn pull_source_reports_underrun() {
        let mut input = RingBuffer::new();
        let mut staging = RingBuffer::new();
        input.push_back(&[1, 2, 3, 4, 5, 6]);

        let mut source = PullSource {
            input: &mut input,
            staging: &mut staging,
            bytes_per_packet: 4,
        };
        assert_eq!(source.provide(2), InputData::MoreDataRequired);
        assert_eq!(source.provide(0), InputData::MoreDataRequired);
        assert_eq!(source.provide(1), InputData::Packets(&[1, 2, 3, 4]));
        assert_eq!(source.provide(1), InputData::MoreDataRequired);
        assert_eq!(input.size(), 2);
    }
}
