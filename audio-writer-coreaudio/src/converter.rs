use std::ffi::c_void;
use std::mem;
use std::ptr;
use std::sync::Arc;

use audio_writer_core::models::audio_models::BYTES_PER_SAMPLE;
use audio_writer_core::{AacFormat, AudioConverter, InputData, InputDataProvider, PcmFormat, WriterError};

use crate::library::AudioToolbox;
use crate::sys::*;

/// AAC encoder backed by an AudioToolbox `AudioConverterRef`.
pub struct ToolboxConverter {
    library: Arc<AudioToolbox>,
    handle: AudioConverterRef,
    channels: u32,
    max_output_packet_size: Option<usize>,
}

// SAFETY: The converter handle is only touched by one thread at a time (the
// writer holds its output lock around every call). The rest is plain data.
unsafe impl Send for ToolboxConverter {}

/// Passed through `user_data` to [`input_callback`] for one fill call.
struct CallbackContext<'a> {
    provider: &'a mut dyn InputDataProvider,
    channels: u32,
}

impl ToolboxConverter {
    pub fn new(library: Arc<AudioToolbox>, input: &PcmFormat, output: &AacFormat) -> Result<Self, WriterError> {
        let source = pcm_description(input);
        let destination = aac_description(output);

        let mut handle: AudioConverterRef = ptr::null_mut();
        let status = unsafe { (library.converter_new)(&source, &destination, &mut handle) };
        check(status, "AudioConverterNew")?;

        // From here on Drop disposes the handle if configuration fails.
        let mut converter = Self {
            library,
            handle,
            channels: input.channels as u32,
            max_output_packet_size: None,
        };

        converter.set_u32(
            K_AUDIO_CODEC_PROPERTY_BIT_RATE_CONTROL_MODE,
            K_AUDIO_CODEC_BIT_RATE_CONTROL_MODE_VARIABLE,
            "bit rate control mode",
        )?;
        converter.set_u32(K_AUDIO_CONVERTER_CODEC_QUALITY, K_AUDIO_CONVERTER_QUALITY_MAX, "codec quality")?;
        converter.set_u32(K_AUDIO_CODEC_PROPERTY_SOUND_QUALITY_FOR_VBR, output.vbr_quality, "VBR quality")?;

        converter.max_output_packet_size = match converter.get_u32(K_AUDIO_CONVERTER_PROPERTY_MAXIMUM_OUTPUT_PACKET_SIZE) {
            Ok(size) if size > 0 => Some(size as usize),
            Ok(_) => None,
            Err(e) => {
                log::debug!("Maximum output packet size not reported: {}", e);
                None
            }
        };

        Ok(converter)
    }

    fn set_u32(&mut self, property: u32, value: u32, what: &str) -> Result<(), WriterError> {
        let status = unsafe {
            (self.library.set_property)(
                self.handle,
                property,
                mem::size_of::<u32>() as u32,
                (&value as *const u32).cast(),
            )
        };
        check(status, what)
    }

    fn get_u32(&self, property: u32) -> Result<u32, WriterError> {
        let mut value: u32 = 0;
        let mut size = mem::size_of::<u32>() as u32;
        let status = unsafe {
            (self.library.get_property)(self.handle, property, &mut size, (&mut value as *mut u32).cast())
        };
        check(status, "AudioConverterGetProperty")?;
        Ok(value)
    }
}

impl AudioConverter for ToolboxConverter {
    fn max_output_packet_size(&self) -> Option<usize> {
        self.max_output_packet_size
    }

    fn fill(&mut self, input: &mut dyn InputDataProvider, output: &mut [u8]) -> Result<Option<usize>, WriterError> {
        let mut context = CallbackContext {
            provider: input,
            channels: self.channels,
        };
        let mut buffers = AudioBufferList {
            number_buffers: 1,
            buffers: [AudioBuffer {
                number_channels: self.channels,
                data_byte_size: u32::try_from(output.len()).unwrap_or(u32::MAX),
                data: output.as_mut_ptr().cast(),
            }],
        };
        let mut packets: u32 = 1;
        let mut description = AudioStreamPacketDescription::default();

        let status = unsafe {
            (self.library.fill_complex_buffer)(
                self.handle,
                input_callback,
                (&mut context as *mut CallbackContext<'_>).cast(),
                &mut packets,
                &mut buffers,
                &mut description,
            )
        };

        if status != NO_ERR && status != MORE_DATA_REQUIRED {
            return Err(WriterError::EncodingFailed(format!(
                "AudioConverterFillComplexBuffer returned {}",
                status
            )));
        }
        if packets == 0 {
            return Ok(None);
        }
        Ok(Some(buffers.buffers[0].data_byte_size as usize))
    }
}

impl Drop for ToolboxConverter {
    fn drop(&mut self) {
        let status = unsafe { (self.library.converter_dispose)(self.handle) };
        if status != NO_ERR {
            log::error!("AudioConverterDispose returned {}", status);
        }
    }
}

/// Called by AudioToolbox from inside `AudioConverterFillComplexBuffer`.
unsafe extern "C" fn input_callback(
    _converter: AudioConverterRef,
    io_number_data_packets: *mut u32,
    io_data: *mut AudioBufferList,
    _out_data_packet_description: *mut *mut AudioStreamPacketDescription,
    user_data: *mut c_void,
) -> OSStatus {
    let context = unsafe { &mut *(user_data as *mut CallbackContext<'_>) };
    let requested = unsafe { *io_number_data_packets };

    match context.provider.provide(requested) {
        InputData::MoreDataRequired => {
            unsafe { *io_number_data_packets = 0 };
            MORE_DATA_REQUIRED
        }
        InputData::Packets(data) => {
            let buffer = unsafe { &mut (*io_data).buffers[0] };
            buffer.number_channels = context.channels;
            buffer.data_byte_size = data.len() as u32;
            // Read-only for the codec; stays valid until the next callback.
            buffer.data = data.as_ptr() as *mut c_void;
            NO_ERR
        }
    }
}

fn pcm_description(format: &PcmFormat) -> AudioStreamBasicDescription {
    let bytes_per_frame = format.bytes_per_frame() as u32;
    AudioStreamBasicDescription {
        sample_rate: format.sample_rate as f64,
        format_id: K_AUDIO_FORMAT_LINEAR_PCM,
        format_flags: K_AUDIO_FORMAT_FLAG_IS_FLOAT | K_AUDIO_FORMAT_FLAG_IS_PACKED,
        bytes_per_packet: bytes_per_frame,
        frames_per_packet: 1,
        bytes_per_frame,
        channels_per_frame: format.channels as u32,
        bits_per_channel: (BYTES_PER_SAMPLE * 8) as u32,
        reserved: 0,
    }
}

fn aac_description(format: &AacFormat) -> AudioStreamBasicDescription {
    AudioStreamBasicDescription {
        sample_rate: format.sample_rate as f64,
        format_id: K_AUDIO_FORMAT_MPEG4_AAC,
        format_flags: K_MPEG4_OBJECT_AAC_LC,
        frames_per_packet: AAC_FRAMES_PER_PACKET,
        channels_per_frame: format.channels as u32,
        ..Default::default()
    }
}

fn check(status: OSStatus, what: &str) -> Result<(), WriterError> {
    if status == NO_ERR {
        Ok(())
    } else {
        Err(WriterError::EncodingFailed(format!("{} failed with status {}", what, status)))
    }
}
