//! AudioToolbox C types and constants used by the converter.

use std::ffi::c_void;

pub type OSStatus = i32;
pub type AudioConverterRef = *mut c_void;

pub const NO_ERR: OSStatus = 0;

/// Returned by our input callback when the input buffer holds less than the
/// codec asked for. Any non-zero status stops the converter for this round.
pub const MORE_DATA_REQUIRED: OSStatus = 1;

pub const K_AUDIO_FORMAT_LINEAR_PCM: u32 = u32::from_be_bytes(*b"lpcm");
pub const K_AUDIO_FORMAT_MPEG4_AAC: u32 = u32::from_be_bytes(*b"aac ");

pub const K_AUDIO_FORMAT_FLAG_IS_FLOAT: u32 = 1 << 0;
pub const K_AUDIO_FORMAT_FLAG_IS_PACKED: u32 = 1 << 3;

/// `kMPEG4Object_AAC_LC`, stored in the format flags of an AAC description.
pub const K_MPEG4_OBJECT_AAC_LC: u32 = 2;
pub const AAC_FRAMES_PER_PACKET: u32 = 1024;

pub const K_AUDIO_CODEC_PROPERTY_BIT_RATE_CONTROL_MODE: u32 = u32::from_be_bytes(*b"acbf");
pub const K_AUDIO_CODEC_BIT_RATE_CONTROL_MODE_VARIABLE: u32 = 3;
pub const K_AUDIO_CONVERTER_CODEC_QUALITY: u32 = u32::from_be_bytes(*b"cdqu");
pub const K_AUDIO_CONVERTER_QUALITY_MAX: u32 = 0x7F;
pub const K_AUDIO_CODEC_PROPERTY_SOUND_QUALITY_FOR_VBR: u32 = u32::from_be_bytes(*b"vbrq");
pub const K_AUDIO_CONVERTER_PROPERTY_MAXIMUM_OUTPUT_PACKET_SIZE: u32 = u32::from_be_bytes(*b"xops");

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioStreamBasicDescription {
    pub sample_rate: f64,
    pub format_id: u32,
    pub format_flags: u32,
    pub bytes_per_packet: u32,
    pub frames_per_packet: u32,
    pub bytes_per_frame: u32,
    pub channels_per_frame: u32,
    pub bits_per_channel: u32,
    pub reserved: u32,
}

#[repr(C)]
#[derive(Debug)]
pub struct AudioBuffer {
    pub number_channels: u32,
    pub data_byte_size: u32,
    pub data: *mut c_void,
}

/// Single-buffer `AudioBufferList`; interleaved audio never needs more.
#[repr(C)]
#[derive(Debug)]
pub struct AudioBufferList {
    pub number_buffers: u32,
    pub buffers: [AudioBuffer; 1],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioStreamPacketDescription {
    pub start_offset: i64,
    pub variable_frames_in_packet: u32,
    pub data_byte_size: u32,
}

pub type AudioConverterComplexInputDataProc = unsafe extern "C" fn(
    converter: AudioConverterRef,
    io_number_data_packets: *mut u32,
    io_data: *mut AudioBufferList,
    out_data_packet_description: *mut *mut AudioStreamPacketDescription,
    user_data: *mut c_void,
) -> OSStatus;

pub type AudioConverterNewFn = unsafe extern "C" fn(
    source_format: *const AudioStreamBasicDescription,
    destination_format: *const AudioStreamBasicDescription,
    out_converter: *mut AudioConverterRef,
) -> OSStatus;

pub type AudioConverterDisposeFn = unsafe extern "C" fn(converter: AudioConverterRef) -> OSStatus;

pub type AudioConverterSetPropertyFn = unsafe extern "C" fn(
    converter: AudioConverterRef,
    property_id: u32,
    property_data_size: u32,
    property_data: *const c_void,
) -> OSStatus;

pub type AudioConverterGetPropertyFn = unsafe extern "C" fn(
    converter: AudioConverterRef,
    property_id: u32,
    io_property_data_size: *mut u32,
    out_property_data: *mut c_void,
) -> OSStatus;

pub type AudioConverterFillComplexBufferFn = unsafe extern "C" fn(
    converter: AudioConverterRef,
    input_proc: AudioConverterComplexInputDataProc,
    input_proc_user_data: *mut c_void,
    io_output_data_packet_size: *mut u32,
    out_output_data: *mut AudioBufferList,
    out_packet_description: *mut AudioStreamPacketDescription,
) -> OSStatus;
