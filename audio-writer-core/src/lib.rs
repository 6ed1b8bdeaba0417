//! # audio-writer-core
//!
//! Real-time audio tap that persists a live float audio stream to disk.
//!
//! Blocks arrive on the audio thread as planar `f32` channels, get
//! interleaved, and go through the selected encoder into a single output
//! file. Writing is gated by start/stop triggers from the host. Compressed
//! output goes through a [`CodecProvider`]; platform backends (macOS
//! AudioToolbox) implement it and plug into [`FilterDriver`].
//!
//! ## Architecture
//!
//! ```text
//! audio-writer-core (this crate)
//! ├── traits/       ← CodecProvider, AudioConverter, InputDataProvider
//! ├── models/       ← WriterError, WriterSettings, AudioFrame, HostEvent, WritingTriggers
//! ├── processing/   ← RingBuffer, interleaving, WAV header, ADTS header
//! ├── storage/      ← OutputFile, filename generation
//! ├── encoders/     ← internal-wav, coreaudio-aac, internal-raw
//! └── session/      ← FilterDriver (per-source state machine), Pipeline
//! ```
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use audio_writer_core::{AudioFrame, FilterDriver, HostEvent, NoCodecProvider, WriterSettings};
//!
//! let settings = WriterSettings::from_json(r#"{ "folder_path": "/tmp/rec" }"#)?;
//! let writer = FilterDriver::new("Mic", &settings, Arc::new(NoCodecProvider));
//! writer.handle_event(HostEvent::RecordingStarted);
//! writer.filter_audio(&AudioFrame::new(&planes, frames, 48000));
//! writer.handle_event(HostEvent::RecordingStopping);
//! ```

pub mod encoders;
pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use encoders::{EncoderDescriptor, ENCODERS};
pub use models::audio_models::{AudioFrame, StreamFormat};
pub use models::config::{WriterSettings, DEFAULT_FILENAME_FORMAT};
pub use models::error::WriterError;
pub use models::state::{HostEvent, WritingTriggers};
pub use processing::ring_buffer::RingBuffer;
pub use session::filter_driver::FilterDriver;
pub use storage::output_file::OutputFile;
pub use traits::codec::{
    AacFormat, AudioConverter, CodecProvider, InputData, InputDataProvider, NoCodecProvider, PcmFormat,
};
