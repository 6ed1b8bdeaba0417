//! # audio-writer-coreaudio
//!
//! AudioToolbox backend for audio-writer.
//!
//! Provides:
//! - `CoreAudioCodecProvider`: AAC-LC encoding through `AudioConverter`
//! - `ToolboxConverter`: one converter instance, driven by the core's pull callback
//!
//! AudioToolbox is loaded at runtime with `libloading`, once per process.
//! The crate builds on every platform; where the framework is missing the
//! provider reports itself unavailable and the writer skips AAC output.
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use audio_writer_core::{FilterDriver, WriterSettings};
//! use audio_writer_coreaudio::CoreAudioCodecProvider;
//!
//! let settings = WriterSettings { output_encoder: "coreaudio-aac".into(), ..Default::default() };
//! let writer = FilterDriver::new("Mic", &settings, Arc::new(CoreAudioCodecProvider));
//! ```

pub mod converter;
pub mod library;
pub mod sys;

pub use converter::ToolboxConverter;
pub use library::{audio_toolbox, AUDIO_TOOLBOX_PATH};

use audio_writer_core::{AacFormat, AudioConverter, CodecProvider, PcmFormat, WriterError};

/// [`CodecProvider`] backed by the system AudioToolbox framework.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreAudioCodecProvider;

impl CodecProvider for CoreAudioCodecProvider {
    fn is_available(&self) -> bool {
        audio_toolbox().is_some()
    }

    fn create_aac_converter(
        &self,
        input: &PcmFormat,
        output: &AacFormat,
    ) -> Result<Box<dyn AudioConverter>, WriterError> {
        let library = audio_toolbox()
            .ok_or_else(|| WriterError::CodecUnavailable(format!("could not load {}", AUDIO_TOOLBOX_PATH)))?;
        let converter = ToolboxConverter::new(library, input, output)?;
        Ok(Box::new(converter))
    }
}
