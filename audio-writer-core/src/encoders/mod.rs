//! Registered output encoders.
//!
//! Each encoder is a static descriptor: a name the host selects it by, the
//! file extension it produces, the function that writes one audio block, and
//! an optional function that finalizes the file before it is closed.

use std::fmt;

use crate::models::audio_models::AudioFrame;
use crate::models::error::WriterError;
use crate::session::pipeline::Pipeline;
use crate::storage::output_file::OutputFile;

pub mod aac;
pub mod raw;
pub mod wav;

/// Writes one block of audio through the pipeline. Runs on the audio thread.
pub type WriteFn = fn(&Pipeline, &AudioFrame<'_>) -> Result<(), WriterError>;

/// Finalizes an open file. Runs with the output lock held, before close.
pub type FinishFn = fn(&mut OutputFile) -> Result<(), WriterError>;

pub struct EncoderDescriptor {
    pub name: &'static str,
    pub extension: &'static str,
    pub write: WriteFn,
    pub finish: Option<FinishFn>,
}

impl PartialEq for EncoderDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for EncoderDescriptor {}

impl fmt::Debug for EncoderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncoderDescriptor")
            .field("name", &self.name)
            .field("extension", &self.extension)
            .field("finish", &self.finish.is_some())
            .finish()
    }
}

/// All encoders, in the order hosts list them. The first is the default.
pub static ENCODERS: [EncoderDescriptor; 3] = [
    EncoderDescriptor {
        name: wav::NAME,
        extension: "wav",
        write: wav::write_wav_packet,
        finish: Some(wav::finish_wav),
    },
    EncoderDescriptor {
        name: aac::NAME,
        extension: "aac",
        write: aac::write_aac_packet,
        finish: None,
    },
    EncoderDescriptor {
        name: raw::NAME,
        extension: "raw",
        write: raw::write_raw_packet,
        finish: None,
    },
];

/// Index of the encoder called `name`, falling back to the default.
pub fn encoder_index(name: &str) -> usize {
    ENCODERS.iter().position(|e| e.name == name).unwrap_or(0)
}

/// Encoder called `name`, falling back to the default.
pub fn find_encoder(name: &str) -> &'static EncoderDescriptor {
    &ENCODERS[encoder_index(name)]
}

/// Names of all registered encoders, for building a selection list.
pub fn names() -> impl Iterator<Item = &'static str> {
    ENCODERS.iter().map(|e| e.name)
}
