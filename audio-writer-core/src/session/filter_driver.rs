use std::path::PathBuf;
use std::sync::Arc;

use crate::encoders::{encoder_index, EncoderDescriptor, ENCODERS};
use crate::models::audio_models::{AudioFrame, StreamFormat};
use crate::models::config::WriterSettings;
use crate::models::error::WriterError;
use crate::models::state::{HostEvent, WritingTriggers};
use crate::session::pipeline::Pipeline;
use crate::storage::output_file::OutputFile;
use crate::traits::codec::CodecProvider;

/// One audio writer attached to one source.
///
/// All methods take `&self`; share the driver through an `Arc` between the
/// audio thread (which calls [`filter_audio`](Self::filter_audio)) and the
/// host threads that deliver settings and triggers.
///
/// ```text
/// [AudioFrame] → filter_audio → ENCODERS[active].write → [Pipeline] → [OutputFile]
///                                        ↑
/// update / start_writing / stop_writing ─┘ (output lock)
/// ```
pub struct FilterDriver {
    source_name: String,
    pipeline: Pipeline,
    triggers: WritingTriggers,
}

impl FilterDriver {
    pub fn new(source_name: impl Into<String>, settings: &WriterSettings, codec: Arc<dyn CodecProvider>) -> Self {
        let source_name = source_name.into();
        if let Err(e) = settings.validate() {
            log::warn!("[{}] {}", source_name, e);
        }

        let mut file = OutputFile::new(source_name.clone(), settings);
        file.set_enabled(false);

        Self {
            pipeline: Pipeline::new(file, encoder_index(&settings.output_encoder), codec),
            triggers: WritingTriggers::new(),
            source_name,
        }
    }

    /// Apply new settings.
    ///
    /// A different folder closes the current file; a different encoder
    /// finalizes and closes it. Either way the next block opens a new file.
    /// Any latched output failure is cleared.
    pub fn update(&self, settings: &WriterSettings) {
        if let Err(e) = settings.validate() {
            log::warn!("[{}] {}", self.source_name, e);
        }
        let index = encoder_index(&settings.output_encoder);

        let mut output = self.pipeline.output.lock();
        output.file.set_folder(&settings.folder_path);
        output.file.set_filename_format(&settings.filename_format);

        let previous = self.pipeline.select_encoder(index);
        if previous != index {
            log::info!(
                "[{}] Output encoder changed from {} to {}",
                self.source_name,
                ENCODERS[previous].name,
                ENCODERS[index].name
            );
            if let Err(e) = output.file.close() {
                log::error!("[{}] Failed to finalize output: {}", self.source_name, e);
            }
        }

        output.file.clear_failure();
    }

    /// One more activity source wants output.
    pub fn start_writing(&self) {
        let count = self.triggers.start();

        let mut output = self.pipeline.output.lock();
        output.file.clear_failure();
        output.file.set_enabled(true);
        if count == 1 {
            // Leftovers from an earlier session must not lead the new file.
            self.pipeline.producer.lock().input.reset();
            log::info!("[{}] Writing started", self.source_name);
        }
    }

    /// One activity source is done. The file is finalized and closed once
    /// no source is left.
    pub fn stop_writing(&self) {
        let remaining = self.triggers.stop();
        if remaining > 0 {
            log::debug!("[{}] Still writing for {} source(s)", self.source_name, remaining);
            return;
        }

        let mut output = self.pipeline.output.lock();
        // A start that slipped in before we got the lock wins.
        if self.triggers.is_active() {
            return;
        }
        output.file.set_enabled(false);
        if let Err(e) = output.file.close() {
            log::error!("[{}] Failed to finalize output: {}", self.source_name, e);
        }
        self.pipeline.producer.lock().input.reset();
        log::info!("[{}] Writing stopped", self.source_name);
    }

    pub fn handle_event(&self, event: HostEvent) {
        if event.is_start() {
            self.start_writing();
        } else {
            self.stop_writing();
        }
    }

    /// Audio callback. Writes the block if writing is active; the block
    /// itself is never modified.
    pub fn filter_audio(&self, frame: &AudioFrame<'_>) {
        if !self.triggers.is_active() || frame.frame_count == 0 {
            return;
        }

        let encoder = self.encoder();
        if let Err(e) = (encoder.write)(&self.pipeline, frame) {
            self.report(encoder, &e);
        }
    }

    pub fn is_writing(&self) -> bool {
        self.triggers.is_active()
    }

    /// Number of activity sources currently asking for output.
    pub fn active_sources(&self) -> u32 {
        self.triggers.count()
    }

    pub fn encoder(&self) -> &'static EncoderDescriptor {
        self.pipeline.encoder()
    }

    /// Path of the file currently open, if any.
    pub fn current_file(&self) -> Option<PathBuf> {
        let output = self.pipeline.output.lock();
        if output.file.is_open() {
            output.file.path().map(|p| p.to_path_buf())
        } else {
            None
        }
    }

    pub fn stream_format(&self) -> Option<StreamFormat> {
        self.pipeline.observed_format()
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    fn report(&self, encoder: &EncoderDescriptor, error: &WriterError) {
        match error {
            e if e.is_silent() => {}
            WriterError::ConfigurationFailed(_) | WriterError::CodecUnavailable(_) => {
                log::warn!("[{}] {} output disabled: {}", self.source_name, encoder.name, error)
            }
            _ => log::error!("[{}] {} write failed: {}", self.source_name, encoder.name, error),
        }
    }
}

impl Drop for FilterDriver {
    fn drop(&mut self) {
        let output = self.pipeline.output.get_mut();
        if let Err(e) = output.file.close() {
            log::error!("[{}] Failed to finalize output on teardown: {}", self.source_name, e);
        }
    }
}
