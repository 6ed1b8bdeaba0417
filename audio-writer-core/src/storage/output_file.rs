use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::encoders::EncoderDescriptor;
use crate::models::config::WriterSettings;
use crate::models::error::WriterError;
use crate::storage::filename::FilenameGenerator;

/// Attempts at claiming a fresh name when another writer wins the race for it.
const CREATE_ATTEMPTS: usize = 3;

/// The single output file of one writer instance.
///
/// State machine:
/// ```text
/// closed --open--> open --close--> closed
/// ```
/// Opening generates a new filename every time. Closing runs the finish
/// callback of the encoder that opened the file (WAV patches its header)
/// while the handle is still open.
///
/// While disabled (the owning writer is inactive) opens report
/// [`WriterError::OutputUnavailable`], so a block racing with a stop trigger
/// cannot start a new file after the old one was closed.
///
/// Open and write failures are latched: further opens report
/// [`WriterError::OutputUnavailable`] until [`clear_failure`](Self::clear_failure)
/// is called, so the audio thread never retries file creation on every block.
///
/// Not synchronized; the owning writer keeps it behind its output mutex.
#[derive(Debug)]
pub struct OutputFile {
    folder: PathBuf,
    filename_format: String,
    source_name: String,
    path: Option<PathBuf>,
    file: Option<BufWriter<File>>,
    encoder: Option<&'static EncoderDescriptor>,
    has_header: bool,
    bytes_written: u64,
    enabled: bool,
    failed: bool,
}

impl OutputFile {
    pub fn new(source_name: impl Into<String>, settings: &WriterSettings) -> Self {
        Self {
            folder: settings.folder_path.clone(),
            filename_format: settings.filename_format.clone(),
            source_name: source_name.into(),
            path: None,
            file: None,
            encoder: None,
            has_header: false,
            bytes_written: 0,
            enabled: true,
            failed: false,
        }
    }

    /// Open a new file for `encoder` unless one is already open for it.
    ///
    /// A file opened by a different encoder is finalized and closed first;
    /// container formats cannot be mixed within one file.
    pub fn open(&mut self, encoder: &'static EncoderDescriptor) -> Result<(), WriterError> {
        if self.file.is_some() {
            if self.encoder == Some(encoder) {
                return Ok(());
            }
            if let Err(e) = self.close() {
                log::error!("Failed to finalize output before switching encoder: {}", e);
            }
        }

        if !self.enabled || self.failed {
            return Err(WriterError::OutputUnavailable);
        }

        let (path, file) = match self.create(encoder) {
            Ok(created) => created,
            Err(e) => {
                self.failed = true;
                return Err(e);
            }
        };

        log::info!("Writing {} output to {}", encoder.name, path.display());
        self.file = Some(BufWriter::new(file));
        self.path = Some(path);
        self.encoder = Some(encoder);
        self.has_header = false;
        self.bytes_written = 0;
        Ok(())
    }

    /// Finalize and close the file. No-op when already closed.
    ///
    /// The handle is released even if finalizing fails.
    pub fn close(&mut self) -> Result<(), WriterError> {
        if self.file.is_none() {
            return Ok(());
        }

        let finished = match self.encoder.and_then(|e| e.finish) {
            Some(finish) => finish(self),
            None => Ok(()),
        };

        let flushed = match self.file.take() {
            Some(mut file) => file
                .flush()
                .map_err(|e| WriterError::StorageError(format!("flush failed: {}", e))),
            None => Ok(()),
        };
        self.encoder = None;

        if let Some(ref path) = self.path {
            log::info!("Closed {} ({} bytes of audio)", path.display(), self.bytes_written);
        }
        finished.and(flushed)
    }

    /// Append payload bytes and count them in [`bytes_written`](Self::bytes_written).
    pub fn write(&mut self, data: &[u8]) -> Result<(), WriterError> {
        self.write_raw(data)?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    /// Write the container header; not counted as payload.
    pub fn write_header(&mut self, header: &[u8]) -> Result<(), WriterError> {
        self.write_raw(header)?;
        self.has_header = true;
        Ok(())
    }

    /// Apply a new output folder.
    ///
    /// If it differs from the directory of the current filename, the file is
    /// closed and the cached name dropped; the next write opens a new file in
    /// the new folder. Returns whether that rotation happened.
    pub fn set_folder(&mut self, folder: &Path) -> bool {
        let changed = self
            .path
            .as_deref()
            .and_then(Path::parent)
            .is_some_and(|current| current != folder);

        self.folder = folder.to_path_buf();
        if changed {
            log::debug!("Output folder changed to {}, rotating", folder.display());
            if let Err(e) = self.close() {
                log::error!("Failed to finalize output on folder change: {}", e);
            }
            self.path = None;
        }
        changed
    }

    pub fn set_filename_format(&mut self, format: &str) {
        self.filename_format = format.to_string();
    }

    /// Allow or refuse new files. Does not close a file that is already open.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Forget a latched open/write failure so the next write tries again.
    pub fn clear_failure(&mut self) {
        self.failed = false;
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn has_failed(&self) -> bool {
        self.failed
    }

    pub fn has_header(&self) -> bool {
        self.has_header
    }

    /// Payload bytes written since the file was opened, headers excluded.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Path of the current (or most recently generated) file.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Encoder that opened the current file.
    pub fn encoder(&self) -> Option<&'static EncoderDescriptor> {
        self.encoder
    }

    /// Direct access to the open handle, for finish callbacks that seek.
    pub fn handle_mut(&mut self) -> Option<&mut BufWriter<File>> {
        self.file.as_mut()
    }

    #[cfg(test)]
    pub(crate) fn set_bytes_written(&mut self, bytes: u64) {
        self.bytes_written = bytes;
    }

    fn create(&self, encoder: &EncoderDescriptor) -> Result<(PathBuf, File), WriterError> {
        fs::create_dir_all(&self.folder).map_err(|e| {
            WriterError::StorageError(format!("failed to create {}: {}", self.folder.display(), e))
        })?;

        let generator = FilenameGenerator::new(&self.folder, &self.filename_format, &self.source_name, encoder.extension);
        let mut last_error = None;
        for _ in 0..CREATE_ATTEMPTS {
            let path = generator.generate()?;
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => last_error = Some(e),
                Err(e) => {
                    return Err(WriterError::StorageError(format!(
                        "failed to create {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }

        Err(WriterError::StorageError(format!(
            "no free filename in {}: {}",
            self.folder.display(),
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), WriterError> {
        let file = self.file.as_mut().ok_or(WriterError::OutputUnavailable)?;
        if let Err(e) = file.write_all(data) {
            self.fail();
            return Err(WriterError::StorageError(format!("write failed: {}", e)));
        }
        Ok(())
    }

    /// Drop the handle after an I/O error and latch the failure.
    fn fail(&mut self) {
        let _ = self.close();
        self.failed = true;
    }
}

impl Drop for OutputFile {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::error!("Failed to finalize output: {}", e);
        }
    }
}
