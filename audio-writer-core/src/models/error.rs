use thiserror::Error;

/// Errors that can occur while writing captured audio to disk.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WriterError {
    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("codec unavailable: {0}")]
    CodecUnavailable(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    /// A previous open or write failure is latched; writes are dropped until
    /// the settings change or writing is restarted.
    #[error("output unavailable")]
    OutputUnavailable,
}

impl WriterError {
    /// Whether this error was already reported when it was latched.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::OutputUnavailable)
    }
}
