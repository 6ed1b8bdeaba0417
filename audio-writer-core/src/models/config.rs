use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::error::WriterError;

/// Filename format used when the host does not provide one.
pub const DEFAULT_FILENAME_FORMAT: &str = "audio-writer [%SRC] %CCYY-%MM-%DD %hh-%mm-%ss";

/// User-facing settings of one writer instance.
///
/// Field names match the keys of the host's settings blob, so the struct can
/// be deserialized straight from it. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterSettings {
    /// Directory where output files are created.
    pub folder_path: PathBuf,

    /// Filename pattern, see [`crate::storage::filename`] for tokens.
    pub filename_format: String,

    /// Name of the registered encoder (`internal-wav`, `coreaudio-aac`, `internal-raw`).
    pub output_encoder: String,
}

impl WriterSettings {
    /// Parse the host's JSON settings blob.
    pub fn from_json(json: &str) -> Result<Self, WriterError> {
        serde_json::from_str(json)
            .map_err(|e| WriterError::ConfigurationFailed(format!("invalid settings: {}", e)))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.folder_path.as_os_str().is_empty() {
            return Err("output folder is not set".into());
        }
        if self.filename_format.trim().is_empty() {
            return Err("filename format is empty".into());
        }
        Ok(())
    }
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self {
            folder_path: dirs::home_dir().unwrap_or_default(),
            filename_format: DEFAULT_FILENAME_FORMAT.into(),
            output_encoder: crate::encoders::ENCODERS[0].name.into(),
        }
    }
}
