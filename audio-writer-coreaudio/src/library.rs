use std::fmt;
use std::sync::{Arc, OnceLock};

use libloading::Library;

use crate::sys::{
    AudioConverterDisposeFn, AudioConverterFillComplexBufferFn, AudioConverterGetPropertyFn, AudioConverterNewFn,
    AudioConverterSetPropertyFn,
};

pub const AUDIO_TOOLBOX_PATH: &str = "/System/Library/Frameworks/AudioToolbox.framework/AudioToolbox";

/// Loaded once per process. `None` records that loading failed, so it is
/// never attempted again.
static LIBRARY: OnceLock<Option<Arc<AudioToolbox>>> = OnceLock::new();

/// Library handle plus the converter entry points.
pub struct AudioToolbox {
    #[allow(unused)]
    // Lib must stay alive while any converter holds the function pointers
    lib: Library,
    pub(crate) converter_new: AudioConverterNewFn,
    pub(crate) converter_dispose: AudioConverterDisposeFn,
    pub(crate) set_property: AudioConverterSetPropertyFn,
    pub(crate) get_property: AudioConverterGetPropertyFn,
    pub(crate) fill_complex_buffer: AudioConverterFillComplexBufferFn,
}

impl AudioToolbox {
    fn load() -> Result<Self, libloading::Error> {
        let lib = unsafe { Library::new(AUDIO_TOOLBOX_PATH) }?;
        let converter_new: AudioConverterNewFn = *unsafe { lib.get(b"AudioConverterNew") }?;
        let converter_dispose: AudioConverterDisposeFn = *unsafe { lib.get(b"AudioConverterDispose") }?;
        let set_property: AudioConverterSetPropertyFn = *unsafe { lib.get(b"AudioConverterSetProperty") }?;
        let get_property: AudioConverterGetPropertyFn = *unsafe { lib.get(b"AudioConverterGetProperty") }?;
        let fill_complex_buffer: AudioConverterFillComplexBufferFn =
            *unsafe { lib.get(b"AudioConverterFillComplexBuffer") }?;

        Ok(Self {
            lib,
            converter_new,
            converter_dispose,
            set_property,
            get_property,
            fill_complex_buffer,
        })
    }
}

impl fmt::Debug for AudioToolbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioToolbox").field("path", &AUDIO_TOOLBOX_PATH).finish()
    }
}

/// Shared AudioToolbox handle, loading it on first call.
pub fn audio_toolbox() -> Option<Arc<AudioToolbox>> {
    LIBRARY
        .get_or_init(|| match AudioToolbox::load() {
            Ok(lib) => {
                log::info!("Loaded AudioToolbox from {}", AUDIO_TOOLBOX_PATH);
                Some(Arc::new(lib))
            }
            Err(e) => {
                log::warn!("AudioToolbox unavailable, AAC output disabled: {}", e);
                None
            }
        })
        .clone()
}
