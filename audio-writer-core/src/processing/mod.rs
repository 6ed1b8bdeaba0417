pub mod adts;
pub mod interleave;
pub mod ring_buffer;
pub mod wav_format;
