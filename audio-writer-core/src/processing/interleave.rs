//! Planar to interleaved conversion shared by every encoder.

use crate::models::audio_models::{AudioFrame, BYTES_PER_SAMPLE};
use crate::processing::ring_buffer::RingBuffer;

/// Interleave `frame` into `scratch` as little-endian f32 bytes.
///
/// Output order is `[f0c0, f0c1, .., f1c0, ..]` over `channels` channels.
/// Missing or silent planes, and planes shorter than `frame_count`, are
/// filled with `0.0`. The scratch buffer only grows; the returned slice is
/// valid until the next call that touches `scratch`.
pub fn fill_interleaved<'s>(frame: &AudioFrame<'_>, channels: usize, scratch: &'s mut RingBuffer) -> &'s [u8] {
    let frame_count = frame.frame_count;
    let len = frame_count * channels * BYTES_PER_SAMPLE;

    scratch.upsize(len);
    let out = scratch.front_mut(len);

    for c in 0..channels {
        let plane = frame.plane(c).unwrap_or(&[]);
        for i in 0..frame_count {
            let sample = plane.get(i).copied().unwrap_or(0.0);
            let offset = (i * channels + c) * BYTES_PER_SAMPLE;
            out[offset..offset + BYTES_PER_SAMPLE].copy_from_slice(&sample.to_le_bytes());
        }
    }

    out
}
