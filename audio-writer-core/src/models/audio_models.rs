/// Size in bytes of one sample; the pipeline always carries 32-bit float.
pub const BYTES_PER_SAMPLE: usize = 4;

/// Sample rate and channel layout of the tapped stream.
///
/// Observed from the first frame an instance sees and assumed constant for
/// the rest of its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl StreamFormat {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self { sample_rate, channels }
    }

    /// Bytes occupied by one interleaved frame (one sample of every channel).
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * BYTES_PER_SAMPLE
    }
}

/// One block of planar audio delivered by the host's audio thread.
///
/// Each plane holds `frame_count` samples of one channel. A `None` plane is a
/// channel whose source is not producing audio yet and is written as silence.
#[derive(Debug, Clone, Copy)]
pub struct AudioFrame<'a> {
    pub planes: &'a [Option<&'a [f32]>],
    pub frame_count: usize,
    pub sample_rate: u32,
}

impl<'a> AudioFrame<'a> {
    pub fn new(planes: &'a [Option<&'a [f32]>], frame_count: usize, sample_rate: u32) -> Self {
        Self {
            planes,
            frame_count,
            sample_rate,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.planes.len()
    }

    pub fn format(&self) -> StreamFormat {
        StreamFormat::new(self.sample_rate, self.planes.len() as u16)
    }

    /// Samples of channel `index`, or `None` if the channel is silent or absent.
    pub fn plane(&self, index: usize) -> Option<&'a [f32]> {
        self.planes.get(index).copied().flatten()
    }
}
