//! ADTS (Audio Data Transport Stream) framing for raw AAC packets.
//!
//! Header layout, 7 bytes without CRC:
//! ```text
//! 12 bits  syncword 0xFFF
//!  1 bit   ID (0 = MPEG-4)
//!  2 bits  layer (0)
//!  1 bit   protection_absent (1, no CRC)
//!  2 bits  profile (audio object type - 1; AAC-LC = 1)
//!  4 bits  sampling_frequency_index
//!  1 bit   private (0)
//!  3 bits  channel_configuration
//!  4 bits  originality, home, copyright id, copyright start (0)
//! 13 bits  frame_length (header + payload)
//! 11 bits  buffer_fullness (0x7FF = VBR)
//!  2 bits  raw data blocks in frame - 1 (0)
//! ```

/// Length of an ADTS header without CRC.
pub const ADTS_HEADER_LENGTH: usize = 7;

/// Largest value the 13-bit frame_length field can carry.
pub const MAX_FRAME_LENGTH: usize = 0x1FFF;

/// MPEG-4 audio object type for AAC-LC.
const AAC_OBJECT_LC: u8 = 2;

const BUFFER_FULLNESS_VBR: u32 = 0x7FF;

const SAMPLE_RATE_TABLE: [u32; 12] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000,
];

/// Index of `sample_rate` in the ADTS sampling frequency table.
///
/// Unknown rates map to index 4 (44100 Hz).
pub fn sample_rate_index(sample_rate: u32) -> u8 {
    SAMPLE_RATE_TABLE
        .iter()
        .position(|&rate| rate == sample_rate)
        .map(|index| index as u8)
        .unwrap_or(4)
}

/// ADTS channel_configuration for a channel count.
///
/// Counts 1-7 map directly; 8 channels (7.1) is configuration 7.
pub fn channel_configuration(channels: u16) -> u8 {
    match channels {
        8 => 7,
        n => (n & 0x7) as u8,
    }
}

/// Build the header that precedes an AAC-LC packet of `payload_len` bytes.
///
/// `payload_len + 7` must fit in 13 bits; see [`MAX_FRAME_LENGTH`].
pub fn adts_header(payload_len: usize, sample_rate: u32, channels: u16) -> [u8; ADTS_HEADER_LENGTH] {
    let frame_length = (ADTS_HEADER_LENGTH + payload_len) as u32 & MAX_FRAME_LENGTH as u32;
    let profile = AAC_OBJECT_LC - 1;
    let freq_index = sample_rate_index(sample_rate);
    let channel_config = channel_configuration(channels);

    let mut header = [0u8; ADTS_HEADER_LENGTH];
    header[0] = 0xFF;
    // sync low nibble | ID 0 | layer 00 | protection_absent 1
    header[1] = 0xF0 | 0x01;
    header[2] = (profile << 6) | (freq_index << 2) | (channel_config >> 2);
    header[3] = ((channel_config & 0x3) << 6) | ((frame_length >> 11) & 0x3) as u8;
    header[4] = ((frame_length >> 3) & 0xFF) as u8;
    header[5] = (((frame_length & 0x7) << 5) | (BUFFER_FULLNESS_VBR >> 6)) as u8;
    header[6] = ((BUFFER_FULLNESS_VBR & 0x3F) << 2) as u8;
    header
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reads big-endian bit fields off the front of a byte slice.
    struct BitReader<'a> {
        bytes: &'a [u8],
        position: usize,
    }

    impl<'a> BitReader<'a> {
        fn new(bytes: &'a [u8]) -> Self {
            Self { bytes, position: 0 }
        }

        fn read(&mut self, bits: usize) -> u32 {
            let mut value = 0u32;
            for _ in 0..bits {
                let byte = self.bytes[self.position / 8];
                let bit = (byte >> (7 - self.position % 8)) & 1;
                value = (value << 1) | bit as u32;
                self.position += 1;
            }
            value
        }
    }

    #[derive(Debug, PartialEq)]
    struct Decoded {
        syncword: u32,
        id: u32,
        layer: u32,
        protection_absent: u32,
        profile: u32,
        freq_index: u32,
        private: u32,
        channel_config: u32,
        copyright_bits: u32,
        frame_length: u32,
        buffer_fullness: u32,
        frames_minus_one: u32,
    }

    fn decode(header: &[u8; ADTS_HEADER_LENGTH]) -> Decoded {
        let mut r = BitReader::new(header);
        let decoded = Decoded {
            syncword: r.read(12),
            id: r.read(1),
            layer: r.read(2),
            protection_absent: r.read(1),
            profile: r.read(2),
            freq_index: r.read(4),
            private: r.read(1),
            channel_config: r.read(3),
            copyright_bits: r.read(4),
            frame_length: r.read(13),
            buffer_fullness: r.read(11),
            frames_minus_one: r.read(2),
        };
        assert_eq!(r.position, 56);
        decoded
    }

    #[test]
    fn known_bytes_stereo_44100() {
        // 371-byte payload, 44.1 kHz stereo.
        let header = adts_header(371, 44100, 2);
        assert_eq!(header, [0xFF, 0xF1, 0x50, 0x80, 0x2F, 0x5F, 0xFC]);
    }

    #[test]
    fn fields_decode_for_every_table_rate() {
        for (index, &rate) in SAMPLE_RATE_TABLE.iter().enumerate() {
            for payload in [0usize, 1, 255, 256, 1024, 2047, 6144, MAX_FRAME_LENGTH - 7] {
                let decoded = decode(&adts_header(payload, rate, 2));

                assert_eq!(decoded.syncword, 0xFFF);
                assert_eq!(decoded.id, 0);
                assert_eq!(decoded.layer, 0);
                assert_eq!(decoded.protection_absent, 1);
                assert_eq!(decoded.profile, 1);
                assert_eq!(decoded.freq_index, index as u32, "rate {}", rate);
                assert_eq!(decoded.private, 0);
                assert_eq!(decoded.channel_config, 2);
                assert_eq!(decoded.copyright_bits, 0);
                assert_eq!(decoded.frame_length, 7 + payload as u32, "payload {}", payload);
                assert_eq!(decoded.buffer_fullness, 0x7FF);
                assert_eq!(decoded.frames_minus_one, 0);
            }
        }
    }

    #[test]
    fn channel_configuration_spans_byte_boundary() {
        for channels in 1..=7u16 {
            let decoded = decode(&adts_header(100, 48000, channels));
            assert_eq!(decoded.channel_config, channels as u32);
        }
        assert_eq!(decode(&adts_header(100, 48000, 8)).channel_config, 7);
    }

    #[test]
    fn unknown_rate_defaults_to_44100() {
        assert_eq!(sample_rate_index(48000), 3);
        assert_eq!(sample_rate_index(44100), 4);
        assert_eq!(sample_rate_index(8000), 11);
        assert_eq!(sample_rate_index(192000), 4);
        assert_eq!(sample_rate_index(0), 4);
    }
}
