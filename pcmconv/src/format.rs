//! PCM buffer format descriptors.
//!
//! A [`Format`] describes one buffer: how each sample is encoded, how many
//! channels it carries, whether channels are interleaved or planar, and the
//! sample rate. Formats are plain values; the components that consume them
//! check the fields they need.

use std::fmt;
use std::time::Duration;

/// Maximum number of channels handled by the engine.
pub const MAX_CHANNELS: usize = 8;

/// Encoding of a single sample.
///
/// All multi-byte encodings are little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// 8-bit unsigned, offset binary (silence is 128).
    U8,
    /// 8-bit signed.
    I8,
    /// 16-bit signed.
    I16,
    /// 24-bit signed, packed in 3 bytes.
    I24,
    /// 24-bit signed in a 4-byte container: one zero padding byte followed
    /// by the 3 value bytes.
    I24In32,
    /// 32-bit signed.
    I32,
    /// 32-bit IEEE float, nominal range [-1.0, 1.0].
    F32,
    /// 64-bit IEEE float, nominal range [-1.0, 1.0].
    F64,
}

impl SampleFormat {
    /// Number of sample formats.
    pub const COUNT: usize = 8;

    /// Every sample format, in declaration order.
    pub const ALL: [SampleFormat; Self::COUNT] = [
        SampleFormat::U8,
        SampleFormat::I8,
        SampleFormat::I16,
        SampleFormat::I24,
        SampleFormat::I24In32,
        SampleFormat::I32,
        SampleFormat::F32,
        SampleFormat::F64,
    ];

    /// Returns the container size in bits.
    pub const fn bits(self) -> u32 {
        match self {
            SampleFormat::U8 | SampleFormat::I8 => 8,
            SampleFormat::I16 => 16,
            SampleFormat::I24 => 24,
            SampleFormat::I24In32 | SampleFormat::I32 | SampleFormat::F32 => 32,
            SampleFormat::F64 => 64,
        }
    }

    /// Returns the container size in bytes.
    pub const fn width(self) -> usize {
        (self.bits() / 8) as usize
    }

    /// Returns the number of significant bits of an integer sample.
    ///
    /// For float formats this is the container size.
    pub const fn value_bits(self) -> u32 {
        match self {
            SampleFormat::I24In32 => 24,
            other => other.bits(),
        }
    }

    /// Returns true for floating-point formats.
    pub const fn is_float(self) -> bool {
        matches!(self, SampleFormat::F32 | SampleFormat::F64)
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// Short lowercase name, e.g. `s16` or `f32`.
    pub const fn name(self) -> &'static str {
        match self {
            SampleFormat::U8 => "u8",
            SampleFormat::I8 => "s8",
            SampleFormat::I16 => "s16",
            SampleFormat::I24 => "s24",
            SampleFormat::I24In32 => "s24_32",
            SampleFormat::I32 => "s32",
            SampleFormat::F32 => "f32",
            SampleFormat::F64 => "f64",
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Describes the layout of one PCM buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Format {
    /// Sample encoding.
    pub sample_format: SampleFormat,
    /// Number of channels (1..=8).
    pub channels: u8,
    /// True if the channels of a frame are stored contiguously.
    pub interleaved: bool,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Source channel to copy when converting to a single channel
    /// ("pick one channel" mode). Only meaningful on a destination format.
    pub source_channel: Option<u8>,
}

impl Format {
    /// Creates an interleaved format.
    pub const fn interleaved(sample_format: SampleFormat, channels: u8, sample_rate: u32) -> Self {
        Self {
            sample_format,
            channels,
            interleaved: true,
            sample_rate,
            source_channel: None,
        }
    }

    /// Creates a planar (non-interleaved) format.
    pub const fn planar(sample_format: SampleFormat, channels: u8, sample_rate: u32) -> Self {
        Self {
            sample_format,
            channels,
            interleaved: false,
            sample_rate,
            source_channel: None,
        }
    }

    /// Requests that conversion into this format copies only `channel` of
    /// the source. The format should have exactly one channel.
    pub const fn with_source_channel(mut self, channel: u8) -> Self {
        self.source_channel = Some(channel);
        self
    }

    /// Returns the number of bytes per frame (one sample of every channel).
    pub fn frame_bytes(&self) -> usize {
        self.sample_format.width() * self.channels as usize
    }

    /// Returns the number of bytes needed for the given duration.
    pub fn bytes_in_duration(&self, duration: Duration) -> u64 {
        let bytes_rate = self.sample_rate as u64 * self.frame_bytes() as u64;
        (bytes_rate as u128 * duration.as_nanos() / 1_000_000_000) as u64
    }

    /// Returns the duration of the given number of bytes.
    pub fn duration(&self, bytes: u64) -> Duration {
        let bytes_rate = self.sample_rate as u64 * self.frame_bytes() as u64;
        if bytes_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos((bytes as u128 * 1_000_000_000 / bytes_rate as u128) as u64)
    }

    /// Returns the number of whole frames in the given number of bytes.
    pub fn frames(&self, bytes: u64) -> u64 {
        match self.frame_bytes() as u64 {
            0 => 0,
            n => bytes / n,
        }
    }
}

// Common device format presets
impl Format {
    /// 16-bit mono at 16kHz (speech capture)
    pub const S16_MONO_16K: Format = Format::interleaved(SampleFormat::I16, 1, 16000);
    /// 16-bit stereo at 44.1kHz (CD quality)
    pub const S16_STEREO_44K: Format = Format::interleaved(SampleFormat::I16, 2, 44100);
    /// 16-bit stereo at 48kHz
    pub const S16_STEREO_48K: Format = Format::interleaved(SampleFormat::I16, 2, 48000);
    /// Float stereo at 48kHz
    pub const F32_STEREO_48K: Format = Format::interleaved(SampleFormat::F32, 2, 48000);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_format_widths() {
        let widths: Vec<usize> = SampleFormat::ALL.iter().map(|f| f.width()).collect();
        assert_eq!(widths, vec![1, 1, 2, 3, 4, 4, 4, 8]);
        assert_eq!(SampleFormat::I24In32.value_bits(), 24);
        assert_eq!(SampleFormat::I32.value_bits(), 32);
    }

    #[test]
    fn test_sample_format_index_matches_all() {
        for (i, f) in SampleFormat::ALL.iter().enumerate() {
            assert_eq!(f.index(), i);
        }
    }

    #[test]
    fn test_sample_format_display() {
        assert_eq!(SampleFormat::I16.to_string(), "s16");
        assert_eq!(SampleFormat::I24In32.to_string(), "s24_32");
        assert_eq!(SampleFormat::F64.to_string(), "f64");
    }

    #[test]
    fn test_format_constructors() {
        let f = Format::planar(SampleFormat::F32, 6, 48000);
        assert!(!f.interleaved);
        assert_eq!(f.source_channel, None);

        let f = Format::interleaved(SampleFormat::I16, 1, 48000).with_source_channel(1);
        assert!(f.interleaved);
        assert_eq!(f.source_channel, Some(1));
    }

    #[test]
    fn test_frame_bytes() {
        assert_eq!(Format::S16_STEREO_48K.frame_bytes(), 4);
        assert_eq!(Format::interleaved(SampleFormat::I24, 6, 48000).frame_bytes(), 18);
    }

    #[test]
    fn test_bytes_in_duration() {
        let format = Format::S16_MONO_16K;
        assert_eq!(format.bytes_in_duration(Duration::from_secs(1)), 32000);
        assert_eq!(format.bytes_in_duration(Duration::from_millis(100)), 3200);

        // 48kHz stereo float: 384000 bytes per second
        assert_eq!(
            Format::F32_STEREO_48K.bytes_in_duration(Duration::from_millis(250)),
            96000
        );
    }

    #[test]
    fn test_duration() {
        let format = Format::S16_MONO_16K;
        assert_eq!(format.duration(32000), Duration::from_secs(1));
        assert_eq!(format.duration(3200), Duration::from_millis(100));

        let empty = Format::interleaved(SampleFormat::I16, 1, 0);
        assert_eq!(empty.duration(100), Duration::ZERO);
    }

    #[test]
    fn test_frames() {
        assert_eq!(Format::S16_STEREO_44K.frames(4410 * 4), 4410);
        assert_eq!(Format::S16_STEREO_44K.frames(7), 1);
        assert_eq!(Format::interleaved(SampleFormat::I16, 0, 44100).frames(8), 0);
    }
}
