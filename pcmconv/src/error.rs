//! Error types for PCM conversion.

use crate::channel::{ChannelMask, Position};
use crate::format::SampleFormat;

/// Result type alias for pcmconv.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for conversion and gain operations.
///
/// Every error is detected before the operation writes to the destination
/// buffer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Channel count has no channel mask, or exceeds the supported maximum.
    #[error("unsupported channel count: {0}")]
    UnsupportedChannelCount(u8),

    /// A source position has nowhere to go in the destination layout.
    #[error("cannot mix {position} into {output}")]
    UnmixableLayout {
        position: Position,
        output: ChannelMask,
    },

    /// Source and destination sample rates differ.
    #[error("sample rate mismatch: {src} Hz -> {dst} Hz")]
    RateMismatch { src: u32, dst: u32 },

    /// No element conversion is defined for the pair.
    #[error("unsupported conversion: {src} -> {dst}")]
    UnsupportedFormatPair { src: SampleFormat, dst: SampleFormat },

    /// The operation does not handle this sample format.
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(SampleFormat),

    /// The transient mix buffer could not be reserved.
    #[error("failed to allocate {0} bytes for mix buffer")]
    AllocationFailure(usize),

    /// Invalid "pick one channel" request.
    #[error("cannot select channel {channel} from {channels} channels")]
    ChannelSelection { channel: u8, channels: u8 },

    /// Buffer variant disagrees with the format's interleaved flag.
    #[error("buffer layout mismatch: format expects {} data", layout_name(.expected_interleaved))]
    LayoutMismatch { expected_interleaved: bool },

    /// Buffer cannot hold the requested number of frames.
    #[error("buffer too small: need {needed} bytes, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
}

fn layout_name(interleaved: &bool) -> &'static str {
    if *interleaved { "interleaved" } else { "planar" }
}
