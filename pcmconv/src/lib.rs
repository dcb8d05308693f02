//! PCM sample format, channel layout and gain conversion.
//!
//! This crate converts raw PCM blocks between sample encodings, channel
//! counts and interleaved/planar arrangements, and scales them by a linear
//! gain. It never resamples: formats with different sample rates are
//! rejected.
//!
//! ## Components
//!
//! - [`Format`]: describes one buffer (encoding, channels, layout, rate)
//! - [`convert()`] / [`Converter`]: block conversion between two formats
//! - [`apply_gain`]: volume scaling with saturation
//! - [`mix::mix`]: up/down-mixing into an `f32` intermediate
//! - [`codec`]: the per-sample conversion table
//!
//! ## Example
//!
//! ```rust
//! use giztoy_pcmconv::{Buffer, BufferMut, Format, SampleFormat, convert};
//!
//! // 5.1 s16 capture, two frames
//! let src_format = Format::interleaved(SampleFormat::I16, 6, 48000);
//! let src = vec![0u8; 2 * src_format.frame_bytes()];
//!
//! // Downmix to float stereo
//! let dst_format = Format::F32_STEREO_48K;
//! let mut dst = vec![0u8; 2 * dst_format.frame_bytes()];
//!
//! convert(
//!     &dst_format,
//!     BufferMut::Interleaved(&mut dst),
//!     &src_format,
//!     Buffer::Interleaved(&src),
//!     2,
//! )?;
//! # Ok::<(), giztoy_pcmconv::Error>(())
//! ```

pub mod channel;
pub mod codec;
mod convert;
mod error;
mod format;
pub mod gain;
pub mod layout;
pub mod matrix;
pub mod mix;
pub mod stereo;

pub use channel::{ChannelMask, Position};
pub use convert::{ConvertOptions, Converter, convert};
pub use error::{Error, Result};
pub use format::{Format, MAX_CHANNELS, SampleFormat};
pub use gain::{apply_gain, apply_gain_in_place};
pub use layout::{Buffer, BufferMut, ChannelView, ChannelViewMut, Layout};
pub use matrix::GainMatrix;
