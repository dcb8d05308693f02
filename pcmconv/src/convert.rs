//! Block conversion between two formats.
//!
//! [`Converter::convert`] decides per call how to get from the source
//! format to the destination format:
//!
//! 1. Validate channel counts, sample rates and buffer layouts.
//! 2. Route channels: pass through when counts match, re-address a single
//!    source channel in "pick one channel" mode, or mix through an `f32`
//!    intermediate when counts differ.
//! 3. Copy bytes directly when the encodings already match.
//! 4. Use the stereo fast path for common two-channel conversions.
//! 5. Otherwise convert sample by sample through the codec table.
//!
//! Steps 3 and 4 can be disabled with [`ConvertOptions`]; they never change
//! the output, only the route taken.

use tracing::trace;

use crate::codec::{self, Conversion};
use crate::error::{Error, Result};
use crate::format::{Format, MAX_CHANNELS, SampleFormat};
use crate::layout::{
    Buffer, BufferMut, ChannelView, ChannelViewMut, check_layout, planarize, planarize_mut,
};
use crate::mix;
use crate::stereo;

/// Options for configuring a [`Converter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Copy bytes directly when source and destination encodings match.
    pub copy_fast_path: bool,
    /// Use the two-channel fast path for its known conversions.
    pub stereo_fast_path: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            copy_fast_path: true,
            stereo_fast_path: true,
        }
    }
}

impl ConvertOptions {
    /// Disables the direct copy path.
    pub fn without_copy_fast_path(mut self) -> Self {
        self.copy_fast_path = false;
        self
    }

    /// Disables the stereo fast path.
    pub fn without_stereo_fast_path(mut self) -> Self {
        self.stereo_fast_path = false;
        self
    }

    /// Disables every fast path; all conversions use the generic loop.
    pub fn generic_only() -> Self {
        Self::default()
            .without_copy_fast_path()
            .without_stereo_fast_path()
    }
}

/// Converts PCM blocks between formats.
///
/// A converter holds no buffers; the same value can be used from many
/// threads at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct Converter {
    opts: ConvertOptions,
}

/// How source channels reach the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Direct,
    Pick(u8),
    Mix,
}

impl Route {
    fn resolve(dst: &Format, src: &Format) -> Result<Self> {
        match dst.source_channel {
            Some(channel) if dst.channels == 1 => Ok(Route::Pick(channel)),
            Some(channel) => Err(Error::ChannelSelection {
                channel,
                channels: src.channels,
            }),
            None if dst.channels == src.channels => Ok(Route::Direct),
            None => Ok(Route::Mix),
        }
    }
}

fn check_channels(format: &Format) -> Result<()> {
    if format.channels == 0 || format.channels as usize > MAX_CHANNELS {
        return Err(Error::UnsupportedChannelCount(format.channels));
    }
    Ok(())
}

impl Converter {
    /// Creates a converter with the given options.
    pub fn new(opts: ConvertOptions) -> Self {
        Self { opts }
    }

    /// Returns the converter options.
    pub fn options(&self) -> &ConvertOptions {
        &self.opts
    }

    /// Converts `frames` frames of `src` into `dst`.
    ///
    /// Both buffers must match their format's layout and hold at least
    /// `frames` frames. Every check runs before the first byte of `dst` is
    /// written; on error the contents of `dst` are unchanged.
    pub fn convert(
        &self,
        dst_format: &Format,
        mut dst: BufferMut<'_>,
        src_format: &Format,
        src: Buffer<'_>,
        frames: usize,
    ) -> Result<()> {
        check_channels(src_format)?;
        check_channels(dst_format)?;
        if src_format.sample_rate != dst_format.sample_rate {
            return Err(Error::RateMismatch {
                src: src_format.sample_rate,
                dst: dst_format.sample_rate,
            });
        }
        check_layout(src_format, src.is_interleaved())?;
        check_layout(dst_format, dst.is_interleaved())?;

        let route = Route::resolve(dst_format, src_format)?;
        let intermediate = match route {
            Route::Mix => {
                codec::lookup(SampleFormat::F32, src_format.sample_format)?;
                SampleFormat::F32
            }
            _ => src_format.sample_format,
        };
        let kernel = codec::lookup(dst_format.sample_format, intermediate)?;

        let input = planarize(src, src_format.sample_format, src_format.channels, frames)?;
        let mut output = planarize_mut(
            &mut dst,
            dst_format.sample_format,
            dst_format.channels,
            frames,
        )?;

        let mix_buf: Vec<u8>;
        let from = match route {
            Route::Direct => input,
            Route::Pick(channel) => {
                trace!("Picking channel {} of {}", channel, src_format.channels);
                input.select(channel)?
            }
            Route::Mix => {
                trace!(
                    "Mixing {} -> {} channels ({} frames)",
                    src_format.channels, dst_format.channels, frames
                );
                let mut buf = mix::alloc_mix_buffer(frames, dst_format.channels)?;
                mix::mix_into(dst_format.channels, &input, frames, &mut buf)?;
                mix_buf = buf;
                planarize(
                    Buffer::Interleaved(&mix_buf),
                    SampleFormat::F32,
                    dst_format.channels,
                    frames,
                )?
            }
        };

        self.run(kernel, &from, &mut output, frames);
        Ok(())
    }

    fn run(
        &self,
        kernel: Conversion,
        from: &ChannelView<'_>,
        to: &mut ChannelViewMut<'_, '_>,
        frames: usize,
    ) {
        let src = from.sample_format();
        let dst = to.sample_format();

        if self.opts.copy_fast_path && src == dst && copy_direct(from, to, frames) {
            trace!("Copied {} frames of {}", frames, src);
            return;
        }

        if self.opts.stereo_fast_path
            && from.channels() == 2
            && stereo::has_route(src, from.layout(), dst, to.layout())
            && stereo::convert(kernel, from, to, frames)
        {
            trace!("Stereo fast path {} -> {} ({} frames)", src, dst, frames);
            return;
        }

        trace!("Generic conversion {} -> {} ({} frames)", src, dst, frames);
        for ch in 0..from.channels() {
            for i in 0..frames {
                kernel(from.sample(ch, i), to.sample_mut(ch, i));
            }
        }
    }
}

/// Copies samples without conversion when the addressing allows whole-run
/// copies. Returns false if nothing was written.
fn copy_direct(from: &ChannelView<'_>, to: &mut ChannelViewMut<'_, '_>, frames: usize) -> bool {
    if let Some(s) = from.as_interleaved(frames) {
        if let Some(d) = to.as_interleaved_mut(frames) {
            d.copy_from_slice(s);
            return true;
        }
    }
    if !from.is_packed() || !to.is_packed() {
        return false;
    }
    for ch in 0..from.channels() {
        match (from.contiguous(ch, frames), to.contiguous_mut(ch, frames)) {
            (Some(s), Some(d)) => d.copy_from_slice(s),
            _ => return false,
        }
    }
    true
}

/// Converts `frames` frames of `src` into `dst` with default options.
///
/// See [`Converter::convert`].
pub fn convert(
    dst_format: &Format,
    dst: BufferMut<'_>,
    src_format: &Format,
    src: Buffer<'_>,
    frames: usize,
) -> Result<()> {
    Converter::default().convert(dst_format, dst, src_format, src, frames)
}
