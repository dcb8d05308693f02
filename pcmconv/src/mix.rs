//! Channel up/down-mixing.
//!
//! The mixer applies a [`GainMatrix`] across a buffer and always produces
//! interleaved `f32` samples clamped to [-1.0, 1.0]. The orchestrator then
//! converts that intermediate into the destination encoding and layout.

use crate::codec;
use crate::error::{Error, Result};
use crate::format::{Format, SampleFormat};
use crate::layout::{Buffer, ChannelView, planarize};
use crate::matrix::GainMatrix;

/// Mixes `frames` frames of `src` into `output_channels` channels.
///
/// Returns interleaved samples, `frames * output_channels` long.
pub fn mix(
    output_channels: u8,
    input: &Format,
    src: Buffer<'_>,
    frames: usize,
) -> Result<Vec<f32>> {
    crate::layout::check_layout(input, src.is_interleaved())?;
    let view = planarize(src, input.sample_format, input.channels, frames)?;

    let mut bytes = alloc_mix_buffer(frames, output_channels)?;
    mix_into(output_channels, &view, frames, &mut bytes)?;

    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Reserves the intermediate buffer for `frames` frames of `channels`
/// interleaved `f32` samples.
pub(crate) fn alloc_mix_buffer(frames: usize, channels: u8) -> Result<Vec<u8>> {
    let len = frames
        .checked_mul(channels as usize * SampleFormat::F32.width())
        .ok_or(Error::AllocationFailure(usize::MAX))?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailure(len))?;
    buf.resize(len, 0);
    Ok(buf)
}

/// Mixes `frames` frames from `src` into `out` as interleaved little-endian
/// `f32` samples.
///
/// `out` must hold at least `frames * output_channels * 4` bytes.
pub fn mix_into(
    output_channels: u8,
    src: &ChannelView<'_>,
    frames: usize,
    out: &mut [u8],
) -> Result<()> {
    let sample_format = src.sample_format();
    if !codec::is_supported(SampleFormat::F32, sample_format) {
        return Err(Error::UnsupportedFormatPair {
            src: sample_format,
            dst: SampleFormat::F32,
        });
    }

    let input_channels = src.channels() as u8;
    let matrix = GainMatrix::for_channels(input_channels, output_channels)?;

    let och = output_channels as usize;
    let needed = frames.checked_mul(och * 4).unwrap_or(usize::MAX);
    if out.len() < needed {
        return Err(Error::BufferTooSmall {
            needed,
            got: out.len(),
        });
    }

    for (oc, out_pos) in matrix.output().positions().enumerate() {
        let row = matrix.row(out_pos);
        for i in 0..frames {
            let mut sum = 0.0f64;
            for (ic, in_pos) in matrix.input().positions().enumerate() {
                let level = row[in_pos.index()];
                if level == 0.0 {
                    continue;
                }
                sum += codec::decode_normalized(sample_format, src.sample(ic, i)) * level;
            }
            let off = (i * och + oc) * 4;
            let v = codec::limit(sum) as f32;
            out[off..off + 4].copy_from_slice(&v.to_le_bytes());
        }
    }

    Ok(())
}
