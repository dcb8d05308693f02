//! Linear gain (volume) scaling.
//!
//! Integer samples are scaled in the normalized domain and written back with
//! the same rounding and saturation rules as sample conversion. Float
//! samples are multiplied directly and are not clamped.

use crate::codec;
use crate::error::{Error, Result};
use crate::format::{Format, SampleFormat};
use crate::layout::{Buffer, BufferMut, check_layout, planarize, planarize_mut};

fn check_format(format: &Format) -> Result<()> {
    match format.sample_format {
        SampleFormat::U8 | SampleFormat::I24In32 => {
            Err(Error::UnsupportedFormat(format.sample_format))
        }
        _ => Ok(()),
    }
}

#[inline]
fn scale_sample(sample_format: SampleFormat, gain: f64, src: &[u8], dst: &mut [u8]) {
    match sample_format {
        SampleFormat::F32 => {
            let v = f32::from_le_bytes([src[0], src[1], src[2], src[3]]) as f64 * gain;
            dst[..4].copy_from_slice(&(v as f32).to_le_bytes());
        }
        SampleFormat::F64 => {
            let v = codec::decode_normalized(sample_format, src) * gain;
            dst[..8].copy_from_slice(&v.to_le_bytes());
        }
        _ => {
            let v = codec::decode_normalized(sample_format, src) * gain;
            codec::encode_normalized(sample_format, v, dst);
        }
    }
}

/// Multiplies every sample of `src` by `gain` and writes the result to
/// `dst`.
///
/// Supports `I8`, `I16`, `I24`, `I32`, `F32` and `F64`. A gain of exactly
/// 1.0 copies the samples unchanged.
pub fn apply_gain(
    format: &Format,
    gain: f64,
    src: Buffer<'_>,
    mut dst: BufferMut<'_>,
    frames: usize,
) -> Result<()> {
    check_format(format)?;
    check_layout(format, src.is_interleaved())?;
    check_layout(format, dst.is_interleaved())?;

    let sample_format = format.sample_format;
    let from = planarize(src, sample_format, format.channels, frames)?;
    let mut to = planarize_mut(&mut dst, sample_format, format.channels, frames)?;
    let channels = from.channels();

    if gain == 1.0 {
        tracing::trace!("Unity gain, copying {} frames", frames);
        if let (Some(s), Some(d)) = (from.as_interleaved(frames), to.as_interleaved_mut(frames)) {
            d.copy_from_slice(s);
            return Ok(());
        }
        for ch in 0..channels {
            let runs = (from.contiguous(ch, frames), to.contiguous_mut(ch, frames));
            if let (Some(s), Some(d)) = runs {
                d.copy_from_slice(s);
            }
        }
        return Ok(());
    }

    if channels == 2 && sample_format == SampleFormat::F32 {
        if let (Some(s), Some(d)) = (from.as_interleaved(frames), to.as_interleaved_mut(frames)) {
            for (i, o) in s.chunks_exact(8).zip(d.chunks_exact_mut(8)) {
                scale_sample(sample_format, gain, &i[..4], &mut o[..4]);
                scale_sample(sample_format, gain, &i[4..], &mut o[4..]);
            }
            return Ok(());
        }
    }

    for ch in 0..channels {
        for i in 0..frames {
            scale_sample(sample_format, gain, from.sample(ch, i), to.sample_mut(ch, i));
        }
    }
    Ok(())
}

/// Multiplies every sample of `buf` by `gain` in place.
pub fn apply_gain_in_place(
    format: &Format,
    gain: f64,
    mut buf: BufferMut<'_>,
    frames: usize,
) -> Result<()> {
    check_format(format)?;
    check_layout(format, buf.is_interleaved())?;

    let sample_format = format.sample_format;
    let mut view = planarize_mut(&mut buf, sample_format, format.channels, frames)?;
    if gain == 1.0 {
        return Ok(());
    }

    let mut tmp = [0u8; 8];
    let width = sample_format.width();
    for ch in 0..view.channels() {
        for i in 0..frames {
            let sample = view.sample_mut(ch, i);
            tmp[..width].copy_from_slice(sample);
            scale_sample(sample_format, gain, &tmp[..width], sample);
        }
    }
    Ok(())
}
