//! Per-sample conversion between encodings.
//!
//! The supported conversions form a table indexed by `[source][destination]`
//! [`SampleFormat`]. Each entry is a monomorphized element kernel, looked up
//! once per call and applied to every sample.
//!
//! Numeric rules:
//!
//! - Integer to integer: widen by multiplying by the ratio of full-scale
//!   magnitudes, narrow by dividing (truncating toward zero).
//! - Integer to float: divide by the full-scale magnitude (2^7, 2^15, 2^23 or
//!   2^31), giving a value in [-1.0, 1.0).
//! - Float to integer: multiply by the full-scale magnitude, saturate to the
//!   representable range, otherwise round to nearest with ties away from
//!   zero.
//! - Float to float: plain cast.
//! - Same format: the bytes are copied unchanged, including the padding
//!   byte of `I24In32`.
//!
//! `U8` is offset binary: 128 is silence. 24-bit samples are three
//! little-endian bytes, sign-extended on load; `I24In32` stores a zero byte
//! before them.
//!
//! Not every pair is defined. `U8` can only be produced from `U8`, and
//! `I24In32` can only be converted to itself.

use crate::error::{Error, Result};
use crate::format::SampleFormat;

/// Element kernel: converts the sample in `src` into `dst`.
///
/// `src` and `dst` must hold exactly one sample of the table entry's source
/// and destination format.
pub type Conversion = fn(src: &[u8], dst: &mut [u8]);

/// Full-scale magnitude of an integer with `bits` significant bits.
#[inline]
const fn full_scale(bits: u32) -> f64 {
    (1u64 << (bits - 1)) as f64
}

/// Loads an integer sample as a signed value in its own bit width.
#[inline]
fn load_int(format: SampleFormat, b: &[u8]) -> i32 {
    match format {
        SampleFormat::U8 => b[0] as i32 - 128,
        SampleFormat::I8 => b[0] as i8 as i32,
        SampleFormat::I16 => i16::from_le_bytes([b[0], b[1]]) as i32,
        SampleFormat::I24 => load_i24(&b[..3]),
        SampleFormat::I24In32 => load_i24(&b[1..4]),
        SampleFormat::I32 => i32::from_le_bytes([b[0], b[1], b[2], b[3]]),
        SampleFormat::F32 | SampleFormat::F64 => {
            unreachable!("{format} is not an integer format")
        }
    }
}

/// Stores a signed value that already fits the format's bit width.
#[inline]
fn store_int(format: SampleFormat, v: i32, b: &mut [u8]) {
    match format {
        SampleFormat::U8 => b[0] = (v + 128) as u8,
        SampleFormat::I8 => b[0] = v as i8 as u8,
        SampleFormat::I16 => b[..2].copy_from_slice(&(v as i16).to_le_bytes()),
        SampleFormat::I24 => store_i24(v, &mut b[..3]),
        SampleFormat::I24In32 => {
            b[0] = 0;
            store_i24(v, &mut b[1..4]);
        }
        SampleFormat::I32 => b[..4].copy_from_slice(&v.to_le_bytes()),
        SampleFormat::F32 | SampleFormat::F64 => {
            unreachable!("{format} is not an integer format")
        }
    }
}

/// Sign-extends a 3-byte little-endian value.
#[inline]
fn load_i24(b: &[u8]) -> i32 {
    // Place the value in the top 24 bits, then shift back arithmetically.
    i32::from_le_bytes([0, b[0], b[1], b[2]]) >> 8
}

#[inline]
fn store_i24(v: i32, b: &mut [u8]) {
    let bytes = v.to_le_bytes();
    b.copy_from_slice(&bytes[..3]);
}

#[inline]
fn load_float(format: SampleFormat, b: &[u8]) -> f64 {
    match format {
        SampleFormat::F32 => f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
        SampleFormat::F64 => {
            f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
        }
        _ => unreachable!("{format} is not a float format"),
    }
}

#[inline]
fn store_float(format: SampleFormat, v: f64, b: &mut [u8]) {
    match format {
        SampleFormat::F32 => b[..4].copy_from_slice(&(v as f32).to_le_bytes()),
        SampleFormat::F64 => b[..8].copy_from_slice(&v.to_le_bytes()),
        _ => unreachable!("{format} is not a float format"),
    }
}

/// Rescales an integer between bit widths.
#[inline]
fn rescale(v: i32, from_bits: u32, to_bits: u32) -> i32 {
    if to_bits > from_bits {
        v * (1 << (to_bits - from_bits))
    } else if to_bits < from_bits {
        v / (1 << (from_bits - to_bits))
    } else {
        v
    }
}

/// Converts a normalized value to an integer of `bits` significant bits.
///
/// Values outside the representable range saturate; others round to
/// nearest, ties away from zero.
#[inline]
pub fn quantize(v: f64, bits: u32) -> i32 {
    let max = full_scale(bits);
    let d = v * max;
    if d < -max {
        -(max as i64) as i32
    } else if d > max - 1.0 {
        (max - 1.0) as i32
    } else {
        d.round() as i32
    }
}

/// Clamps a normalized value to [-1.0, 1.0].
#[inline]
pub fn limit(v: f64) -> f64 {
    v.clamp(-1.0, 1.0)
}

/// Loads one sample as a normalized value.
///
/// Integers map to [-1.0, 1.0); floats are returned unchanged.
#[inline]
pub fn decode_normalized(format: SampleFormat, b: &[u8]) -> f64 {
    if format.is_float() {
        load_float(format, b)
    } else {
        load_int(format, b) as f64 / full_scale(format.value_bits())
    }
}

/// Stores a normalized value, quantizing and saturating integer formats.
#[inline]
pub fn encode_normalized(format: SampleFormat, v: f64, b: &mut [u8]) {
    if format.is_float() {
        store_float(format, v, b);
    } else {
        store_int(format, quantize(v, format.value_bits()), b);
    }
}

/// Element kernel for the pair `(SampleFormat::ALL[S], SampleFormat::ALL[D])`.
fn convert_sample<const S: usize, const D: usize>(src: &[u8], dst: &mut [u8]) {
    let s = SampleFormat::ALL[S];
    let d = SampleFormat::ALL[D];
    if S == D {
        let width = s.width();
        dst[..width].copy_from_slice(&src[..width]);
        return;
    }
    match (s.is_float(), d.is_float()) {
        (false, false) => {
            let v = rescale(load_int(s, src), s.value_bits(), d.value_bits());
            store_int(d, v, dst);
        }
        (false, true) => store_float(d, decode_normalized(s, src), dst),
        (true, false) => store_int(d, quantize(load_float(s, src), d.value_bits()), dst),
        (true, true) => store_float(d, load_float(s, src), dst),
    }
}

macro_rules! k {
    ($src:ident => $dst:ident) => {
        Some(
            convert_sample::<{ SampleFormat::$src as usize }, { SampleFormat::$dst as usize }>
                as Conversion,
        )
    };
}

const NO: Option<Conversion> = None;

/// Conversion table, `[source][destination]`.
#[rustfmt::skip]
static TABLE: [[Option<Conversion>; SampleFormat::COUNT]; SampleFormat::COUNT] = [
    // U8
    [k!(U8 => U8), k!(U8 => I8), k!(U8 => I16), k!(U8 => I24), k!(U8 => I24In32), k!(U8 => I32), k!(U8 => F32), k!(U8 => F64)],
    // I8
    [NO, k!(I8 => I8), k!(I8 => I16), k!(I8 => I24), k!(I8 => I24In32), k!(I8 => I32), k!(I8 => F32), k!(I8 => F64)],
    // I16
    [NO, k!(I16 => I8), k!(I16 => I16), k!(I16 => I24), k!(I16 => I24In32), k!(I16 => I32), k!(I16 => F32), k!(I16 => F64)],
    // I24
    [NO, k!(I24 => I8), k!(I24 => I16), k!(I24 => I24), k!(I24 => I24In32), k!(I24 => I32), k!(I24 => F32), k!(I24 => F64)],
    // I24In32
    [NO, NO, NO, NO, k!(I24In32 => I24In32), NO, NO, NO],
    // I32
    [NO, k!(I32 => I8), k!(I32 => I16), k!(I32 => I24), k!(I32 => I24In32), k!(I32 => I32), k!(I32 => F32), k!(I32 => F64)],
    // F32
    [NO, k!(F32 => I8), k!(F32 => I16), k!(F32 => I24), k!(F32 => I24In32), k!(F32 => I32), k!(F32 => F32), k!(F32 => F64)],
    // F64
    [NO, k!(F64 => I8), k!(F64 => I16), k!(F64 => I24), k!(F64 => I24In32), k!(F64 => I32), k!(F64 => F32), k!(F64 => F64)],
];

/// Returns the element kernel converting `src` samples into `dst` samples.
pub fn lookup(dst: SampleFormat, src: SampleFormat) -> Result<Conversion> {
    TABLE[src.index()][dst.index()].ok_or(Error::UnsupportedFormatPair { src, dst })
}

/// Returns true if a conversion from `src` to `dst` is defined.
pub fn is_supported(dst: SampleFormat, src: SampleFormat) -> bool {
    TABLE[src.index()][dst.index()].is_some()
}

/// Iterates over every defined `(dst, src)` pair.
pub fn supported_pairs() -> impl Iterator<Item = (SampleFormat, SampleFormat)> {
    SampleFormat::ALL.into_iter().flat_map(|src| {
        SampleFormat::ALL
            .into_iter()
            .filter(move |&dst| is_supported(dst, src))
            .map(move |dst| (dst, src))
    })
}

/// Converts a single sample.
///
/// `src_sample` must hold one `src` sample and `dst_sample` room for one
/// `dst` sample.
pub fn convert_one(
    dst: SampleFormat,
    src: SampleFormat,
    src_sample: &[u8],
    dst_sample: &mut [u8],
) -> Result<()> {
    let kernel = lookup(dst, src)?;
    kernel(src_sample, dst_sample);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use SampleFormat::*;

    fn conv(dst: SampleFormat, src: SampleFormat, sample: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; dst.width()];
        convert_one(dst, src, sample, &mut out).unwrap();
        out
    }

    fn f32_bytes(v: f32) -> [u8; 4] {
        v.to_le_bytes()
    }

    fn as_f32(b: &[u8]) -> f32 {
        f32::from_le_bytes([b[0], b[1], b[2], b[3]])
    }

    fn as_i16(b: &[u8]) -> i16 {
        i16::from_le_bytes([b[0], b[1]])
    }

    fn as_i32(b: &[u8]) -> i32 {
        i32::from_le_bytes([b[0], b[1], b[2], b[3]])
    }

    /// Encodes a value of the format's own bit width.
    fn int_bytes(format: SampleFormat, v: i32) -> Vec<u8> {
        let mut b = vec![0u8; format.width()];
        store_int(format, v, &mut b);
        b
    }

    #[test]
    fn test_table_shape() {
        let pairs: Vec<_> = supported_pairs().collect();
        // 8x8 minus 7 pairs into U8 minus 7 pairs out of I24In32, and
        // I24In32 -> U8 counted in both.
        assert_eq!(pairs.len(), 64 - 7 - 7 + 1);

        for f in SampleFormat::ALL {
            assert!(is_supported(f, f), "{f} -> {f}");
        }
        assert!(!is_supported(U8, I16));
        assert!(!is_supported(U8, F32));
        assert!(!is_supported(I16, I24In32));
        assert!(is_supported(I24In32, F64));
    }

    #[test]
    fn test_unsupported_pair() {
        let mut out = [0u8; 1];
        assert_eq!(
            convert_one(U8, F32, &f32_bytes(0.0), &mut out),
            Err(Error::UnsupportedFormatPair { src: F32, dst: U8 })
        );
        assert_eq!(
            lookup(F32, I24In32).unwrap_err(),
            Error::UnsupportedFormatPair {
                src: I24In32,
                dst: F32
            }
        );
    }

    #[test]
    fn test_i16_to_float() {
        assert_eq!(as_f32(&conv(F32, I16, &i16::MIN.to_le_bytes())), -1.0);
        assert_eq!(as_f32(&conv(F32, I16, &0i16.to_le_bytes())), 0.0);
        assert_eq!(as_f32(&conv(F32, I16, &16384i16.to_le_bytes())), 0.5);

        let max = as_f32(&conv(F32, I16, &i16::MAX.to_le_bytes()));
        assert!(max < 1.0 && max > 0.9999);
    }

    #[test]
    fn test_float_to_i16_saturates() {
        assert_eq!(as_i16(&conv(I16, F32, &f32_bytes(1.0))), i16::MAX);
        assert_eq!(as_i16(&conv(I16, F32, &f32_bytes(2.0))), i16::MAX);
        assert_eq!(as_i16(&conv(I16, F32, &f32_bytes(-1.0))), i16::MIN);
        assert_eq!(as_i16(&conv(I16, F32, &f32_bytes(-3.0))), i16::MIN);
        assert_eq!(as_i16(&conv(I16, F32, &f32_bytes(0.5))), 16384);
    }

    #[test]
    fn test_float_to_int_rounds_half_away_from_zero() {
        let half = 1.5f64 / 32768.0;
        assert_eq!(as_i16(&conv(I16, F64, &half.to_le_bytes())), 2);
        assert_eq!(as_i16(&conv(I16, F64, &(-half).to_le_bytes())), -2);

        let below = 1.25f64 / 32768.0;
        assert_eq!(as_i16(&conv(I16, F64, &below.to_le_bytes())), 1);
        assert_eq!(as_i16(&conv(I16, F64, &(-below).to_le_bytes())), -1);
    }

    #[test]
    fn test_quantize_bounds() {
        assert_eq!(quantize(1.0, 32), i32::MAX);
        assert_eq!(quantize(-1.0, 32), i32::MIN);
        assert_eq!(quantize(-1.5, 24), -0x80_0000);
        assert_eq!(quantize(1.5, 24), 0x7f_ffff);
        assert_eq!(quantize(1.0, 8), 127);
        assert_eq!(quantize(-1.0, 8), -128);
        assert_eq!(quantize(f64::NAN, 16), 0);
    }

    #[test]
    fn test_i24_sign_extension() {
        assert_eq!(load_i24(&[0xff, 0xff, 0xff]), -1);
        assert_eq!(load_i24(&[0x00, 0x00, 0x80]), -0x80_0000);
        assert_eq!(load_i24(&[0xff, 0xff, 0x7f]), 0x7f_ffff);
        assert_eq!(load_i24(&[0x56, 0x34, 0x12]), 0x12_3456);

        assert_eq!(as_i32(&conv(I32, I24, &[0xff, 0xff, 0xff])), -256);
        assert_eq!(as_i16(&conv(I16, I24, &[0x00, 0x00, 0x80])), i16::MIN);
    }

    #[test]
    fn test_i24_in_32_padding() {
        assert_eq!(conv(I24In32, I16, &0x1234i16.to_le_bytes()), vec![0, 0x00, 0x34, 0x12]);
        assert_eq!(conv(I24In32, I24, &[0x56, 0x34, 0x92]), vec![0, 0x56, 0x34, 0x92]);
        // Same-format conversion keeps the padding byte as given.
        assert_eq!(conv(I24In32, I24In32, &[0xee, 1, 2, 3]), vec![0xee, 1, 2, 3]);

        let out = conv(I24In32, F32, &f32_bytes(-1.0));
        assert_eq!(out, vec![0, 0x00, 0x00, 0x80]);
    }

    #[test]
    fn test_u8_offset_binary() {
        assert_eq!(as_i16(&conv(I16, U8, &[128])), 0);
        assert_eq!(as_i16(&conv(I16, U8, &[0])), i16::MIN);
        assert_eq!(as_i16(&conv(I16, U8, &[255])), 127 * 256);
        assert_eq!(conv(I8, U8, &[128]), vec![0]);
        assert_eq!(as_f32(&conv(F32, U8, &[0])), -1.0);
        assert_eq!(conv(U8, U8, &[77]), vec![77]);
    }

    #[test]
    fn test_integer_widening_and_narrowing() {
        assert_eq!(as_i32(&conv(I32, I8, &[0x80])), i32::MIN);
        assert_eq!(as_i32(&conv(I32, I16, &(-1i16).to_le_bytes())), -0x10000);
        assert_eq!(as_i16(&conv(I16, I32, &0x1234_5678i32.to_le_bytes())), 0x1234);
        // Narrowing truncates toward zero.
        assert_eq!(conv(I8, I16, &(-255i16).to_le_bytes()), vec![0]);
        assert_eq!(conv(I8, I16, &(-256i16).to_le_bytes()), vec![0xff]);
    }

    #[test]
    #[should_panic(expected = "not an integer format")]
    fn test_integer_load_rejects_float_format() {
        load_int(F32, &[0; 4]);
    }

    #[test]
    #[should_panic(expected = "not a float format")]
    fn test_float_store_rejects_integer_format() {
        store_float(I16, 0.5, &mut [0; 2]);
    }

    #[test]
    fn test_float_to_float() {
        let out = conv(F64, F32, &f32_bytes(0.25));
        assert_eq!(f64::from_le_bytes(out.try_into().unwrap()), 0.25);

        // Floats are not clamped.
        let out = conv(F32, F64, &1.5f64.to_le_bytes());
        assert_eq!(as_f32(&out), 1.5);
    }

    #[test]
    fn test_integer_round_trip_within_one_step() {
        let ints = [U8, I8, I16, I24, I32];
        let probes: [f64; 9] = [-1.0, -0.75, -0.3337, -0.001, 0.0, 0.0005, 0.42, 0.875, 0.99];

        for a in ints {
            for b in ints {
                if !is_supported(b, a) || !is_supported(a, b) {
                    continue;
                }
                // One quantization step of the smaller format, in A's units.
                let bits = a.value_bits().min(b.value_bits());
                let step = 1i64 << (a.value_bits() - bits);

                for p in probes {
                    let v = quantize(p, a.value_bits());
                    let start = int_bytes(a, v);
                    let there = conv(b, a, &start);
                    let back = conv(a, b, &there);
                    let diff = (load_int(a, &back) as i64 - v as i64).abs();
                    assert!(diff < step, "{a} -> {b} -> {a}: {v} came back {diff} off");
                }
            }
        }
    }

    #[test]
    fn test_normalized_helpers() {
        let mut b = [0u8; 3];
        encode_normalized(I24, 0.5, &mut b);
        assert_eq!(decode_normalized(I24, &b), 0.5);

        encode_normalized(I24, 9.0, &mut b);
        assert_eq!(load_i24(&b), 0x7f_ffff);

        let mut f = [0u8; 8];
        encode_normalized(F64, 9.0, &mut f);
        assert_eq!(decode_normalized(F64, &f), 9.0);

        assert_eq!(limit(1.2), 1.0);
        assert_eq!(limit(-7.0), -1.0);
        assert_eq!(limit(0.3), 0.3);
    }
}
