//! Two-channel fast path.
//!
//! Common stereo conversions between device formats walk both channels in a
//! single pass over whole frames instead of addressing each sample through
//! the per-channel view. The element kernel is the same one the generic
//! loop uses, so both routes produce identical output.

use crate::codec::Conversion;
use crate::format::SampleFormat::{self, F32, F64, I16, I24, I32};
use crate::layout::{ChannelView, ChannelViewMut, Layout};

use Layout::{Interleaved as Il, Planar as Pl};

/// A fast-path route: source format and layout, destination format and
/// layout.
pub type Route = (SampleFormat, Layout, SampleFormat, Layout);

/// Stereo conversions handled by the fast path.
#[rustfmt::skip]
pub const ROUTES: &[Route] = &[
    // interleave / deinterleave
    (I16, Pl, I16, Il),
    (I16, Il, I16, Pl),
    (F32, Pl, F32, Il),
    (F32, Il, F32, Pl),
    // capture to float
    (I16, Il, F32, Il),
    (I16, Il, F32, Pl),
    (I24, Il, F32, Il),
    (I32, Il, F32, Il),
    (F64, Pl, F32, Il),
    // float to playback
    (F32, Il, I16, Il),
    (F32, Pl, I16, Il),
    (F32, Il, I24, Il),
    (F32, Il, I32, Il),
];

/// Returns true if the fast path has a route for the conversion.
pub fn has_route(
    src: SampleFormat,
    src_layout: Layout,
    dst: SampleFormat,
    dst_layout: Layout,
) -> bool {
    ROUTES.contains(&(src, src_layout, dst, dst_layout))
}

enum Frames<'a> {
    Interleaved(&'a [u8]),
    Planar(&'a [u8], &'a [u8]),
}

/// Converts `frames` stereo frames with `kernel`.
///
/// Returns false without writing if either view is not a plain two-channel
/// interleaved or planar buffer.
pub(crate) fn convert(
    kernel: Conversion,
    src: &ChannelView<'_>,
    dst: &mut ChannelViewMut<'_, '_>,
    frames: usize,
) -> bool {
    if src.channels() != 2 || dst.channels() != 2 {
        return false;
    }
    let sw = src.sample_format().width();
    let dw = dst.sample_format().width();

    let input = match src.as_interleaved(frames) {
        Some(data) => Frames::Interleaved(data),
        None => match (src.contiguous(0, frames), src.contiguous(1, frames)) {
            (Some(l), Some(r)) => Frames::Planar(l, r),
            _ => return false,
        },
    };

    match dst.layout() {
        Layout::Interleaved => {
            let Some(out) = dst.as_interleaved_mut(frames) else {
                return false;
            };
            let out = out.chunks_exact_mut(2 * dw);
            match input {
                Frames::Interleaved(data) => {
                    for (i, o) in data.chunks_exact(2 * sw).zip(out) {
                        let (ol, or) = o.split_at_mut(dw);
                        kernel(&i[..sw], ol);
                        kernel(&i[sw..], or);
                    }
                }
                Frames::Planar(l, r) => {
                    for ((il, ir), o) in l.chunks_exact(sw).zip(r.chunks_exact(sw)).zip(out) {
                        let (ol, or) = o.split_at_mut(dw);
                        kernel(il, ol);
                        kernel(ir, or);
                    }
                }
            }
        }
        Layout::Planar => {
            let Some((ol, or)) = dst.planar_pair_mut() else {
                return false;
            };
            let ol = ol[..frames * dw].chunks_exact_mut(dw);
            let or = or[..frames * dw].chunks_exact_mut(dw);
            match input {
                Frames::Interleaved(data) => {
                    for (i, (ol, or)) in data.chunks_exact(2 * sw).zip(ol.zip(or)) {
                        kernel(&i[..sw], ol);
                        kernel(&i[sw..], or);
                    }
                }
                Frames::Planar(l, r) => {
                    let input = l.chunks_exact(sw).zip(r.chunks_exact(sw));
                    for ((il, ir), (ol, or)) in input.zip(ol.zip(or)) {
                        kernel(il, ol);
                        kernel(ir, or);
                    }
                }
            }
        }
    }
    true
}
