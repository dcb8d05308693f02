//! Interleaved/planar buffer views.
//!
//! Callers hand buffers to the engine as [`Buffer`] or [`BufferMut`]: either
//! one interleaved byte slice or one byte slice per channel. The layout
//! adapter turns both into per-channel addressing (plane, byte offset and
//! byte step between frames) without moving any data:
//!
//! ```text
//! interleaved, 2ch s16:  [L0 L0 R0 R0 L1 L1 R1 R1 ...]
//!                         ^ch0 offset 0, step 4
//!                               ^ch1 offset 2, step 4
//! planar, 2ch s16:       plane 0 [L0 L0 L1 L1 ...]  offset 0, step 2
//!                        plane 1 [R0 R0 R1 R1 ...]  offset 0, step 2
//! ```

use crate::error::{Error, Result};
use crate::format::{Format, MAX_CHANNELS, SampleFormat};

/// Caller-owned input samples.
#[derive(Debug, Clone, Copy)]
pub enum Buffer<'a> {
    /// All channels of a frame stored contiguously.
    Interleaved(&'a [u8]),
    /// One slice per channel.
    Planar(&'a [&'a [u8]]),
}

/// Caller-owned output samples.
#[derive(Debug)]
pub enum BufferMut<'a> {
    /// All channels of a frame stored contiguously.
    Interleaved(&'a mut [u8]),
    /// One slice per channel.
    Planar(&'a mut [&'a mut [u8]]),
}

impl Buffer<'_> {
    /// Returns true for interleaved buffers.
    pub fn is_interleaved(&self) -> bool {
        matches!(self, Buffer::Interleaved(_))
    }
}

impl BufferMut<'_> {
    /// Returns true for interleaved buffers.
    pub fn is_interleaved(&self) -> bool {
        matches!(self, BufferMut::Interleaved(_))
    }
}

/// How channels are arranged in the underlying planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    Interleaved,
    Planar,
}

/// Checks that the buffer variant agrees with `format.interleaved`.
pub(crate) fn check_layout(format: &Format, interleaved: bool) -> Result<()> {
    if format.interleaved != interleaved {
        return Err(Error::LayoutMismatch {
            expected_interleaved: format.interleaved,
        });
    }
    Ok(())
}

/// Per-channel address arithmetic shared by the shared and mutable views.
#[derive(Debug, Clone, Copy)]
struct Addressing {
    sample_format: SampleFormat,
    layout: Layout,
    channels: usize,
    /// Index into the planes for each channel.
    plane: [usize; MAX_CHANNELS],
    /// Byte offset of frame 0 of each channel within its plane.
    offset: [usize; MAX_CHANNELS],
    /// Bytes between successive frames of the same channel.
    step: usize,
}

impl Addressing {
    fn interleaved(sample_format: SampleFormat, channels: usize) -> Self {
        let width = sample_format.width();
        let mut offset = [0; MAX_CHANNELS];
        for (ch, off) in offset.iter_mut().enumerate().take(channels) {
            *off = ch * width;
        }
        Self {
            sample_format,
            layout: Layout::Interleaved,
            channels,
            plane: [0; MAX_CHANNELS],
            offset,
            step: width * channels,
        }
    }

    fn planar(sample_format: SampleFormat, channels: usize) -> Self {
        Self {
            sample_format,
            layout: Layout::Planar,
            channels,
            plane: [0, 1, 2, 3, 4, 5, 6, 7],
            offset: [0; MAX_CHANNELS],
            step: sample_format.width(),
        }
    }

    fn check_channels(channels: u8) -> Result<usize> {
        match channels as usize {
            n @ 1..=MAX_CHANNELS => Ok(n),
            _ => Err(Error::UnsupportedChannelCount(channels)),
        }
    }

    #[inline]
    fn position(&self, ch: usize, frame: usize) -> (usize, usize) {
        (self.plane[ch], self.offset[ch] + frame * self.step)
    }

    /// True when each channel's frames are adjacent (step equals width).
    fn is_packed(&self) -> bool {
        self.step == self.sample_format.width()
    }

    /// True when the view covers a whole interleaved plane from its start.
    fn is_whole_interleaved(&self) -> bool {
        self.layout == Layout::Interleaved
            && self.offset[0] == 0
            && self.step == self.sample_format.width() * self.channels
    }

    fn select(&self, channel: u8) -> Result<Self> {
        let ch = channel as usize;
        if ch >= self.channels {
            return Err(Error::ChannelSelection {
                channel,
                channels: self.channels as u8,
            });
        }
        let mut plane = [0; MAX_CHANNELS];
        let mut offset = [0; MAX_CHANNELS];
        plane[0] = self.plane[ch];
        offset[0] = self.offset[ch];
        Ok(Self {
            channels: 1,
            plane,
            offset,
            ..*self
        })
    }
}

/// Checks that `got` bytes hold `frames` runs of `bytes` each. A size that
/// overflows `usize` is reported as `usize::MAX` bytes.
fn check_len(frames: usize, bytes: usize, got: usize) -> Result<()> {
    let needed = frames.checked_mul(bytes).unwrap_or(usize::MAX);
    if got < needed {
        return Err(Error::BufferTooSmall { needed, got });
    }
    Ok(())
}

/// Read-only per-channel view of a buffer.
#[derive(Debug, Clone, Copy)]
pub struct ChannelView<'a> {
    buffer: Buffer<'a>,
    addr: Addressing,
}

/// Writable per-channel view of a buffer.
#[derive(Debug)]
pub struct ChannelViewMut<'a, 'b> {
    buffer: &'b mut BufferMut<'a>,
    addr: Addressing,
}

/// Builds a per-channel view over `buffer`, checking it can hold `frames`.
pub fn planarize<'a>(
    buffer: Buffer<'a>,
    sample_format: SampleFormat,
    channels: u8,
    frames: usize,
) -> Result<ChannelView<'a>> {
    let n = Addressing::check_channels(channels)?;
    let width = sample_format.width();
    let addr = match buffer {
        Buffer::Interleaved(data) => {
            check_len(frames, width * n, data.len())?;
            Addressing::interleaved(sample_format, n)
        }
        Buffer::Planar(planes) => {
            check_planes(planes.iter().map(|p| p.len()), planes.len(), n, frames, width)?;
            Addressing::planar(sample_format, n)
        }
    };
    Ok(ChannelView { buffer, addr })
}

/// Builds a writable per-channel view over `buffer`, checking it can hold
/// `frames`.
pub fn planarize_mut<'a, 'b>(
    buffer: &'b mut BufferMut<'a>,
    sample_format: SampleFormat,
    channels: u8,
    frames: usize,
) -> Result<ChannelViewMut<'a, 'b>> {
    let n = Addressing::check_channels(channels)?;
    let width = sample_format.width();
    let addr = match &*buffer {
        BufferMut::Interleaved(data) => {
            check_len(frames, width * n, data.len())?;
            Addressing::interleaved(sample_format, n)
        }
        BufferMut::Planar(planes) => {
            check_planes(planes.iter().map(|p| p.len()), planes.len(), n, frames, width)?;
            Addressing::planar(sample_format, n)
        }
    };
    Ok(ChannelViewMut { buffer, addr })
}

fn check_planes(
    lens: impl Iterator<Item = usize>,
    count: usize,
    channels: usize,
    frames: usize,
    width: usize,
) -> Result<()> {
    if count < channels {
        return Err(Error::BufferTooSmall {
            needed: frames.saturating_mul(width).saturating_mul(channels),
            got: 0,
        });
    }
    for len in lens.take(channels) {
        check_len(frames, width, len)?;
    }
    Ok(())
}

impl<'a> ChannelView<'a> {
    /// Returns the sample format of the view.
    pub fn sample_format(&self) -> SampleFormat {
        self.addr.sample_format
    }

    /// Returns the number of channels addressed by the view.
    pub fn channels(&self) -> usize {
        self.addr.channels
    }

    /// Returns the arrangement of the underlying buffer.
    pub fn layout(&self) -> Layout {
        self.addr.layout
    }

    /// Returns the number of bytes between frames of one channel.
    pub fn step(&self) -> usize {
        self.addr.step
    }

    /// Returns true when every channel's samples are adjacent.
    pub fn is_packed(&self) -> bool {
        self.addr.is_packed()
    }

    /// Returns the bytes of one sample.
    #[inline]
    pub fn sample(&self, ch: usize, frame: usize) -> &'a [u8] {
        let (plane, off) = self.addr.position(ch, frame);
        let width = self.addr.sample_format.width();
        let data: &'a [u8] = match self.buffer {
            Buffer::Interleaved(data) => data,
            Buffer::Planar(planes) => planes[plane],
        };
        &data[off..off + width]
    }

    /// Re-addresses the view to a single channel, keeping its step.
    pub fn select(&self, channel: u8) -> Result<ChannelView<'a>> {
        Ok(ChannelView {
            buffer: self.buffer,
            addr: self.addr.select(channel)?,
        })
    }

    /// Returns the interleaved bytes of `frames` frames if the view covers a
    /// whole interleaved buffer.
    pub fn as_interleaved(&self, frames: usize) -> Option<&'a [u8]> {
        match self.buffer {
            Buffer::Interleaved(data) if self.addr.is_whole_interleaved() => {
                Some(&data[..frames * self.addr.step])
            }
            _ => None,
        }
    }

    /// Returns channel `ch` as one contiguous run if its samples are
    /// adjacent.
    pub fn contiguous(&self, ch: usize, frames: usize) -> Option<&'a [u8]> {
        if !self.addr.is_packed() {
            return None;
        }
        let (plane, off) = self.addr.position(ch, 0);
        let data: &'a [u8] = match self.buffer {
            Buffer::Interleaved(data) => data,
            Buffer::Planar(planes) => planes[plane],
        };
        Some(&data[off..off + frames * self.addr.step])
    }
}

impl<'a, 'b> ChannelViewMut<'a, 'b> {
    /// Returns the sample format of the view.
    pub fn sample_format(&self) -> SampleFormat {
        self.addr.sample_format
    }

    /// Returns the number of channels addressed by the view.
    pub fn channels(&self) -> usize {
        self.addr.channels
    }

    /// Returns the arrangement of the underlying buffer.
    pub fn layout(&self) -> Layout {
        self.addr.layout
    }

    /// Returns true when every channel's samples are adjacent.
    pub fn is_packed(&self) -> bool {
        self.addr.is_packed()
    }

    /// Returns the bytes of one sample for writing.
    #[inline]
    pub fn sample_mut(&mut self, ch: usize, frame: usize) -> &mut [u8] {
        let (plane, off) = self.addr.position(ch, frame);
        let width = self.addr.sample_format.width();
        let data: &mut [u8] = match &mut *self.buffer {
            BufferMut::Interleaved(data) => &mut **data,
            BufferMut::Planar(planes) => &mut *planes[plane],
        };
        &mut data[off..off + width]
    }

    /// Returns the interleaved bytes of `frames` frames.
    pub fn as_interleaved_mut(&mut self, frames: usize) -> Option<&mut [u8]> {
        let len = frames * self.addr.step;
        let whole = self.addr.is_whole_interleaved();
        match &mut *self.buffer {
            BufferMut::Interleaved(data) if whole => Some(&mut data[..len]),
            _ => None,
        }
    }

    /// Returns channel `ch` as one contiguous run if its samples are
    /// adjacent.
    pub fn contiguous_mut(&mut self, ch: usize, frames: usize) -> Option<&mut [u8]> {
        if !self.addr.is_packed() {
            return None;
        }
        let (plane, off) = self.addr.position(ch, 0);
        let len = frames * self.addr.step;
        let data: &mut [u8] = match &mut *self.buffer {
            BufferMut::Interleaved(data) => &mut **data,
            BufferMut::Planar(planes) => &mut *planes[plane],
        };
        Some(&mut data[off..off + len])
    }

    /// Returns the first two planes of a planar buffer.
    pub(crate) fn planar_pair_mut(&mut self) -> Option<(&mut [u8], &mut [u8])> {
        match &mut *self.buffer {
            BufferMut::Planar(planes) if planes.len() >= 2 => {
                let (left, rest) = planes.split_at_mut(1);
                Some((&mut *left[0], &mut *rest[0]))
            }
            _ => None,
        }
    }
}
