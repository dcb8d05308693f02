//! Speaker positions and channel masks.
//!
//! Buffers do not carry a channel map; the position of each channel is
//! inferred from the channel count. Only the common consumer layouts are
//! recognized:
//!
//! | channels | layout | positions                        |
//! |----------|--------|----------------------------------|
//! | 1        | mono   | FC                               |
//! | 2        | stereo | FL FR                            |
//! | 6        | 5.1    | FL FR FC LFE BL BR               |
//! | 8        | 7.1    | FL FR FC LFE BL BR SL SR         |
//!
//! Channels in a buffer appear in position order.

use crate::error::{Error, Result};
use std::fmt;

/// A canonical speaker position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Position {
    FrontLeft,
    FrontRight,
    FrontCenter,
    Lfe,
    BackLeft,
    BackRight,
    SideLeft,
    SideRight,
}

impl Position {
    /// Every position, in channel order.
    pub const ALL: [Position; 8] = [
        Position::FrontLeft,
        Position::FrontRight,
        Position::FrontCenter,
        Position::Lfe,
        Position::BackLeft,
        Position::BackRight,
        Position::SideLeft,
        Position::SideRight,
    ];

    /// Returns the index of this position (0..8).
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the bit of this position in a [`ChannelMask`].
    pub const fn bit(self) -> u8 {
        1 << self as u8
    }

    /// Returns true for positions on the left side of the listener.
    pub const fn is_left(self) -> bool {
        matches!(self, Position::FrontLeft | Position::BackLeft | Position::SideLeft)
    }

    /// Standard abbreviation, e.g. `FL` or `LFE`.
    pub const fn abbrev(self) -> &'static str {
        match self {
            Position::FrontLeft => "FL",
            Position::FrontRight => "FR",
            Position::FrontCenter => "FC",
            Position::Lfe => "LFE",
            Position::BackLeft => "BL",
            Position::BackRight => "BR",
            Position::SideLeft => "SL",
            Position::SideRight => "SR",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbrev())
    }
}

/// A set of speaker positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChannelMask(u8);

impl ChannelMask {
    /// Mono: front center only.
    pub const MONO: ChannelMask = ChannelMask(Position::FrontCenter.bit());

    /// Stereo: front left and right.
    pub const STEREO: ChannelMask =
        ChannelMask(Position::FrontLeft.bit() | Position::FrontRight.bit());

    /// 5.1 surround.
    pub const SURROUND_5_1: ChannelMask = ChannelMask(
        Self::STEREO.0
            | Position::FrontCenter.bit()
            | Position::Lfe.bit()
            | Position::BackLeft.bit()
            | Position::BackRight.bit(),
    );

    /// 7.1 surround.
    pub const SURROUND_7_1: ChannelMask = ChannelMask(
        Self::SURROUND_5_1.0 | Position::SideLeft.bit() | Position::SideRight.bit(),
    );

    /// Returns the mask for a channel count.
    ///
    /// Only 1, 2, 6 and 8 channels have a layout; any other count fails with
    /// [`Error::UnsupportedChannelCount`].
    pub fn from_channels(channels: u8) -> Result<Self> {
        match channels {
            1 => Ok(Self::MONO),
            2 => Ok(Self::STEREO),
            6 => Ok(Self::SURROUND_5_1),
            8 => Ok(Self::SURROUND_7_1),
            n => Err(Error::UnsupportedChannelCount(n)),
        }
    }

    /// Creates a mask from raw position bits (bit N = `Position::ALL[N]`).
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Returns the raw position bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if the mask includes `pos`.
    pub const fn contains(self, pos: Position) -> bool {
        self.0 & pos.bit() != 0
    }

    /// Returns the number of positions in the mask.
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Returns true if the mask is empty.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Positions present in both masks.
    pub const fn intersection(self, other: ChannelMask) -> ChannelMask {
        ChannelMask(self.0 & other.0)
    }

    /// Positions present in `self` but not in `other`.
    pub const fn difference(self, other: ChannelMask) -> ChannelMask {
        ChannelMask(self.0 & !other.0)
    }

    /// Iterates over the positions in channel order.
    pub fn positions(self) -> impl Iterator<Item = Position> {
        Position::ALL.into_iter().filter(move |&p| self.contains(p))
    }
}

impl fmt::Display for ChannelMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("(none)");
        }
        for (i, pos) in self.positions().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            write!(f, "{pos}")?;
        }
        Ok(())
    }
}

/// Resolves the channel mask for a channel count.
pub fn resolve(channels: u8) -> Result<ChannelMask> {
    ChannelMask::from_channels(channels)
}
