//! Gain matrix for up/down-mixing between channel masks.
//!
//! The matrix is indexed `[output][input]` by [`Position`]. Each entry is the
//! fraction of the input position's signal that goes into the output
//! position.
//!
//! Positions present on both sides pass through at unity gain. Positions
//! missing from the output are folded into the remaining speakers:
//!
//! - FL/FR fold into FC at 1/√2.
//! - FC folds into both FL and FR at 1/√2 (requires both).
//! - LFE is dropped.
//! - BL/BR and SL/SR fold into the same-side front speaker at 1/√2, or into
//!   FC at 1/2 when there are no front speakers.
//!
//! Every active output row is then divided by its sum so that no output can
//! exceed unity gain in aggregate.

use crate::channel::{ChannelMask, Position};
use crate::error::{Error, Result};
use std::fmt;

/// 1/√2
const SQRT1_2: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// A normalized 8×8 channel gain matrix.
#[derive(Clone, PartialEq)]
pub struct GainMatrix {
    levels: [[f64; 8]; 8],
    input: ChannelMask,
    output: ChannelMask,
}

impl GainMatrix {
    /// Builds the matrix that maps `input` onto `output`.
    pub fn build(input: ChannelMask, output: ChannelMask) -> Result<Self> {
        let mut levels = [[0.0f64; 8]; 8];

        for pos in input.intersection(output).positions() {
            levels[pos.index()][pos.index()] = 1.0;
        }

        for pos in input.difference(output).positions() {
            fold(&mut levels, pos, output)?;
        }

        for pos in output.positions() {
            let row = &mut levels[pos.index()];
            let sum: f64 = row.iter().sum();
            if sum != 0.0 {
                row.iter_mut().for_each(|level| *level /= sum);
            }
        }

        Ok(Self {
            levels,
            input,
            output,
        })
    }

    /// Builds the matrix between the default layouts of two channel counts.
    pub fn for_channels(input: u8, output: u8) -> Result<Self> {
        let matrix = Self::build(
            ChannelMask::from_channels(input)?,
            ChannelMask::from_channels(output)?,
        )?;
        tracing::debug!("Built gain matrix {} -> {} channels: {}", input, output, matrix);
        Ok(matrix)
    }

    /// Returns the gain of `input` into `output`.
    pub fn level(&self, output: Position, input: Position) -> f64 {
        self.levels[output.index()][input.index()]
    }

    /// Returns the row of input gains for `output`.
    pub fn row(&self, output: Position) -> &[f64; 8] {
        &self.levels[output.index()]
    }

    /// Returns the input channel mask.
    pub fn input(&self) -> ChannelMask {
        self.input
    }

    /// Returns the output channel mask.
    pub fn output(&self) -> ChannelMask {
        self.output
    }
}

/// Routes an input position that is absent from `output`.
fn fold(levels: &mut [[f64; 8]; 8], pos: Position, output: ChannelMask) -> Result<()> {
    use Position::*;

    let mut set = |to: Position, level: f64| levels[to.index()][pos.index()] = level;

    match pos {
        FrontLeft | FrontRight => {
            if !output.contains(FrontCenter) {
                return Err(unmixable(pos, output));
            }
            set(FrontCenter, SQRT1_2);
        }
        FrontCenter => {
            if !(output.contains(FrontLeft) && output.contains(FrontRight)) {
                return Err(unmixable(pos, output));
            }
            set(FrontLeft, SQRT1_2);
            set(FrontRight, SQRT1_2);
        }
        Lfe => {}
        BackLeft | BackRight | SideLeft | SideRight => {
            let front = if pos.is_left() { FrontLeft } else { FrontRight };
            if output.contains(front) {
                set(front, SQRT1_2);
            } else if output.contains(FrontCenter) {
                set(FrontCenter, SQRT1_2 * SQRT1_2);
            } else {
                return Err(unmixable(pos, output));
            }
        }
    }
    Ok(())
}

fn unmixable(position: Position, output: ChannelMask) -> Error {
    Error::UnmixableLayout { position, output }
}

impl fmt::Debug for GainMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GainMatrix")
            .field("input", &self.input.to_string())
            .field("output", &self.output.to_string())
            .field("levels", &format_args!("{self}"))
            .finish()
    }
}

impl fmt::Display for GainMatrix {
    /// Formats the non-zero rows, e.g. `FL=[FL:0.414 FC:0.293 BL:0.293]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, out) in self.output.positions().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{out}=[")?;
            let mut first = true;
            for inp in self.input.positions() {
                let level = self.level(out, inp);
                if level == 0.0 {
                    continue;
                }
                if !first {
                    f.write_str(" ")?;
                }
                write!(f, "{inp}:{level:.3}")?;
                first = false;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUTS: [u8; 4] = [1, 2, 6, 8];

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_identity_layouts() {
        for n in LAYOUTS {
            let m = GainMatrix::for_channels(n, n).unwrap();
            for out in m.output().positions() {
                for inp in m.input().positions() {
                    let expected = if out == inp { 1.0 } else { 0.0 };
                    assert_eq!(m.level(out, inp), expected, "{n}ch {out}<-{inp}");
                }
            }
        }
    }

    #[test]
    fn test_every_layout_pair_builds() {
        for i in LAYOUTS {
            for o in LAYOUTS {
                assert!(GainMatrix::for_channels(i, o).is_ok(), "{i} -> {o}");
            }
        }
    }

    #[test]
    fn test_rows_sum_to_at_most_one() {
        for i in LAYOUTS {
            for o in LAYOUTS {
                let m = GainMatrix::for_channels(i, o).unwrap();
                for out in m.output().positions() {
                    let sum: f64 = m.row(out).iter().sum();
                    assert!(sum <= 1.0 + 1e-12, "{i} -> {o}: {out} sums to {sum}");
                    assert!(m.row(out).iter().all(|&l| l >= 0.0));
                }
            }
        }
    }

    #[test]
    fn test_surround_to_stereo() {
        use Position::*;
        let m = GainMatrix::for_channels(6, 2).unwrap();
        let sum = 1.0 + 2.0 * SQRT1_2;

        assert!(approx(m.level(FrontLeft, FrontLeft), 1.0 / sum));
        assert!(approx(m.level(FrontLeft, FrontCenter), SQRT1_2 / sum));
        assert!(approx(m.level(FrontLeft, BackLeft), SQRT1_2 / sum));
        assert_eq!(m.level(FrontLeft, BackRight), 0.0);
        assert_eq!(m.level(FrontLeft, Lfe), 0.0);

        assert!(approx(m.level(FrontRight, FrontRight), 1.0 / sum));
        assert!(approx(m.level(FrontRight, BackRight), SQRT1_2 / sum));
    }

    #[test]
    fn test_surround_to_mono() {
        use Position::*;
        let m = GainMatrix::for_channels(6, 1).unwrap();
        // FL*s + FR*s + FC*1 + BL*0.5 + BR*0.5
        let sum = 2.0 * SQRT1_2 + 1.0 + 2.0 * 0.5;
        assert!(approx(m.level(FrontCenter, FrontLeft), SQRT1_2 / sum));
        assert!(approx(m.level(FrontCenter, FrontCenter), 1.0 / sum));
        assert!(approx(m.level(FrontCenter, BackLeft), 0.5 / sum));
        assert!(approx(m.level(FrontCenter, BackRight), 0.5 / sum));
    }

    #[test]
    fn test_stereo_to_mono_and_back() {
        use Position::*;
        let down = GainMatrix::for_channels(2, 1).unwrap();
        assert!(approx(down.level(FrontCenter, FrontLeft), 0.5));
        assert!(approx(down.level(FrontCenter, FrontRight), 0.5));

        let up = GainMatrix::for_channels(1, 2).unwrap();
        assert!(approx(up.level(FrontLeft, FrontCenter), 1.0));
        assert!(approx(up.level(FrontRight, FrontCenter), 1.0));
    }

    #[test]
    fn test_upmix_leaves_new_positions_silent() {
        use Position::*;
        let m = GainMatrix::for_channels(2, 8).unwrap();
        for out in [FrontCenter, Lfe, BackLeft, BackRight, SideLeft, SideRight] {
            assert!(m.row(out).iter().all(|&l| l == 0.0), "{out}");
        }
        assert_eq!(m.level(FrontLeft, FrontLeft), 1.0);
    }

    #[test]
    fn test_side_channels_fold_into_front() {
        use Position::*;
        let m = GainMatrix::for_channels(8, 6).unwrap();
        let sum = 1.0 + SQRT1_2;
        assert!(approx(m.level(FrontLeft, FrontLeft), 1.0 / sum));
        assert!(approx(m.level(FrontLeft, SideLeft), SQRT1_2 / sum));
        assert_eq!(m.level(BackLeft, BackLeft), 1.0);
        assert_eq!(m.level(Lfe, Lfe), 1.0);
    }

    #[test]
    fn test_unmixable() {
        use Position::*;
        let back = ChannelMask::from_bits(BackLeft.bit() | BackRight.bit());

        let err = GainMatrix::build(ChannelMask::MONO, back).unwrap_err();
        assert_eq!(
            err,
            Error::UnmixableLayout {
                position: FrontCenter,
                output: back
            }
        );

        let err = GainMatrix::build(ChannelMask::STEREO, back).unwrap_err();
        assert!(matches!(err, Error::UnmixableLayout { position: FrontLeft, .. }));

        let lfe_only = ChannelMask::from_bits(Lfe.bit());
        let err = GainMatrix::build(ChannelMask::SURROUND_5_1, lfe_only).unwrap_err();
        assert!(matches!(err, Error::UnmixableLayout { .. }));
    }

    #[test]
    fn test_lfe_dropped_silently() {
        use Position::*;
        let lfe = ChannelMask::from_bits(Lfe.bit());
        let m = GainMatrix::build(lfe, ChannelMask::STEREO).unwrap();
        assert!(m.row(FrontLeft).iter().all(|&l| l == 0.0));
        assert!(m.row(FrontRight).iter().all(|&l| l == 0.0));
    }

    #[test]
    fn test_display() {
        let m = GainMatrix::for_channels(2, 1).unwrap();
        assert_eq!(m.to_string(), "FC=[FL:0.500 FR:0.500]");
    }
}
