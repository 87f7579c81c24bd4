/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use uci_parser::UciScore;

/// A numerical evaluation of a position or move, in units of
/// ["centipawns"](https://www.chessprogramming.org/Score).
///
/// Scores are always relative to the side to move: positive is good for the
/// player whose turn it is.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Score(pub(crate) i32);

impl Score {
    /// Score of delivering checkmate on the current ply.
    ///
    /// Mate found at ply `p` scores `CHECKMATE - p`, so nearer mates score higher.
    pub const CHECKMATE: Self = Self(50_000);

    /// Any score above this magnitude is a mate score and carries a ply distance.
    pub const CHECKMATE_THRESHOLD: Self = Self(Self::CHECKMATE.0 - 1_000);

    /// Larger than any achievable score; used as the unbounded window edge.
    pub const INF: Self = Self(Self::CHECKMATE.0 + 1_000);

    /// Score of a draw.
    pub const DRAW: Self = Self(0);

    /// Initial value of alpha in alpha-beta pruning.
    pub const ALPHA: Self = Self(-Self::INF.0);

    /// Initial value of beta in alpha-beta pruning.
    pub const BETA: Self = Self::INF;

    /// Constructs a new [`Score`] instance.
    #[inline(always)]
    pub const fn new(score: i32) -> Self {
        Self(score)
    }

    /// Returns the inner `i32` of this [`Score`].
    #[inline(always)]
    pub const fn inner(&self) -> i32 {
        self.0
    }

    /// Returns `true` if the score is a mate score (for either side).
    #[inline(always)]
    pub fn is_mate(&self) -> bool {
        self.abs() > Self::CHECKMATE_THRESHOLD
    }

    /// Returns the number of plies this score is from mate.
    #[inline(always)]
    pub const fn plies_to_mate(&self) -> i32 {
        Self::CHECKMATE.0 - self.0.abs()
    }

    /// Converts this [`Score`] into a [`UciScore`], determining whether it is
    /// a centipawns score or a mate score.
    ///
    /// Used when sending the `info score` message.
    #[inline(always)]
    pub fn into_uci(self) -> UciScore {
        if self.is_mate() {
            let plies = self.plies_to_mate();

            // If the mate favors the side-to-move the score is positive, and we
            // round up since the current move must be made for it to count.
            let moves = if self.0 > 0 { plies + 1 } else { -plies } / 2;

            UciScore::mate(moves)
        } else {
            UciScore::cp(self.0)
        }
    }

    /// Returns the absolute value of this [`Score`].
    #[inline(always)]
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

}

macro_rules! impl_binary_op {
    ($trait:tt, $fn:ident) => {
        impl std::ops::$trait for Score {
            type Output = Self;

            #[inline(always)]
            fn $fn(self, rhs: Self) -> Self::Output {
                Self(self.0.$fn(rhs.0))
            }
        }

        impl std::ops::$trait<i32> for Score {
            type Output = Self;

            #[inline(always)]
            fn $fn(self, rhs: i32) -> Self::Output {
                Self(self.0.$fn(rhs))
            }
        }
    };
}

macro_rules! impl_binary_op_assign {
    ($trait:tt, $fn:ident) => {
        impl std::ops::$trait for Score {
            #[inline(always)]
            fn $fn(&mut self, rhs: Self) {
                self.0.$fn(rhs.0);
            }
        }

        impl std::ops::$trait<i32> for Score {
            #[inline(always)]
            fn $fn(&mut self, rhs: i32) {
                self.0.$fn(rhs);
            }
        }
    };
}

impl_binary_op!(Add, add);
impl_binary_op!(Sub, sub);
impl_binary_op!(Mul, mul);
impl_binary_op!(Div, div);

impl_binary_op_assign!(AddAssign, add_assign);
impl_binary_op_assign!(SubAssign, sub_assign);

impl std::ops::Neg for Score {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self::Output {
        Self(self.0.neg())
    }
}

impl PartialEq<i32> for Score {
    #[inline(always)]
    fn eq(&self, other: &i32) -> bool {
        self.0.eq(other)
    }
}

impl PartialOrd<i32> for Score {
    #[inline(always)]
    fn partial_cmp(&self, other: &i32) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(other)
    }
}

impl fmt::Display for Score {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mate_scores() {
        let mate_in_3_plies = Score::CHECKMATE - 3;
        assert!(mate_in_3_plies.is_mate());
        assert_eq!(mate_in_3_plies.plies_to_mate(), 3);

        let mated_in_2_plies = -(Score::CHECKMATE - 2);
        assert!(mated_in_2_plies.is_mate());
        assert_eq!(mated_in_2_plies.plies_to_mate(), 2);

        assert!(!Score::DRAW.is_mate());
        assert!(!Score::new(900).is_mate());
    }

    #[test]
    fn test_nearer_mates_score_higher() {
        assert!(Score::CHECKMATE - 1 > Score::CHECKMATE - 5);
        assert!(-(Score::CHECKMATE - 1) < -(Score::CHECKMATE - 5));
    }
}
