/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{anyhow, bail, Result};

use super::{PieceKind, Position, Square};

/// Maximum number of moves a single position can have.
pub const MAX_MOVES: usize = 256;

/// An alias for an [`arrayvec::ArrayVec`] holding at most [`MAX_MOVES`] moves.
pub type MoveList = arrayvec::ArrayVec<Move, MAX_MOVES>;

/// A move on the board, packed into a single `u32`:
///
/// ```text
///  000     000      000     000000   000000 000000
///   |       |        |        |        |      |
///   |       |        |        |        |      +- Source square
///   |       |        |        |        +- Destination square
///   |       |        |        +- Square of the captured piece, if any.
///   |       |        |           Differs from the destination only on en passant.
///   |       |        +- Kind of the moving piece
///   |       +- Kind of the captured piece (0b111 when not a capture)
///   +- Promotion kind (0b111 when not a promotion)
/// ```
///
/// Two moves are equal exactly when all six fields are equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Move(u32);

impl Move {
    const TO_BITS: u32 = 6;
    const CAPTURED_SQUARE_BITS: u32 = 12;
    const KIND_BITS: u32 = 18;
    const CAPTURED_BITS: u32 = 21;
    const PROMOTION_BITS: u32 = 24;

    const SQUARE_MASK: u32 = 0b11_1111;
    const PIECE_MASK: u32 = 0b111;

    /// Bit pattern of the 3-bit piece fields when no piece is present.
    const NO_PIECE: u32 = 0b111;

    /// Creates a new [`Move`] from its six fields.
    #[inline(always)]
    pub const fn new(
        from: Square,
        to: Square,
        captured_square: Square,
        kind: PieceKind,
        captured: Option<PieceKind>,
        promotion: Option<PieceKind>,
    ) -> Self {
        let captured_bits = match captured {
            Some(kind) => kind as u32,
            None => Self::NO_PIECE,
        };
        let promotion_bits = match promotion {
            Some(kind) => kind as u32,
            None => Self::NO_PIECE,
        };

        Self(
            from.inner() as u32
                | (to.inner() as u32) << Self::TO_BITS
                | (captured_square.inner() as u32) << Self::CAPTURED_SQUARE_BITS
                | (kind as u32) << Self::KIND_BITS
                | captured_bits << Self::CAPTURED_BITS
                | promotion_bits << Self::PROMOTION_BITS,
        )
    }

    /// Creates a new quiet (non-capturing, non-promoting) [`Move`].
    #[inline(always)]
    pub const fn new_quiet(from: Square, to: Square, kind: PieceKind) -> Self {
        Self::new(from, to, to, kind, None, None)
    }

    /// Creates an "illegal" [`Move`], used as an empty slot in killer and hash tables.
    ///
    /// No real move shares its bit pattern, since no piece can move onto its own square.
    #[inline(always)]
    pub const fn illegal() -> Self {
        Self::new_quiet(Square::A1, Square::A1, PieceKind::Pawn)
    }

    /// Fetches the source square of this [`Move`].
    #[inline(always)]
    pub const fn from(&self) -> Square {
        Square::from_index_unchecked((self.0 & Self::SQUARE_MASK) as usize)
    }

    /// Fetches the destination square of this [`Move`].
    #[inline(always)]
    pub const fn to(&self) -> Square {
        Square::from_index_unchecked(((self.0 >> Self::TO_BITS) & Self::SQUARE_MASK) as usize)
    }

    /// Fetches the square of the piece captured by this [`Move`].
    ///
    /// Equal to [`Move::to`] except on en passant, where it is the square of
    /// the pawn behind the destination.
    #[inline(always)]
    pub const fn captured_square(&self) -> Square {
        Square::from_index_unchecked(
            ((self.0 >> Self::CAPTURED_SQUARE_BITS) & Self::SQUARE_MASK) as usize,
        )
    }

    /// Fetches the kind of the moving piece.
    #[inline(always)]
    pub const fn kind(&self) -> PieceKind {
        PieceKind::from_bits_unchecked(((self.0 >> Self::KIND_BITS) & Self::PIECE_MASK) as u8)
    }

    /// Fetches the kind of the captured piece, if this [`Move`] is a capture.
    #[inline(always)]
    pub const fn captured(&self) -> Option<PieceKind> {
        let bits = (self.0 >> Self::CAPTURED_BITS) & Self::PIECE_MASK;
        if bits == Self::NO_PIECE {
            None
        } else {
            Some(PieceKind::from_bits_unchecked(bits as u8))
        }
    }

    /// Fetches the kind this [`Move`]'s pawn promotes to, if it is a promotion.
    #[inline(always)]
    pub const fn promotion(&self) -> Option<PieceKind> {
        let bits = (self.0 >> Self::PROMOTION_BITS) & Self::PIECE_MASK;
        if bits == Self::NO_PIECE {
            None
        } else {
            Some(PieceKind::from_bits_unchecked(bits as u8))
        }
    }

    /// Returns `true` if this [`Move`] captures a piece.
    #[inline(always)]
    pub const fn is_capture(&self) -> bool {
        self.captured().is_some()
    }

    /// Returns `true` if this [`Move`] neither captures nor promotes.
    #[inline(always)]
    pub const fn is_quiet(&self) -> bool {
        self.captured().is_none() && self.promotion().is_none()
    }

    /// Returns `true` if this [`Move`] captures en passant.
    #[inline(always)]
    pub const fn is_en_passant(&self) -> bool {
        self.captured_square().inner() != self.to().inner()
    }

    /// Returns `true` if this [`Move`] is a castle: the King moving two files.
    #[inline(always)]
    pub const fn is_castling(&self) -> bool {
        matches!(self.kind(), PieceKind::King)
            && self.from().file().inner().abs_diff(self.to().file().inner()) == 2
    }

    /// Creates a [`Move`] from a UCI string like `e2e4` or `e7e8q`, resolving
    /// the moving and captured pieces against `position`.
    ///
    /// This checks only that a piece of the side to move stands on the source
    /// square. Geometric legality is the move generator's concern.
    pub fn from_uci(position: &Position, s: &str) -> Result<Self> {
        if s.len() < 4 || s.len() > 5 {
            bail!("move strings must be 4 or 5 chars. got {s:?}");
        }

        let from = Square::from_uci(&s[0..2])?;
        let to = Square::from_uci(&s[2..4])?;

        let piece = position
            .piece_at(from)
            .ok_or(anyhow!("no piece at {from} to move"))?;
        if piece.color() != position.side_to_move() {
            bail!("piece at {from} belongs to the opponent");
        }

        let promotion = match s.len() {
            5 => Some(PieceKind::from_uci(s.chars().nth(4).unwrap())?),
            _ => None,
        };

        // En passant is the only case where the captured piece is not on `to`
        let is_ep = matches!(piece.kind(), PieceKind::Pawn)
            && position.ep_square() == Some(to)
            && position.piece_at(to).is_none();

        let (captured, captured_square) = if is_ep {
            (
                Some(PieceKind::Pawn),
                to.offset(0, [-1, 1][position.side_to_move().index()])
                    .ok_or(anyhow!("invalid en passant target {to}"))?,
            )
        } else {
            (position.piece_at(to).map(|p| p.kind()), to)
        };

        Ok(Self::new(
            from,
            to,
            captured_square,
            piece.kind(),
            captured,
            promotion,
        ))
    }
}

impl fmt::Display for Move {
    /// Formats this [`Move`] in UCI notation, with castling as the King's two-square move.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from(), self.to())?;
        if let Some(promotion) = self.promotion() {
            write!(f, "{}", promotion.char())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self} ({:?}", self.kind())?;
        if let Some(captured) = self.captured() {
            write!(f, " x{captured:?} @ {}", self.captured_square())?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FEN_STARTPOS;

    #[test]
    fn test_move_fields_round_trip() {
        let mv = Move::new(
            Square::E2,
            Square::D3,
            Square::D3,
            PieceKind::Pawn,
            Some(PieceKind::Knight),
            None,
        );

        assert_eq!(mv.from(), Square::E2);
        assert_eq!(mv.to(), Square::D3);
        assert_eq!(mv.captured_square(), Square::D3);
        assert_eq!(mv.kind(), PieceKind::Pawn);
        assert_eq!(mv.captured(), Some(PieceKind::Knight));
        assert_eq!(mv.promotion(), None);
        assert!(mv.is_capture());
        assert!(!mv.is_quiet());
        assert!(!mv.is_en_passant());
    }

    #[test]
    fn test_illegal_sentinel_is_quiet() {
        let illegal = Move::illegal();
        assert!(illegal.is_quiet());
        assert!(!illegal.is_capture());
    }

    #[test]
    fn test_from_uci() {
        let pos: Position = FEN_STARTPOS.parse().unwrap();

        let mv = Move::from_uci(&pos, "e2e4").unwrap();
        assert_eq!(mv.from(), Square::E2);
        assert_eq!(mv.to(), Square::E4);
        assert_eq!(mv.kind(), PieceKind::Pawn);
        assert!(mv.is_quiet());
        assert_eq!(mv.to_string(), "e2e4");

        // No piece on e3, and e7 belongs to Black
        assert!(Move::from_uci(&pos, "e3e4").is_err());
        assert!(Move::from_uci(&pos, "e7e5").is_err());
    }

    #[test]
    fn test_from_uci_en_passant() {
        let pos: Position = "4k3/8/8/8/2pP4/8/8/4K3 b - d3 0 1".parse().unwrap();
        let mv = Move::from_uci(&pos, "c4d3").unwrap();

        assert!(mv.is_en_passant());
        assert_eq!(mv.captured(), Some(PieceKind::Pawn));
        assert_eq!(mv.captured_square(), Square::D4);
    }
}
