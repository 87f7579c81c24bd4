/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{bail, Result};

/// The color of a player or piece.
///
/// White is index 0 and Black is index 1 when indexing tables.
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum Color {
    #[default]
    White = 0,
    Black = 1,
}

/// The kind of a piece, independent of its color.
///
/// The numeric values are part of the board's encoding contract: moves store
/// kinds in 3-bit fields, and SEE walks kinds in increasing-value order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(u8)]
pub enum PieceKind {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

/// A piece on the board: a [`Color`] and a [`PieceKind`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    color: Color,
    kind: PieceKind,
}

impl Color {
    /// Number of colors.
    pub const COUNT: usize = 2;

    /// Returns this [`Color`]'s index for table lookups.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Returns the opposite of this [`Color`].
    #[inline(always)]
    pub const fn opponent(&self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// Returns `true` if this [`Color`] is White.
    #[inline(always)]
    pub const fn is_white(&self) -> bool {
        matches!(self, Self::White)
    }

    /// Creates a [`Color`] from a `bool`, where `false` is White.
    #[inline(always)]
    pub const fn from_bool(is_black: bool) -> Self {
        [Self::White, Self::Black][is_black as usize]
    }

    /// Creates a [`Color`] from the case of a piece character: uppercase is White.
    #[inline(always)]
    pub const fn from_case(c: char) -> Self {
        Self::from_bool(c.is_ascii_lowercase())
    }

    /// Returns this [`Color`]'s name, as a string.
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }
}

impl std::ops::Not for Color {
    type Output = Self;

    #[inline(always)]
    fn not(self) -> Self::Output {
        self.opponent()
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;

    #[inline(always)]
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "w" | "W" => Ok(Self::White),
            "b" | "B" => Ok(Self::Black),
            _ => bail!("color strings must be either \"w\" or \"b\". got {s:?}"),
        }
    }
}

impl fmt::Display for Color {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", if self.is_white() { 'w' } else { 'b' })
    }
}

impl PieceKind {
    /// Number of piece kinds.
    pub const COUNT: usize = 6;

    /// Returns this [`PieceKind`]'s index for table lookups.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Creates a [`PieceKind`] from its 3-bit encoding, without bounds checking.
    ///
    /// Bit patterns above [`PieceKind::King`] are not valid piece kinds.
    #[inline(always)]
    pub const fn from_bits_unchecked(bits: u8) -> Self {
        match bits {
            0 => Self::Pawn,
            1 => Self::Knight,
            2 => Self::Bishop,
            3 => Self::Rook,
            4 => Self::Queen,
            _ => Self::King,
        }
    }

    /// Returns the material value of this [`PieceKind`], in centipawns.
    ///
    /// The King's value is a number large enough to dwarf any exchange sequence.
    #[inline(always)]
    pub const fn value(&self) -> i32 {
        match self {
            Self::Pawn => 100,
            Self::Knight => 320,
            Self::Bishop => 330,
            Self::Rook => 500,
            Self::Queen => 900,
            Self::King => 20_000,
        }
    }

    /// Creates a [`PieceKind`] from a UCI promotion character (`n`, `b`, `r`, `q`).
    #[inline(always)]
    pub fn from_uci(c: char) -> Result<Self> {
        match c.to_ascii_lowercase() {
            'p' => Ok(Self::Pawn),
            'n' => Ok(Self::Knight),
            'b' => Ok(Self::Bishop),
            'r' => Ok(Self::Rook),
            'q' => Ok(Self::Queen),
            'k' => Ok(Self::King),
            _ => bail!("piece chars must be one of [p, n, b, r, q, k]. got {c:?}"),
        }
    }

    /// Returns the lowercase character for this [`PieceKind`].
    #[inline(always)]
    pub const fn char(&self) -> char {
        match self {
            Self::Pawn => 'p',
            Self::Knight => 'n',
            Self::Bishop => 'b',
            Self::Rook => 'r',
            Self::Queen => 'q',
            Self::King => 'k',
        }
    }

    /// Returns this [`PieceKind`]'s name, as a string.
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pawn => "pawn",
            Self::Knight => "knight",
            Self::Bishop => "bishop",
            Self::Rook => "rook",
            Self::Queen => "queen",
            Self::King => "king",
        }
    }

    /// Yields every [`PieceKind`], in increasing value order.
    #[inline(always)]
    pub fn all() -> [Self; Self::COUNT] {
        [
            Self::Pawn,
            Self::Knight,
            Self::Bishop,
            Self::Rook,
            Self::Queen,
            Self::King,
        ]
    }

    /// Yields the four [`PieceKind`]s a pawn can promote to.
    #[inline(always)]
    pub fn promotions() -> [Self; 4] {
        [Self::Knight, Self::Bishop, Self::Rook, Self::Queen]
    }
}

impl Piece {
    /// Creates a new [`Piece`] from the provided [`Color`] and [`PieceKind`].
    #[inline(always)]
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    /// Returns the [`Color`] of this [`Piece`].
    #[inline(always)]
    pub const fn color(&self) -> Color {
        self.color
    }

    /// Returns the [`PieceKind`] of this [`Piece`].
    #[inline(always)]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    /// Creates a [`Piece`] from a FEN character, with case denoting color.
    #[inline(always)]
    pub fn from_uci(c: char) -> Result<Self> {
        Ok(Self::new(Color::from_case(c), PieceKind::from_uci(c)?))
    }

    /// Returns the FEN character for this [`Piece`]: uppercase for White.
    #[inline(always)]
    pub const fn char(&self) -> char {
        let c = self.kind.char();
        if self.color.is_white() {
            c.to_ascii_uppercase()
        } else {
            c
        }
    }
}

impl fmt::Display for Piece {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl fmt::Debug for Piece {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.color.name(), self.kind.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_parsing_round_trip() {
        for c in ['P', 'n', 'B', 'r', 'Q', 'k'] {
            let piece = Piece::from_uci(c).unwrap();
            assert_eq!(piece.char(), c);
        }
        assert!(Piece::from_uci('x').is_err());
    }

    #[test]
    fn test_kind_bit_encoding_round_trip() {
        for kind in PieceKind::all() {
            assert_eq!(PieceKind::from_bits_unchecked(kind.index() as u8), kind);
        }
    }
}
