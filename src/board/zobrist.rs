/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use super::{CastlingRights, Color, File, PieceKind, Position, Square, XoShiRo};

/// Stores Zobrist hash keys, for hashing [`Position`]s.
///
/// Initialized at compile time with library-supplied seeds, so keys remain
/// constant between runs and between compilations.
const ZOBRIST_TABLE: ZobristHashTable = ZobristHashTable::new();

/// Represents a key generated from a Zobrist Hash.
///
/// A key is the XOR of: every piece's key at its square, the side-to-move key
/// when Black is to move, the castling-rights key for the current 4-bit rights
/// combination, and the en-passant file key when an en-passant square is set.
#[derive(Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
#[repr(transparent)]
pub struct ZobristKey(u64);

impl ZobristKey {
    /// Generates a new [`ZobristKey`] from scratch over the supplied [`Position`].
    ///
    /// Everywhere else the key is maintained incrementally; this exists for
    /// initialization after FEN parsing and for validating the incremental
    /// updates in tests.
    pub fn new(position: &Position) -> Self {
        let mut key = Self::default();

        for square in Square::iter() {
            if let Some(piece) = position.piece_at(square) {
                key.hash_piece(piece.color(), piece.kind(), square);
            }
        }

        if let Some(ep_square) = position.ep_square() {
            key.hash_ep_file(ep_square.file());
        }

        key.hash_castling_rights(&position.castling_rights());

        if !position.side_to_move().is_white() {
            key.hash_side_to_move();
        }

        key
    }

    /// Return the inner `u64` of this key.
    #[inline(always)]
    pub const fn inner(&self) -> u64 {
        self.0
    }

    /// Adds/removes `hash_key` to this [`ZobristKey`].
    ///
    /// This is done internally with the XOR operator, so hashing a key a
    /// second time un-hashes it.
    #[inline(always)]
    pub fn hash(&mut self, hash_key: u64) {
        self.0 ^= hash_key;
    }

    /// Adds/removes the hash for the provided piece at `square`.
    #[inline(always)]
    pub fn hash_piece(&mut self, color: Color, kind: PieceKind, square: Square) {
        self.hash(ZOBRIST_TABLE.piece_keys[color.index()][kind.index()][square.index()]);
    }

    /// Adds/removes the hash for an en-passant square on the provided [`File`].
    #[inline(always)]
    pub fn hash_ep_file(&mut self, file: File) {
        self.hash(ZOBRIST_TABLE.ep_file_keys[file.index()]);
    }

    /// Adds/removes the hash for the provided castling rights.
    #[inline(always)]
    pub fn hash_castling_rights(&mut self, rights: &CastlingRights) {
        self.hash(ZOBRIST_TABLE.castling_keys[rights.index()]);
    }

    /// Adds/removes the hash for the side-to-move being Black.
    ///
    /// White's key is 0, intentionally, so only Black affects the hash.
    #[inline(always)]
    pub fn hash_side_to_move(&mut self) {
        self.hash(ZOBRIST_TABLE.side_key);
    }
}

impl fmt::Display for ZobristKey {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Encapsulates the logic of Zobrist hashing.
struct ZobristHashTable {
    /// One unique key for every piece of every color on every square.
    piece_keys: [[[u64; Square::COUNT]; PieceKind::COUNT]; Color::COUNT],

    /// One key per file on which an en-passant capture could be possible.
    ep_file_keys: [u64; File::COUNT],

    /// One key for every possible combination of castling rights.
    castling_keys: [u64; CastlingRights::COUNT],

    /// The key hashed in when the side-to-move is Black.
    side_key: u64,
}

impl ZobristHashTable {
    /// Initialize this table, generating keys via the [`XoShiRo`] struct.
    ///
    /// This is only done once, at compilation, and is stored in the `ZOBRIST_TABLE` constant.
    const fn new() -> Self {
        let mut piece_keys = [[[0; Square::COUNT]; PieceKind::COUNT]; Color::COUNT];
        let mut ep_file_keys = [0; File::COUNT];
        let mut castling_keys = [0; CastlingRights::COUNT];

        let mut prng = XoShiRo::new();

        let mut color = 0;
        while color < Color::COUNT {
            let mut kind = 0;
            while kind < PieceKind::COUNT {
                let mut square = 0;
                while square < Square::COUNT {
                    let key;
                    (key, prng) = prng.get_next_const();
                    piece_keys[color][kind][square] = key;
                    square += 1;
                }
                kind += 1;
            }
            color += 1;
        }

        let mut file = 0;
        while file < File::COUNT {
            let key;
            (key, prng) = prng.get_next_const();
            ep_file_keys[file] = key;
            file += 1;
        }

        let mut rights = 0;
        while rights < CastlingRights::COUNT {
            let key;
            (key, prng) = prng.get_next_const();
            castling_keys[rights] = key;
            rights += 1;
        }

        let (side_key, _) = prng.get_next_const();

        Self {
            piece_keys,
            ep_file_keys,
            castling_keys,
            side_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashing_is_an_involution() {
        let mut key = ZobristKey::default();
        assert_eq!(key.inner(), 0);

        key.hash_piece(Color::White, PieceKind::Knight, Square::G1);
        assert_ne!(key.inner(), 0);

        key.hash_piece(Color::White, PieceKind::Knight, Square::G1);
        assert_eq!(key.inner(), 0);
    }

    #[test]
    fn test_distinct_features_have_distinct_keys() {
        let mut a = ZobristKey::default();
        let mut b = ZobristKey::default();

        a.hash_piece(Color::White, PieceKind::Pawn, Square::D4);
        b.hash_piece(Color::Black, PieceKind::Pawn, Square::D4);
        assert_ne!(a, b);

        let mut c = ZobristKey::default();
        c.hash_ep_file(File::D);
        assert_ne!(c, ZobristKey::default());
    }
}
