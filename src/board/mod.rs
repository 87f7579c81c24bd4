/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// 64-bit square sets and their operations.
mod bitboard;

/// Attack tables, ray tables, and the magic sliding-attack oracle.
mod movegen;

/// Compact move records, move lists, and UCI move parsing.
mod moves;

/// Leaf-counting validation of the move generator.
mod perft;

/// Colors, piece kinds, and pieces.
mod piece;

/// The board state itself: bitboards, rights, clocks, and make/unmake.
mod position;

/// Pseudo-random number generation for Zobrist keys and magic factors.
mod prng;

/// Squares, files, and ranks.
mod square;

/// Incremental position hashing.
mod zobrist;

pub use bitboard::*;
pub use movegen::*;
pub use moves::*;
pub use perft::*;
pub use piece::*;
pub use position::*;
pub use prng::*;
pub use square::*;
pub use zobrist::*;
