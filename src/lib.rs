/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// The board itself: bitboards, squares, pieces, moves, make/unmake, and
/// move generation.
mod board;

/// Commands to be sent to the engine, and how to parse them.
mod cli;

/// The engine's event loop and UCI command handling.
mod engine;

/// Evaluation of chess positions.
mod eval;

/// Killer-move and history-heuristic bookkeeping.
mod history;

/// Staged ordering of generated moves.
mod movepicker;

/// Piece-square tables.
mod psqt;

/// Types and utilities for rating how good/bad a position is.
mod score;

/// Main engine logic; all search related code.
mod search;

/// Static exchange evaluation of captures.
mod see;

/// The transposition table.
mod ttable;

/// Tunable search constants.
mod tune;

/// Misc utility functions, constants, and types.
mod utils;

pub use board::*;
pub use cli::*;
pub use engine::*;
pub use eval::*;
pub use history::*;
pub use movepicker::*;
pub use psqt::*;
pub use score::*;
pub use search::*;
pub use see::*;
pub use ttable::*;
pub use utils::*;
