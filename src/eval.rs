/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{Color, PieceKind, Position, Psqt, Score};

/// Game-phase contribution of each piece kind (Pawn through Queen).
const PHASE_VALUES: [i32; 5] = [0, 1, 1, 2, 4];

/// Phase of a board with the full starting material.
const TOTAL_PHASE: i32 =
    PHASE_VALUES[1] * 4 + PHASE_VALUES[2] * 4 + PHASE_VALUES[3] * 4 + PHASE_VALUES[4] * 2;

/// Granularity of the phase interpolation.
const PHASE_SCALE: i32 = 256;

/// Returns the material value of `kind` for evaluation purposes.
///
/// Values are obtained from here: <https://www.chessprogramming.org/Simplified_Evaluation_Function>
///
/// The King is invaluable, but 0 is easier to work with in computations;
/// exchange sequences use [`PieceKind::value`] instead.
#[inline(always)]
pub const fn value_of(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::Pawn => 100,
        PieceKind::Knight => 320,
        PieceKind::Bishop => 330,
        PieceKind::Rook => 500,
        PieceKind::Queen => 900,
        PieceKind::King => 0,
    }
}

/// Evaluates `position` from the perspective of the side to move.
///
/// A positive score means the player whose turn it is stands better.
#[inline(always)]
pub fn evaluate(position: &Position) -> Score {
    let white_score = evaluate_for_white(position);

    if position.side_to_move().is_white() {
        white_score
    } else {
        -white_score
    }
}

/// Evaluates `position` from White's perspective: a tapered sum of the
/// mid-game and end-game piece-square tables, weighted by game phase.
fn evaluate_for_white(position: &Position) -> Score {
    let phase = phase(position);

    let mut midgame = 0;
    let mut endgame = 0;

    for color in [Color::White, Color::Black] {
        let sign = if color.is_white() { 1 } else { -1 };

        for kind in PieceKind::all() {
            let (mg, eg) = Psqt::get_tables_for(kind);

            for square in position.pieces(color, kind) {
                midgame += sign * mg.get_relative(square, color);
                endgame += sign * eg.get_relative(square, color);
            }
        }
    }

    Score::new((midgame * (PHASE_SCALE - phase) + endgame * phase) / PHASE_SCALE)
}

/// Computes the game phase of `position`, scaled to `[0, 256]`.
///
/// 0 is the starting position; 256 is a bare-kings endgame.
fn phase(position: &Position) -> i32 {
    let mut phase = TOTAL_PHASE;

    for color in [Color::White, Color::Black] {
        for (kind, phase_value) in PieceKind::all().into_iter().zip(PHASE_VALUES) {
            phase -= position.pieces(color, kind).population() as i32 * phase_value;
        }
    }

    // Positions with extra promoted material clamp to the opening phase
    (phase.max(0) * PHASE_SCALE + TOTAL_PHASE / 2) / TOTAL_PHASE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FEN_STARTPOS;

    #[test]
    fn test_startpos_is_balanced() {
        let position: Position = FEN_STARTPOS.parse().unwrap();
        assert_eq!(evaluate(&position), Score::DRAW);
    }

    #[test]
    fn test_eval_is_side_relative() {
        // White is up a queen; good for White, bad for Black
        let white_up: Position = "4k3/8/8/8/8/8/8/Q3K3 w - - 0 1".parse().unwrap();
        assert!(evaluate(&white_up) > Score::DRAW);

        let black_to_move: Position = "4k3/8/8/8/8/8/8/Q3K3 b - - 0 1".parse().unwrap();
        assert!(evaluate(&black_to_move) < Score::DRAW);
    }

    #[test]
    fn test_eval_symmetry_under_mirroring() {
        // A position and its color-mirrored twin must evaluate identically
        // for the respective side to move
        let original: Position = "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 3"
            .parse()
            .unwrap();
        let mirrored: Position = "rnbqk2r/pppp1ppp/5n2/2b1p3/4P3/2N5/PPPP1PPP/R1BQKBNR b KQkq - 4 3"
            .parse()
            .unwrap();

        assert_eq!(evaluate(&original), evaluate(&mirrored));
    }
}
