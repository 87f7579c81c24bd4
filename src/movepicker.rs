/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use arrayvec::ArrayVec;

use crate::{see, HistoryTable, Move, MoveList, PieceKind, Position, MAX_MOVES};

/// The staged ordering buckets, from last-searched to first-searched.
///
/// Checks are not detected before a move is made, so checking moves are
/// ranked by whichever other bucket they fall into.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[repr(u8)]
pub enum Bucket {
    /// Anything that earned no other classification.
    Quiet = 0,

    /// Captures that lose material according to [`see`].
    BadCapture = 1,

    /// Quiet moves with a nonzero history score.
    History = 2,

    /// Non-capturing promotions.
    Promotion = 3,

    /// Quiet moves matching a killer slot for the current ply.
    Killer = 4,

    /// Captures that at least break even according to [`see`].
    GoodCapture = 5,

    /// The hash move: the best move stored for this position in the
    /// transposition table.
    TtMove = 6,
}

impl Bucket {
    const SHIFT: u32 = 18;

    /// Recovers a [`Bucket`] from a composite picker score.
    #[inline(always)]
    const fn from_score(score: i32) -> Self {
        match score >> Self::SHIFT {
            0 => Self::Quiet,
            1 => Self::BadCapture,
            2 => Self::History,
            3 => Self::Promotion,
            4 => Self::Killer,
            5 => Self::GoodCapture,
            _ => Self::TtMove,
        }
    }
}

/// This table represents values for
/// [MVV-LVA](https://www.chessprogramming.org/MVV-LVA) capture ordering:
/// prefer the Most Valuable Victim, tie-break by the Least Valuable Aggressor.
///
/// Indexed by `[aggressor][victim]`.
const MVV_LVA: [[i32; PieceKind::COUNT]; PieceKind::COUNT] = {
    let mut matrix = [[0; PieceKind::COUNT]; PieceKind::COUNT];

    let mut aggressor = 0;
    while aggressor < PieceKind::COUNT {
        let mut victim = 0;
        while victim < PieceKind::COUNT {
            let victim_kind = PieceKind::from_bits_unchecked(victim as u8);
            matrix[aggressor][victim] = 10 * victim_kind.value() + (5 - aggressor as i32);
            victim += 1;
        }
        aggressor += 1;
    }

    matrix
};

/// Distributes a move list into the ordering buckets of [`Bucket`] and yields
/// the moves best-first.
///
/// Rather than materializing one list per bucket, each move gets a composite
/// score (bucket in the high bits, the within-bucket sort key in the low bits)
/// and the iterator lazily selection-sorts: nodes that cut off early never pay
/// for ordering the moves they skip.
pub struct MovePicker {
    moves: MoveList,
    scores: ArrayVec<i32, MAX_MOVES>,
    current: usize,
}

impl MovePicker {
    /// Creates a new [`MovePicker`] over `moves`.
    ///
    /// `tt_move` is the hash move for the position (if any), `killers` the two
    /// killer slots for the current ply, and `history` the quiet-move history
    /// for the side to move.
    pub fn new(
        moves: MoveList,
        position: &Position,
        tt_move: Option<Move>,
        killers: [Move; 2],
        history: &HistoryTable,
    ) -> Self {
        let mut scores = ArrayVec::new();
        let side = position.side_to_move();

        for &mv in &moves {
            let (bucket, key) = if tt_move == Some(mv) {
                (Bucket::TtMove, 0)
            } else if let Some(victim) = mv.captured() {
                let bucket = if see(position, mv) >= 0 {
                    Bucket::GoodCapture
                } else {
                    Bucket::BadCapture
                };
                (bucket, MVV_LVA[mv.kind().index()][victim.index()])
            } else if killers.contains(&mv) {
                (Bucket::Killer, 0)
            } else if mv.promotion().is_some() {
                (Bucket::Promotion, 0)
            } else {
                match history.get(side, mv) {
                    0 => (Bucket::Quiet, 0),
                    score => (Bucket::History, score as i32),
                }
            };

            scores.push(((bucket as i32) << Bucket::SHIFT) | key);
        }

        Self {
            moves,
            scores,
            current: 0,
        }
    }
}

impl Iterator for MovePicker {
    type Item = (Move, Bucket);

    fn next(&mut self) -> Option<Self::Item> {
        // No more moves left
        if self.current >= self.moves.len() {
            return None;
        }

        // Find the index of the best remaining score
        let mut best_index = self.current;
        for i in (self.current + 1)..self.moves.len() {
            if self.scores[i] > self.scores[best_index] {
                best_index = i;
            }
        }

        // Swap it into the current slot, if necessary
        if best_index != self.current {
            self.moves.swap(self.current, best_index);
            self.scores.swap(self.current, best_index);
        }

        let mv = self.moves[self.current];
        let bucket = Bucket::from_score(self.scores[self.current]);

        self.current += 1;

        Some((mv, bucket))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, Square};

    fn pick_all(fen: &str, tt_move: Option<&str>) -> Vec<(Move, Bucket)> {
        let position: Position = fen.parse().unwrap();
        let mut moves = MoveList::new();
        position.pseudo_legal_moves(&mut moves);

        let tt_move = tt_move.map(|s| Move::from_uci(&position, s).unwrap());
        let history = HistoryTable::default();

        MovePicker::new(
            moves,
            &position,
            tt_move,
            [Move::illegal(); 2],
            &history,
        )
        .collect()
    }

    #[test]
    fn test_tt_move_comes_first() {
        let picked = pick_all(crate::FEN_KIWIPETE, Some("a2a3"));

        let (first, bucket) = picked[0];
        assert_eq!(first.to_string(), "a2a3");
        assert_eq!(bucket, Bucket::TtMove);
    }

    #[test]
    fn test_buckets_never_interleave() {
        let picked = pick_all(crate::FEN_KIWIPETE, None);

        // Bucket ranks must be non-increasing over the whole sequence
        for pair in picked.windows(2) {
            assert!(
                pair[0].1 >= pair[1].1,
                "{:?} ({:?}) yielded before {:?} ({:?})",
                pair[0].0,
                pair[0].1,
                pair[1].0,
                pair[1].1
            );
        }
    }

    #[test]
    fn test_good_captures_sorted_by_mvv_lva() {
        // White can win an undefended queen or an undefended knight, both
        // with pawns; the bigger victim must come first
        let picked = pick_all("k7/8/4q3/3P4/2n5/1P6/8/K2R4 w - - 0 1", None);

        let good: Vec<_> = picked
            .iter()
            .filter(|(_, bucket)| *bucket == Bucket::GoodCapture)
            .map(|(mv, _)| mv.to_string())
            .collect();

        assert_eq!(good, ["d5e6", "b3c4"]);
    }

    #[test]
    fn test_history_scores_order_quiets() {
        let position: Position = crate::FEN_STARTPOS.parse().unwrap();
        let mut moves = MoveList::new();
        position.pseudo_legal_moves(&mut moves);

        let mut history = HistoryTable::default();
        let knight = Move::new_quiet(Square::G1, Square::F3, PieceKind::Knight);
        let pawn = Move::new_quiet(Square::E2, Square::E4, PieceKind::Pawn);
        history.update(Color::White, knight, 3);
        history.update(Color::White, pawn, 7);

        let picked: Vec<_> =
            MovePicker::new(moves, &position, None, [Move::illegal(); 2], &history).collect();

        assert_eq!(picked[0].0, pawn);
        assert_eq!(picked[0].1, Bucket::History);
        assert_eq!(picked[1].0, knight);
    }
}
