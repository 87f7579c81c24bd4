/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{MoveList, Position};

/// Perform a perft at the specified depth, counting the number of reachable
/// positions (nodes).
///
/// This performs bulk counting: at depth 1 it returns the number of legal
/// moves rather than making each one and returning 1 from the leaves.
pub fn perft(position: &mut Position, depth: usize) -> u64 {
    // Recursion limit; we're fathoming this node.
    if depth == 0 {
        return 1;
    }

    let mut moves = MoveList::new();
    position.pseudo_legal_moves(&mut moves);

    let mut nodes = 0;
    for mv in moves {
        let undo = position.make_move(mv);

        // Legality filter: the mover's king may not be left in check
        if !position.is_in_check(position.side_to_move().opponent()) {
            nodes += if depth == 1 {
                1
            } else {
                perft(position, depth - 1)
            };
        }

        position.unmake_move(undo);
    }

    nodes
}

/// Perform a perft at the specified depth, printing the node count reachable
/// after each root move before returning the total.
pub fn splitperft(position: &mut Position, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut moves = MoveList::new();
    position.pseudo_legal_moves(&mut moves);

    let mut nodes = 0;
    for mv in moves {
        let undo = position.make_move(mv);

        if !position.is_in_check(position.side_to_move().opponent()) {
            let new_nodes = perft(position, depth - 1);
            println!("{mv}\t{new_nodes}");
            nodes += new_nodes;
        }

        position.unmake_move(undo);
    }

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FEN_STARTPOS;

    #[test]
    fn test_startpos_shallow_perft() {
        let mut position: Position = FEN_STARTPOS.parse().unwrap();
        assert_eq!(perft(&mut position, 0), 1);
        assert_eq!(perft(&mut position, 1), 20);
        assert_eq!(perft(&mut position, 2), 400);
        assert_eq!(perft(&mut position, 3), 8902);
    }
}
