/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{
    bishop_attacks, ray_containing, rook_attacks, Bitboard, Color, Move, PieceKind, Position, Rank,
    Square,
};

/// Hard cap on the number of exchanges on a single square.
///
/// Never reached in a legal position: there are at most 32 pieces on the board.
const MAX_EXCHANGES: usize = 32;

/// [Static exchange evaluation](https://www.chessprogramming.org/Static_Exchange_Evaluation)
/// of the capture `mv`: the net material gained by the side to move if both
/// players keep recapturing on the destination square with their least
/// valuable piece until neither profits from continuing.
///
/// Implemented as a swap-off over the square's attacker set, extended with
/// X-ray attackers as pieces are removed, and filtered for absolute pins:
/// a pinned piece may only take part in the exchange along its pin line.
pub fn see(position: &Position, mv: Move) -> i32 {
    let to = mv.to();
    let mut gain = [0i32; MAX_EXCHANGES];
    let mut depth = 0;

    let mut side = position.side_to_move();

    // Pieces that a slider attack can be revealed behind
    let may_xray = position.pieces(Color::White, PieceKind::Pawn)
        | position.pieces(Color::Black, PieceKind::Pawn)
        | position.pieces(Color::White, PieceKind::Bishop)
        | position.pieces(Color::Black, PieceKind::Bishop)
        | position.pieces(Color::White, PieceKind::Rook)
        | position.pieces(Color::Black, PieceKind::Rook)
        | position.pieces(Color::White, PieceKind::Queen)
        | position.pieces(Color::Black, PieceKind::Queen);

    let mut occupancy = position.occupied();
    let mut attackers = position.attackers_to(to, occupancy, Color::White)
        | position.attackers_to(to, occupancy, Color::Black);
    let mut from_set = mv.from().bitboard();
    let mut attacker_kind = mv.kind();

    let mut side_occupancy = [
        position.color_bb(Color::White),
        position.color_bb(Color::Black),
    ];
    let mut king_squares = [
        position.king_square(Color::White),
        position.king_square(Color::Black),
    ];

    let captured_value = mv.captured().map(|kind| kind.value()).unwrap_or(0);
    gain[0] = match mv.promotion() {
        Some(promotion) => promotion.value() - PieceKind::Pawn.value() + captured_value,
        None => captured_value,
    };

    loop {
        side = side.opponent();
        depth += 1;

        // The piece being consumed this round belongs to the side that just captured
        let consumed = side.opponent();

        // A pawn arriving on its final rank is worth a queen to the recapturer
        let promoting = matches!(attacker_kind, PieceKind::Pawn)
            && to.rank().inner() == Rank::eighth(consumed).inner();
        gain[depth] = if promoting {
            PieceKind::Queen.value() - PieceKind::Pawn.value()
        } else {
            attacker_kind.value()
        } - gain[depth - 1];

        // Remove the consumed attacker from every tracked set
        attackers &= !from_set;
        occupancy ^= from_set;
        side_occupancy[consumed.index()] ^= from_set;

        // Pinned recapturers may only move along the line through their king
        let pinned = pinned_attackers(position, side, king_squares[side.index()], &side_occupancy);
        let pin_line = ray_containing(king_squares[side.index()], to);
        attackers = (attackers & !pinned) | (pinned & pin_line);

        // The capture may have exposed a slider (or pawn) behind the consumed piece
        if (from_set & may_xray).is_nonempty() {
            let recomputed = position.attackers_to(to, occupancy, Color::White)
                | position.attackers_to(to, occupancy, Color::Black);
            attackers |= recomputed & occupancy;
        }

        // A capturing king now stands on the contested square
        if matches!(attacker_kind, PieceKind::King) {
            king_squares[consumed.index()] = to;
        }

        let Some((next_set, next_kind)) = least_valuable_attacker(position, attackers, side) else {
            break;
        };
        from_set = next_set;
        attacker_kind = next_kind;

        if depth + 1 >= MAX_EXCHANGES {
            break;
        }
    }

    // Fold the speculative gains back into a single minimax value: at every
    // stage, the side to move may stand pat instead of recapturing at a loss
    while depth > 1 {
        depth -= 1;
        gain[depth - 1] = -(-gain[depth - 1]).max(gain[depth]);
    }

    gain[0]
}

/// Computes the bitboard of `side`'s pieces that are absolutely pinned to
/// their king, given the exchange's current per-side occupancies.
fn pinned_attackers(
    position: &Position,
    side: Color,
    king_square: Square,
    side_occupancy: &[Bitboard; 2],
) -> Bitboard {
    let enemy = side.opponent();
    let own_occ = side_occupancy[side.index()];
    let enemy_occ = side_occupancy[enemy.index()];
    let occupancy = own_occ | enemy_occ;

    let diagonal_sliders =
        position.pieces(enemy, PieceKind::Bishop) | position.pieces(enemy, PieceKind::Queen);
    let orthogonal_sliders =
        position.pieces(enemy, PieceKind::Rook) | position.pieces(enemy, PieceKind::Queen);

    let mut pinned = Bitboard::EMPTY_BOARD;

    // Cast rays from the king that see through everything except enemy sliders;
    // any slider hit is a potential pinner if exactly one friendly piece
    // stands between it and the king.
    let diagonal_rays = bishop_attacks(king_square, diagonal_sliders);
    for pinner in diagonal_rays & diagonal_sliders & enemy_occ {
        let between = bishop_attacks(pinner, occupancy) & diagonal_rays & own_occ;
        if between.population() == 1 {
            pinned |= between;
        }
    }

    let orthogonal_rays = rook_attacks(king_square, orthogonal_sliders);
    for pinner in orthogonal_rays & orthogonal_sliders & enemy_occ {
        let between = rook_attacks(pinner, occupancy) & orthogonal_rays & own_occ;
        if between.population() == 1 {
            pinned |= between;
        }
    }

    pinned
}

/// Picks `side`'s least valuable piece in `attackers`, returning its bitboard
/// and kind, or `None` if `side` has no attackers left.
fn least_valuable_attacker(
    position: &Position,
    attackers: Bitboard,
    side: Color,
) -> Option<(Bitboard, PieceKind)> {
    for kind in PieceKind::all() {
        let candidates = position.pieces(side, kind) & attackers;
        if candidates.is_nonempty() {
            return Some((candidates.lsb(), kind));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn see_of(fen: &str, mv: &str) -> i32 {
        let position: Position = fen.parse().unwrap();
        let mv = Move::from_uci(&position, mv).unwrap();
        see(&position, mv)
    }

    #[test]
    fn test_see_unchallenged_capture() {
        // Rook takes a pawn nobody defends
        assert_eq!(
            see_of("1k1r4/1pp4p/p7/4p3/8/P5P1/1PP4P/2K1R3 w - - 0 1", "e1e5"),
            100
        );
    }

    #[test]
    fn test_see_xray_and_pin_aware_exchange() {
        // Knight takes a defended pawn; the exchange runs through X-rayed
        // sliders and comes out clearly losing
        assert_eq!(
            see_of(
                "1k1r3q/1ppn3p/p4b2/4p3/8/P2N2P1/1PP1R1BP/2K1Q3 w - - 0 1",
                "d3e5"
            ),
            -220
        );
    }

    #[test]
    fn test_see_even_trade() {
        // Pawn takes pawn, pawn recaptures: dead even
        assert_eq!(see_of("k7/8/3p4/4p3/3P4/8/8/K7 w - - 0 1", "d4e5"), 0);
    }

    #[test]
    fn test_see_losing_capture() {
        // Queen grabs a pawn defended by a pawn
        assert_eq!(
            see_of("k7/8/3p4/4p3/8/8/4Q3/K7 w - - 0 1", "e2e5"),
            100 - 900
        );
    }

    #[test]
    fn test_see_capture_promotion() {
        // Pawn captures into promotion, unchallenged: wins a knight plus the
        // pawn-to-queen upgrade
        assert_eq!(
            see_of("3n3k/4P3/8/8/8/8/8/4K3 w - - 0 1", "e7d8q"),
            320 + 900 - 100
        );
    }
}
