/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use newt::{perft, Position, FEN_KIWIPETE, FEN_STARTPOS};

fn test_perft_fen_nodes(depth: usize, fen: &str, expected: u64) {
    let mut position = Position::from_fen(fen).unwrap();
    let nodes = perft(&mut position, depth);
    assert_eq!(nodes, expected, "PERFT({depth}) failed on {fen}");
}

/// <https://www.chessprogramming.org/Perft_Results>
mod standard_perfts {
    use super::*;

    #[test]
    fn test_startpos_perft() {
        test_perft_fen_nodes(1, FEN_STARTPOS, 20);
        test_perft_fen_nodes(2, FEN_STARTPOS, 400);
        test_perft_fen_nodes(3, FEN_STARTPOS, 8_902);
        test_perft_fen_nodes(4, FEN_STARTPOS, 197_281);
    }

    #[test]
    fn test_startpos_perft_5() {
        test_perft_fen_nodes(5, FEN_STARTPOS, 4_865_609);
    }

    #[test]
    fn test_kiwipete_perft() {
        test_perft_fen_nodes(1, FEN_KIWIPETE, 48);
        test_perft_fen_nodes(2, FEN_KIWIPETE, 2_039);
        test_perft_fen_nodes(3, FEN_KIWIPETE, 97_862);
    }

    #[test]
    fn test_kiwipete_perft_4() {
        test_perft_fen_nodes(4, FEN_KIWIPETE, 4_085_603);
    }

    #[test]
    fn test_position_3_perft() {
        let fen = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
        test_perft_fen_nodes(1, fen, 14);
        test_perft_fen_nodes(2, fen, 191);
        test_perft_fen_nodes(3, fen, 2_812);
        test_perft_fen_nodes(4, fen, 43_238);
        test_perft_fen_nodes(5, fen, 674_624);
    }

    #[test]
    fn test_position_4_perft() {
        let fen = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";
        test_perft_fen_nodes(1, fen, 6);
        test_perft_fen_nodes(2, fen, 264);
        test_perft_fen_nodes(3, fen, 9_467);
        test_perft_fen_nodes(4, fen, 422_333);
    }

    #[test]
    fn test_position_5_perft() {
        let fen = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";
        test_perft_fen_nodes(1, fen, 44);
        test_perft_fen_nodes(2, fen, 1_486);
        test_perft_fen_nodes(3, fen, 62_379);
        test_perft_fen_nodes(4, fen, 2_103_487);
    }
}

/// <https://www.chessprogramming.net/perfect-perft/>
mod special_perfts {
    use super::*;

    #[test]
    fn test_promotion_perft() {
        let fen = "n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1";
        test_perft_fen_nodes(1, fen, 24);
        test_perft_fen_nodes(2, fen, 496);
        test_perft_fen_nodes(3, fen, 9_483);
        test_perft_fen_nodes(4, fen, 182_838);
    }

    #[test]
    fn test_illegal_ep_moves() {
        test_perft_fen_nodes(6, "3k4/3p4/8/K1P4r/8/8/8/8 b - - 0 1", 1_134_888);
        test_perft_fen_nodes(6, "8/8/4k3/8/2p5/8/B2P2K1/8 w - - 0 1", 1_015_133);
    }

    #[test]
    fn test_ep_capture_checks_opponent() {
        test_perft_fen_nodes(6, "8/8/1k6/2b5/2pP4/8/5K2/8 b - d3 0 1", 1_440_467);
    }

    #[test]
    fn test_ep_pinned_diagonally() {
        test_perft_fen_nodes(2, "4k3/b7/8/2Pp4/8/8/8/6K1 w - d6 0 1", 45);
        test_perft_fen_nodes(2, "4k3/7b/8/4pP2/8/8/8/1K6 w - e6 0 1", 45);
    }

    #[test]
    fn test_ep_pinned_horizontally() {
        test_perft_fen_nodes(2, "4k3/8/8/K2pP2r/8/8/8/8 w - d6 0 1", 94);
    }

    #[test]
    fn test_castling_gives_check() {
        test_perft_fen_nodes(6, "5k2/8/8/8/8/8/8/4K2R w K - 0 1", 661_072);
        test_perft_fen_nodes(6, "3k4/8/8/8/8/8/8/R3K3 w Q - 0 1", 803_711);
    }

    #[test]
    fn test_castling_rights_tracking() {
        test_perft_fen_nodes(4, "r3k2r/1b4bq/8/8/8/8/7B/R3K2R w KQkq - 0 1", 1_274_206);
    }

    #[test]
    fn test_castling_prevented() {
        test_perft_fen_nodes(4, "r3k2r/8/3Q4/8/8/5q2/8/R3K2R b KQkq - 0 1", 1_720_476);
    }

    #[test]
    fn test_promote_out_of_check() {
        test_perft_fen_nodes(6, "2K2r2/4P3/8/8/8/8/8/3k4 w - - 0 1", 3_821_001);
    }

    #[test]
    fn test_self_stalemate() {
        test_perft_fen_nodes(6, "K1k5/8/P7/8/8/8/8/8 w - - 0 1", 2_217);
    }

    #[test]
    fn test_underpromote_to_give_check() {
        test_perft_fen_nodes(6, "8/P1k5/K7/8/8/8/8/8 w - - 0 1", 92_683);
    }

    #[test]
    fn test_double_check_evasions() {
        test_perft_fen_nodes(2, "4k3/8/4r3/8/8/8/3p4/4K3 w - - 0 1", 80);
        test_perft_fen_nodes(3, "4k3/8/4r3/8/8/8/3p4/4K3 w - - 0 1", 320);
        test_perft_fen_nodes(2, "4k3/8/4q3/8/8/8/3b4/4K3 w - - 0 1", 143);
        test_perft_fen_nodes(3, "4k3/8/4q3/8/8/8/3b4/4K3 w - - 0 1", 496);
    }
}

/// Two different move orders that transpose into the same position must agree
/// on the Zobrist key, or the transposition table could never find them.
#[test]
fn test_transpositions_share_keys() {
    fn play(moves: &[&str]) -> Position {
        let mut position = Position::from_fen(FEN_STARTPOS).unwrap();
        for mv in moves {
            let mv = newt::Move::from_uci(&position, mv).unwrap();
            position.make_move(mv);
        }
        position
    }

    let via_e3 = play(&["e2e3", "e7e6", "d2d3"]);
    let via_d3 = play(&["d2d3", "e7e6", "e2e3"]);

    assert_eq!(via_e3.key(), via_d3.key());
    assert_eq!(via_e3.to_fen(), via_d3.to_fen());

    // The same piece layout with different en passant or castling state must
    // hash differently
    let plain: Position = "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"
        .parse()
        .unwrap();
    let with_ep: Position = "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2"
        .parse()
        .unwrap();
    let fewer_rights: Position = "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w Qkq - 0 2"
        .parse()
        .unwrap();

    assert_ne!(plain.key(), with_ep.key());
    assert_ne!(plain.key(), fewer_rights.key());
}
