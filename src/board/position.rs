/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{anyhow, bail, Context, Result};

use super::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks, Bitboard, Color,
    File, Move, MoveList, Piece, PieceKind, Rank, Square, ZobristKey,
};

/// FEN string for the starting position of chess.
pub const FEN_STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A popular FEN string for debugging move generation.
pub const FEN_KIWIPETE: &str =
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

/// The four castling rights, stored as independent booleans.
///
/// A right being set implies nothing by itself; [`Position::make_move`] clears
/// a right as soon as the relevant king or rook leaves its home square (or the
/// rook is captured there), so a set right always refers to pieces still at home.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingRights {
    /// Number of combinations of the four rights.
    pub const COUNT: usize = 16;

    /// Creates a new [`CastlingRights`] with no rights set.
    #[inline(always)]
    pub const fn none() -> Self {
        Self {
            white_kingside: false,
            white_queenside: false,
            black_kingside: false,
            black_queenside: false,
        }
    }

    /// Packs these rights into a 4-bit index for Zobrist table lookups.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.white_kingside as usize
            | (self.white_queenside as usize) << 1
            | (self.black_kingside as usize) << 2
            | (self.black_queenside as usize) << 3
    }

    /// Clears both of `color`'s rights. Called when `color`'s king moves.
    #[inline(always)]
    pub fn clear_for(&mut self, color: Color) {
        if color.is_white() {
            self.white_kingside = false;
            self.white_queenside = false;
        } else {
            self.black_kingside = false;
            self.black_queenside = false;
        }
    }

    /// Clears the right whose rook lives on `square`, if `square` is a home corner.
    ///
    /// Called both when a rook leaves a corner and when a piece is captured on
    /// one; clearing an already-cleared right is harmless.
    #[inline(always)]
    pub fn clear_for_rook_home(&mut self, square: Square) {
        match square {
            Square::H1 => self.white_kingside = false,
            Square::A1 => self.white_queenside = false,
            Square::H8 => self.black_kingside = false,
            Square::A8 => self.black_queenside = false,
            _ => {}
        }
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index() == 0 {
            return write!(f, "-");
        }

        if self.white_kingside {
            write!(f, "K")?;
        }
        if self.white_queenside {
            write!(f, "Q")?;
        }
        if self.black_kingside {
            write!(f, "k")?;
        }
        if self.black_queenside {
            write!(f, "q")?;
        }
        Ok(())
    }
}

/// Everything [`Position::make_move`] snapshots so that
/// [`Position::unmake_move`] can restore the position exactly.
///
/// The Zobrist key is restored from this snapshot verbatim, never re-derived.
#[derive(Clone, Copy, Debug)]
pub struct UndoRecord {
    /// The move that was made.
    pub mv: Move,

    /// Castling rights before the move.
    castling: CastlingRights,

    /// En passant target square before the move.
    ep_square: Option<Square>,

    /// Halfmove clock before the move.
    halfmove: u8,

    /// Zobrist key before the move.
    key: ZobristKey,
}

/// The full state of a game of chess at one point in time.
///
/// Mutated in place: [`Position::make_move`] applies a move and returns an
/// [`UndoRecord`]; [`Position::unmake_move`] consumes that record to restore
/// the prior state bit-for-bit. Every `make_move` must be paired with exactly
/// one `unmake_move` on all control-flow paths.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Bitboards of occupied squares, indexed by color and piece kind.
    pieces: [[Bitboard; PieceKind::COUNT]; Color::COUNT],

    /// The player whose turn it is.
    side_to_move: Color,

    /// Which castling moves are still permitted.
    castling: CastlingRights,

    /// The square a pawn just double-pushed over, if any.
    ep_square: Option<Square>,

    /// Number of plies since the last pawn move or capture, for the fifty-move rule.
    halfmove: u8,

    /// Number of completed full moves, incremented after each of Black's moves.
    fullmove: u16,

    /// Incrementally-maintained Zobrist hash of this position.
    key: ZobristKey,
}

impl Position {
    /// Creates a new, empty [`Position`]: no pieces, White to move, no rights.
    #[inline(always)]
    pub fn new() -> Self {
        Self {
            pieces: [[Bitboard::EMPTY_BOARD; PieceKind::COUNT]; Color::COUNT],
            side_to_move: Color::White,
            castling: CastlingRights::none(),
            ep_square: None,
            halfmove: 0,
            fullmove: 1,
            key: ZobristKey::default(),
        }
    }

    /// Creates a new [`Position`] from the provided FEN string.
    ///
    /// On error, the message names the FEN field that failed to parse.
    pub fn from_fen(fen: &str) -> Result<Self> {
        let mut position = Self::new();
        let mut split = fen.trim().split(' ');

        let placements = split
            .next()
            .ok_or(anyhow!("FEN string must have piece placements"))?;
        if placements.matches('/').count() != 7 {
            bail!("FEN must have piece placements for all 8 ranks");
        }

        // Reverse the ranks so that White's pieces land at the bottom of the board
        for (rank, rank_placements) in placements.split('/').rev().enumerate() {
            let mut file = 0u8;

            for c in rank_placements.chars() {
                if let Some(empty) = c.to_digit(10) {
                    file += empty as u8;
                } else {
                    let piece = Piece::from_uci(c)
                        .with_context(|| format!("invalid piece placement char {c:?}"))?;
                    if file >= 8 {
                        bail!("rank {} of FEN placements overflows the board", rank + 1);
                    }

                    let square = Square::new(File::new_unchecked(file), Rank::new_unchecked(rank as u8));
                    position.pieces[piece.color().index()][piece.kind().index()] |= square;
                    file += 1;
                }
            }
        }

        for color in [Color::White, Color::Black] {
            if position.pieces(color, PieceKind::King).population() != 1 {
                bail!("FEN placements must contain exactly one {} king", color.name());
            }
        }

        let side = split.next().unwrap_or("w");
        position.side_to_move = side
            .parse()
            .with_context(|| "FEN side-to-move field must be \"w\" or \"b\"")?;

        let castling = split.next().unwrap_or("-");
        for c in castling.chars().filter(|&c| c != '-') {
            match c {
                'K' => position.castling.white_kingside = true,
                'Q' => position.castling.white_queenside = true,
                'k' => position.castling.black_kingside = true,
                'q' => position.castling.black_queenside = true,
                _ => bail!("FEN castling chars must be in [K, Q, k, q]. got {c:?}"),
            }
        }

        let ep = split.next().unwrap_or("-");
        position.ep_square = match ep {
            "-" => None,
            s => Some(
                Square::from_uci(s).with_context(|| "FEN en passant field must be a square")?,
            ),
        };

        let halfmove = split.next().unwrap_or("0");
        position.halfmove = halfmove
            .parse::<u32>()
            .map(|n| n.min(127) as u8)
            .with_context(|| format!("FEN halfmove clock must be an integer. got {halfmove:?}"))?;

        let fullmove = split.next().unwrap_or("1");
        position.fullmove = fullmove
            .parse()
            .with_context(|| format!("FEN fullmove counter must be an integer. got {fullmove:?}"))?;

        position.key = ZobristKey::new(&position);

        Ok(position)
    }

    /// Generates a FEN string of this [`Position`].
    pub fn to_fen(&self) -> String {
        let mut placements = String::with_capacity(64);

        for rank in Rank::iter().rev() {
            let mut empty = 0;
            for file in File::iter() {
                match self.piece_at(Square::new(file, rank)) {
                    Some(piece) => {
                        if empty != 0 {
                            placements += &empty.to_string();
                            empty = 0;
                        }
                        placements.push(piece.char());
                    }
                    None => empty += 1,
                }
            }
            if empty != 0 {
                placements += &empty.to_string();
            }
            if rank != Rank::ONE {
                placements.push('/');
            }
        }

        let ep = self
            .ep_square
            .map(|sq| sq.to_string())
            .unwrap_or(String::from("-"));

        format!(
            "{placements} {} {} {ep} {} {}",
            self.side_to_move, self.castling, self.halfmove, self.fullmove
        )
    }

    /// Returns the bitboard of `color`'s pieces of the provided kind.
    #[inline(always)]
    pub const fn pieces(&self, color: Color, kind: PieceKind) -> Bitboard {
        self.pieces[color.index()][kind.index()]
    }

    /// Returns the bitboard of all of `color`'s pieces.
    #[inline(always)]
    pub fn color_bb(&self, color: Color) -> Bitboard {
        let side = &self.pieces[color.index()];
        side.iter().fold(Bitboard::EMPTY_BOARD, |acc, bb| acc | *bb)
    }

    /// Returns the bitboard of every occupied square.
    #[inline(always)]
    pub fn occupied(&self) -> Bitboard {
        self.color_bb(Color::White) | self.color_bb(Color::Black)
    }

    /// Returns the [`Piece`] standing on `square`, if any.
    #[inline(always)]
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        for color in [Color::White, Color::Black] {
            if let Some(kind) = self.kind_at(color, square) {
                return Some(Piece::new(color, kind));
            }
        }
        None
    }

    /// Returns the kind of `color`'s piece on `square`, if any.
    #[inline(always)]
    pub fn kind_at(&self, color: Color, square: Square) -> Option<PieceKind> {
        PieceKind::all()
            .into_iter()
            .find(|kind| self.pieces(color, *kind).contains(square))
    }

    /// Returns the square of `color`'s king.
    ///
    /// Positions always contain exactly one king per side.
    #[inline(always)]
    pub const fn king_square(&self, color: Color) -> Square {
        self.pieces(color, PieceKind::King).to_square_unchecked()
    }

    /// Returns the player whose turn it is.
    #[inline(always)]
    pub const fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// Returns the current en passant target square, if any.
    #[inline(always)]
    pub const fn ep_square(&self) -> Option<Square> {
        self.ep_square
    }

    /// Returns the current castling rights.
    #[inline(always)]
    pub const fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    /// Returns the halfmove clock: plies since the last pawn move or capture.
    #[inline(always)]
    pub const fn halfmove(&self) -> u8 {
        self.halfmove
    }

    /// Returns the fullmove counter.
    #[inline(always)]
    pub const fn fullmove(&self) -> u16 {
        self.fullmove
    }

    /// Returns the Zobrist key of this [`Position`].
    #[inline(always)]
    pub const fn key(&self) -> ZobristKey {
        self.key
    }

    /// Computes the bitboard of `color`'s pieces that attack `square`, given
    /// the provided occupancy.
    ///
    /// Passing an occupancy other than [`Position::occupied`] evaluates
    /// hypothetical boards, which the static exchange evaluation relies on.
    pub fn attackers_to(&self, square: Square, occupancy: Bitboard, color: Color) -> Bitboard {
        let diagonal = self.pieces(color, PieceKind::Bishop) | self.pieces(color, PieceKind::Queen);
        let orthogonal = self.pieces(color, PieceKind::Rook) | self.pieces(color, PieceKind::Queen);

        (pawn_attacks(square, color.opponent()) & self.pieces(color, PieceKind::Pawn))
            | (knight_attacks(square) & self.pieces(color, PieceKind::Knight))
            | (bishop_attacks(square, occupancy) & diagonal)
            | (rook_attacks(square, occupancy) & orthogonal)
            | (king_attacks(square) & self.pieces(color, PieceKind::King))
    }

    /// Returns `true` if `square` is attacked by any of `color`'s pieces.
    #[inline(always)]
    pub fn is_attacked(&self, square: Square, color: Color) -> bool {
        self.attackers_to(square, self.occupied(), color)
            .is_nonempty()
    }

    /// Returns `true` if `color`'s king is attacked.
    #[inline(always)]
    pub fn is_in_check(&self, color: Color) -> bool {
        self.is_attacked(self.king_square(color), color.opponent())
    }

    /// Generates every pseudo-legal move for the side to move, including castling.
    ///
    /// "Pseudo-legal" means geometrically valid and respecting blockers, but
    /// not filtered for leaving the own king in check; callers enforce
    /// legality by make, check test, unmake.
    pub fn pseudo_legal_moves(&self, moves: &mut MoveList) {
        self.generate_pawn_moves(false, moves);
        self.generate_piece_moves(false, moves);
        self.append_castling(moves);
    }

    /// Generates only the pseudo-legal captures (including en passant) for the
    /// side to move.
    ///
    /// By convention this excludes quiet promotions; quiescence callers that
    /// are in check generate the full move list instead.
    pub fn pseudo_legal_captures(&self, moves: &mut MoveList) {
        self.generate_pawn_moves(true, moves);
        self.generate_piece_moves(true, moves);
    }

    fn generate_pawn_moves(&self, captures_only: bool, moves: &mut MoveList) {
        let color = self.side_to_move;
        let enemy = self.color_bb(color.opponent());
        let empty = !self.occupied();

        for from in self.pieces(color, PieceKind::Pawn) {
            for to in pawn_attacks(from, color) & enemy {
                let captured = self.kind_at(color.opponent(), to);
                self.push_pawn_move(from, to, captured, moves);
            }

            // En passant: the target square is empty, the captured pawn is behind it
            if let Some(ep) = self.ep_square {
                if pawn_attacks(from, color).contains(ep) {
                    let captured_square =
                        Square::from_index_unchecked(ep.index().wrapping_add_signed(
                            [-8, 8][color.index()],
                        ));
                    moves.push(Move::new(
                        from,
                        ep,
                        captured_square,
                        PieceKind::Pawn,
                        Some(PieceKind::Pawn),
                        None,
                    ));
                }
            }

            if captures_only {
                continue;
            }

            let single = from.bitboard().forward_by(color, 1) & empty;
            if let Some(to) = single.to_square() {
                self.push_pawn_move(from, to, None, moves);

                // A second push is available only from the starting rank
                if Bitboard::second_rank(color).contains(from) {
                    if let Some(to) = (single.forward_by(color, 1) & empty).to_square() {
                        moves.push(Move::new_quiet(from, to, PieceKind::Pawn));
                    }
                }
            }
        }
    }

    /// Pushes a pawn move, expanding an arrival on the final rank into the
    /// four possible promotions.
    fn push_pawn_move(
        &self,
        from: Square,
        to: Square,
        captured: Option<PieceKind>,
        moves: &mut MoveList,
    ) {
        if Bitboard::eighth_rank(self.side_to_move).contains(to) {
            for promotion in PieceKind::promotions() {
                moves.push(Move::new(
                    from,
                    to,
                    to,
                    PieceKind::Pawn,
                    captured,
                    Some(promotion),
                ));
            }
        } else {
            moves.push(Move::new(from, to, to, PieceKind::Pawn, captured, None));
        }
    }

    fn generate_piece_moves(&self, captures_only: bool, moves: &mut MoveList) {
        let color = self.side_to_move;
        let friendly = self.color_bb(color);
        let enemy = self.color_bb(color.opponent());
        let occupancy = friendly | enemy;

        for kind in [
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Rook,
            PieceKind::Queen,
            PieceKind::King,
        ] {
            for from in self.pieces(color, kind) {
                let attacks = match kind {
                    PieceKind::Knight => knight_attacks(from),
                    PieceKind::Bishop => bishop_attacks(from, occupancy),
                    PieceKind::Rook => rook_attacks(from, occupancy),
                    PieceKind::Queen => {
                        bishop_attacks(from, occupancy) | rook_attacks(from, occupancy)
                    }
                    _ => king_attacks(from),
                };

                let targets = if captures_only {
                    attacks & enemy
                } else {
                    attacks & !friendly
                };

                for to in targets {
                    let captured = self.kind_at(color.opponent(), to);
                    moves.push(Move::new(from, to, to, kind, captured, None));
                }
            }
        }
    }

    /// Appends the castling moves available to the side to move.
    ///
    /// A castle requires the right to still be held, the squares between king
    /// and rook to be empty, and every square the king traverses (start and
    /// end included) to be unattacked; castling across check is forbidden.
    fn append_castling(&self, moves: &mut MoveList) {
        use Square as S;

        let color = self.side_to_move;
        let occupancy = self.occupied();
        let rights = self.castling;

        type CastleRow = (bool, Bitboard, [Square; 3], Square, Square);
        let rows: [CastleRow; 2] = if color.is_white() {
            [
                (
                    rights.white_kingside,
                    S::F1.bitboard().or(S::G1.bitboard()),
                    [S::E1, S::F1, S::G1],
                    S::E1,
                    S::G1,
                ),
                (
                    rights.white_queenside,
                    S::B1.bitboard().or(S::C1.bitboard()).or(S::D1.bitboard()),
                    [S::E1, S::D1, S::C1],
                    S::E1,
                    S::C1,
                ),
            ]
        } else {
            [
                (
                    rights.black_kingside,
                    S::F8.bitboard().or(S::G8.bitboard()),
                    [S::E8, S::F8, S::G8],
                    S::E8,
                    S::G8,
                ),
                (
                    rights.black_queenside,
                    S::B8.bitboard().or(S::C8.bitboard()).or(S::D8.bitboard()),
                    [S::E8, S::D8, S::C8],
                    S::E8,
                    S::C8,
                ),
            ]
        };

        for (right, between, king_path, from, to) in rows {
            let path_is_safe = || {
                king_path
                    .iter()
                    .all(|&sq| !self.is_attacked(sq, color.opponent()))
            };

            if right && (occupancy & between).is_empty() && path_is_safe() {
                moves.push(Move::new_quiet(from, to, PieceKind::King));
            }
        }
    }

    /// Applies `mv` to this [`Position`], returning the [`UndoRecord`] that
    /// reverses it.
    ///
    /// The Zobrist key, castling rights, en passant square, and halfmove clock
    /// are all updated incrementally.
    pub fn make_move(&mut self, mv: Move) -> UndoRecord {
        let undo = UndoRecord {
            mv,
            castling: self.castling,
            ep_square: self.ep_square,
            halfmove: self.halfmove,
            key: self.key,
        };

        let color = self.side_to_move;
        let opponent = color.opponent();
        let (from, to, kind) = (mv.from(), mv.to(), mv.kind());

        // Move the piece, replacing it with the promotion result if promoting
        let final_kind = mv.promotion().unwrap_or(kind);
        self.pieces[color.index()][kind.index()] ^= from;
        self.pieces[color.index()][final_kind.index()] ^= to;
        self.key.hash_piece(color, kind, from);
        self.key.hash_piece(color, final_kind, to);

        // Castling also slides the rook along the home rank
        if mv.is_castling() {
            let (rook_from, rook_to) = Self::castling_rook_squares(to);
            self.pieces[color.index()][PieceKind::Rook.index()] ^=
                rook_from.bitboard() | rook_to;
            self.key.hash_piece(color, PieceKind::Rook, rook_from);
            self.key.hash_piece(color, PieceKind::Rook, rook_to);
        }

        // Remove the captured piece; its square differs from `to` only on en passant
        if let Some(captured) = mv.captured() {
            let captured_square = mv.captured_square();
            self.pieces[opponent.index()][captured.index()] ^= captured_square;
            self.key.hash_piece(opponent, captured, captured_square);
        }

        // Clear the old en passant square, and set a new one on a double push
        if let Some(old_ep) = self.ep_square.take() {
            self.key.hash_ep_file(old_ep.file());
        }
        let is_double_push = matches!(kind, PieceKind::Pawn)
            && from.rank().inner().abs_diff(to.rank().inner()) == 2;
        if is_double_push {
            let ep = Square::from_index_unchecked((from.index() + to.index()) / 2);
            self.ep_square = Some(ep);
            self.key.hash_ep_file(ep.file());
        }

        // Re-hash castling rights around whatever this move clears
        self.key.hash_castling_rights(&self.castling);
        if matches!(kind, PieceKind::King) {
            self.castling.clear_for(color);
        }
        if matches!(kind, PieceKind::Rook) {
            self.castling.clear_for_rook_home(from);
        }
        if mv.captured() == Some(PieceKind::Rook) {
            self.castling.clear_for_rook_home(mv.captured_square());
        }
        self.key.hash_castling_rights(&self.castling);

        // The halfmove clock resets on pawn moves and captures
        if mv.is_capture() || matches!(kind, PieceKind::Pawn) {
            self.halfmove = 0;
        } else {
            self.halfmove = (self.halfmove + 1).min(127);
        }

        if !color.is_white() {
            self.fullmove += 1;
        }
        self.key.hash_side_to_move();
        self.side_to_move = opponent;

        undo
    }

    /// Reverses the move recorded in `undo`, restoring this [`Position`]
    /// bit-for-bit to its state before the corresponding [`Position::make_move`].
    pub fn unmake_move(&mut self, undo: UndoRecord) {
        let mv = undo.mv;
        let color = self.side_to_move.opponent();
        self.side_to_move = color;

        if !color.is_white() {
            self.fullmove -= 1;
        }

        let kind = mv.kind();
        let final_kind = mv.promotion().unwrap_or(kind);
        self.pieces[color.index()][final_kind.index()] ^= mv.to();
        self.pieces[color.index()][kind.index()] ^= mv.from();

        if mv.is_castling() {
            let (rook_from, rook_to) = Self::castling_rook_squares(mv.to());
            self.pieces[color.index()][PieceKind::Rook.index()] ^=
                rook_from.bitboard() | rook_to;
        }

        if let Some(captured) = mv.captured() {
            self.pieces[color.opponent().index()][captured.index()] ^= mv.captured_square();
        }

        self.castling = undo.castling;
        self.ep_square = undo.ep_square;
        self.halfmove = undo.halfmove;
        self.key = undo.key;
    }

    /// Returns the (from, to) squares of the rook participating in a castle,
    /// given the king's destination square.
    #[inline(always)]
    const fn castling_rook_squares(king_to: Square) -> (Square, Square) {
        match king_to {
            Square::G1 => (Square::H1, Square::F1),
            Square::C1 => (Square::A1, Square::D1),
            Square::G8 => (Square::H8, Square::F8),
            _ => (Square::A8, Square::D8),
        }
    }
}

impl Default for Position {
    /// A default [`Position`] is the standard starting position.
    #[inline(always)]
    fn default() -> Self {
        // Safe unwrap: the starting position FEN is well-formed
        Self::from_fen(FEN_STARTPOS).unwrap()
    }
}

impl FromStr for Position {
    type Err = anyhow::Error;

    #[inline(always)]
    fn from_str(s: &str) -> Result<Self> {
        Self::from_fen(s)
    }
}

impl fmt::Display for Position {
    /// Prints the board as an 8x8 grid with White at the bottom, followed by
    /// the position's FEN and key.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            write!(f, "{rank}| ")?;
            for file in File::iter() {
                let c = self
                    .piece_at(Square::new(file, rank))
                    .map(|piece| piece.char())
                    .unwrap_or('.');
                write!(f, "{c} ")?;
            }
            writeln!(f)?;
        }
        writeln!(f, " +----------------")?;
        write!(f, "   ")?;
        for file in File::iter() {
            write!(f, "{file} ")?;
        }
        writeln!(f)?;
        writeln!(f)?;
        writeln!(f, "fen: {}", self.to_fen())?;
        write!(f, "key: {:#018X}", self.key.inner())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::XoShiRo;

    #[test]
    fn test_fen_round_trip() {
        for fen in [
            FEN_STARTPOS,
            FEN_KIWIPETE,
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "4k3/8/8/8/2pP4/8/8/4K3 b - d3 0 3",
        ] {
            let position = Position::from_fen(fen).unwrap();
            assert_eq!(position.to_fen(), fen);
        }
    }

    #[test]
    fn test_fen_rejects_malformed_fields() {
        assert!(Position::from_fen("8/8/8/8/8/8/8 w - - 0 1").is_err());
        assert!(Position::from_fen("9k6/8/8/8/8/8/8/K7 w - - 0 1").is_err());
        assert!(Position::from_fen("k7/8/8/8/8/8/8/K7 x - - 0 1").is_err());
        assert!(Position::from_fen("k7/8/8/8/8/8/8/K7 w ABC - 0 1").is_err());
        assert!(Position::from_fen("k7/8/8/8/8/8/8/K7 w - e9 0 1").is_err());
        assert!(Position::from_fen("k7/8/8/8/8/8/8/K7 w - - x 1").is_err());
        // Missing a king entirely
        assert!(Position::from_fen("8/8/8/8/8/8/8/K7 w - - 0 1").is_err());
    }

    #[test]
    fn test_startpos_move_counts() {
        let position = Position::default();
        let mut moves = MoveList::new();
        position.pseudo_legal_moves(&mut moves);
        assert_eq!(moves.len(), 20);

        let mut captures = MoveList::new();
        position.pseudo_legal_captures(&mut captures);
        assert!(captures.is_empty());
    }

    #[test]
    fn test_attack_queries() {
        let position = Position::default();

        // e4 is not yet attacked by White's pawns, but d3 is
        assert!(position.is_attacked(Square::D3, Color::White));
        assert!(!position.is_in_check(Color::White));
        assert!(!position.is_in_check(Color::Black));

        // Scholar's-mate-adjacent position: Black is in check
        let checked: Position = "rnbqkbnr/ppppp1pp/8/5p1Q/4P3/8/PPPP1PPP/RNB1KBNR b KQkq - 0 1"
            .parse()
            .unwrap();
        assert!(checked.is_in_check(Color::Black));
        assert!(!checked.is_in_check(Color::White));
    }

    #[test]
    fn test_make_unmake_is_an_involution() {
        // Walk a handful of pseudo-random legal lines from assorted positions,
        // verifying unmake restores the position exactly at every step
        let fens = [
            FEN_STARTPOS,
            FEN_KIWIPETE,
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        ];
        let mut prng = XoShiRo::new();

        for fen in fens {
            let mut position = Position::from_fen(fen).unwrap();

            for _ in 0..40 {
                let before = position;
                let mut moves = MoveList::new();
                position.pseudo_legal_moves(&mut moves);

                // Every pseudo-legal move must unmake cleanly, legal or not
                for &mv in &moves {
                    let undo = position.make_move(mv);
                    position.unmake_move(undo);
                    assert!(
                        position == before,
                        "make/unmake of {mv} corrupted {fen:?}\ngot: {position}"
                    );
                }

                // Then actually advance along a random legal move
                let legal: Vec<_> = moves
                    .iter()
                    .copied()
                    .filter(|&mv| {
                        let undo = position.make_move(mv);
                        let ok = !position.is_in_check(position.side_to_move().opponent());
                        position.unmake_move(undo);
                        ok
                    })
                    .collect();

                let Some(&mv) = legal.get(prng.get_next() as usize % legal.len().max(1)) else {
                    break;
                };
                position.make_move(mv);
            }
        }
    }

    #[test]
    fn test_incremental_key_matches_recomputation() {
        let mut position = Position::from_fen(FEN_KIWIPETE).unwrap();
        let mut moves = MoveList::new();
        position.pseudo_legal_moves(&mut moves);

        for &mv in &moves {
            let undo = position.make_move(mv);
            assert_eq!(
                position.key(),
                ZobristKey::new(&position),
                "incremental key diverged after {mv}"
            );
            position.unmake_move(undo);
        }
    }

    #[test]
    fn test_castling_updates_rights_and_rook() {
        let mut position: Position = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1".parse().unwrap();

        let castle = Move::from_uci(&position, "e1g1").unwrap();
        assert!(castle.is_castling());

        position.make_move(castle);
        assert!(position.pieces(Color::White, PieceKind::Rook).contains(Square::F1));
        assert!(!position.castling_rights().white_kingside);
        assert!(!position.castling_rights().white_queenside);
        assert!(position.castling_rights().black_kingside);
    }

    #[test]
    fn test_capture_on_rook_home_clears_right() {
        let mut position: Position = "r3k3/8/8/8/8/8/8/R3K2B w Qq - 0 1".parse().unwrap();

        // Bishop takes the a8 rook; Black's queenside right must go with it
        let mv = Move::from_uci(&position, "h1a8").unwrap();
        position.make_move(mv);
        assert!(!position.castling_rights().black_queenside);
        assert!(position.castling_rights().white_queenside);
    }
}
