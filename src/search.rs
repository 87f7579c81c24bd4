/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    marker::PhantomData,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, LazyLock,
    },
    time::{Duration, Instant},
};

use uci_parser::{UciInfo, UciResponse, UciSearchOptions};

use crate::{
    evaluate, tune, Bound, Bucket, HistoryTable, Killers, LogLevel, Move, MoveList, MovePicker,
    Position, Score, TTable, TTableEntry, ZobristKey,
};

/// Maximum ply the search may reach; killer slots and the reduction table are
/// sized by it.
pub const MAX_PLY: usize = 64;

/// Capacity of the repetition ring buffer: comfortably more than twice the
/// deepest search plus the reversible prefix of any real game.
const ZOBRIST_HISTORY_SIZE: usize = 256;

/// Widest move list the reduction table is indexed by.
const REDUCTION_MAX_MOVES: usize = 219;

/// Precomputed [late-move-reduction](https://www.chessprogramming.org/Late_Move_Reductions)
/// values, indexed by depth and by how many moves the node has already searched.
static REDUCTION_TABLE: LazyLock<[[u8; REDUCTION_MAX_MOVES]; MAX_PLY]> = LazyLock::new(|| {
    let mut table = [[1u8; REDUCTION_MAX_MOVES]; MAX_PLY];

    for (depth, row) in table.iter_mut().enumerate() {
        for (index, reduction) in row.iter_mut().enumerate() {
            let r =
                1.0 + ((index + 1) as f32).ln() * ((depth + 1) as f32).ln() / tune::lmr_divisor!();
            *reduction = (r as u8).clamp(1, tune::max_lmr_reduction!());
        }
    }

    table
});

/// Looks up the reduction to apply at `depth` after `move_index` searched moves.
#[inline(always)]
fn reduction(depth: u8, move_index: usize) -> u8 {
    REDUCTION_TABLE[(depth as usize).min(MAX_PLY - 1)][move_index.min(REDUCTION_MAX_MOVES - 1)]
}

/// A marker trait for the types of nodes encountered during search.
///
/// Principal-variation nodes are searched with a meaningful window and are
/// exempt from speculative pruning; everything else runs with a null window.
trait NodeType {
    /// Is this node expected to lie on the principal variation?
    const PV: bool;
}

/// A node on the principal variation, searched with a non-null window.
struct PvNode;
impl NodeType for PvNode {
    const PV: bool = true;
}

/// A node not on the principal variation, searched with a null window.
struct NonPvNode;
impl NodeType for NonPvNode {
    const PV: bool = false;
}

/// A fixed-capacity ring of the Zobrist keys of ancestor positions.
///
/// A key is pushed before every move is made and popped when it is unmade, so
/// at any node the ring holds the line leading to it (and the game prefix).
/// Threefold repetition holds when the current key already appears twice.
#[derive(Debug)]
pub struct RepetitionHistory {
    keys: [u64; ZOBRIST_HISTORY_SIZE],
    index: usize,
}

impl RepetitionHistory {
    /// The key stored in unused slots.
    const NO_KEY: u64 = u64::MAX;

    /// Creates a new, empty [`RepetitionHistory`].
    #[inline(always)]
    pub fn new() -> Self {
        Self {
            keys: [Self::NO_KEY; ZOBRIST_HISTORY_SIZE],
            index: 0,
        }
    }

    /// Empties the ring and refills it with the provided game-history keys.
    pub fn seed(&mut self, history: &[ZobristKey]) {
        *self = Self::new();

        let skip = history.len().saturating_sub(ZOBRIST_HISTORY_SIZE);
        for key in &history[skip..] {
            self.push(*key);
        }
    }

    /// Records `key` as an ancestor.
    #[inline(always)]
    pub fn push(&mut self, key: ZobristKey) {
        self.keys[self.index] = key.inner();
        self.index = (self.index + 1) % ZOBRIST_HISTORY_SIZE;
    }

    /// Forgets the most recently pushed key.
    #[inline(always)]
    pub fn pop(&mut self) {
        self.index = (self.index + ZOBRIST_HISTORY_SIZE - 1) % ZOBRIST_HISTORY_SIZE;
        self.keys[self.index] = Self::NO_KEY;
    }

    /// Returns `true` if `key` appears at least twice among the ancestors,
    /// making the live position its third occurrence.
    #[inline(always)]
    pub fn is_threefold(&self, key: ZobristKey) -> bool {
        self.keys.iter().filter(|&&k| k == key.inner()).count() >= 2
    }
}

impl Default for RepetitionHistory {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

/// The alpha-beta window used for one root iteration.
///
/// For deep enough iterations the window starts narrow, centered on the
/// previous iteration's score; if the new score lands outside it, the search
/// is redone with the full window.
#[derive(Debug, Clone, Copy)]
struct AspirationWindow {
    alpha: Score,
    beta: Score,
}

impl AspirationWindow {
    /// Creates a new [`AspirationWindow`] around `score`.
    ///
    /// Shallow iterations and mate scores fluctuate too much to aspire on, so
    /// those get the full window immediately.
    #[inline(always)]
    fn new(score: Score, depth: u8) -> Self {
        if depth < tune::min_aspiration_window_depth!() || score.is_mate() {
            Self {
                alpha: Score::ALPHA,
                beta: Score::BETA,
            }
        } else {
            let delta = tune::aspiration_window_delta!();
            Self {
                alpha: (score - delta).max(Score::ALPHA),
                beta: (score + delta).min(Score::BETA),
            }
        }
    }

    /// Returns `true` if `score` fell outside this window and cannot be trusted.
    #[inline(always)]
    fn fails(&self, score: Score) -> bool {
        (self.alpha != Score::ALPHA && score <= self.alpha)
            || (self.beta != Score::BETA && score >= self.beta)
    }

    /// Gives up on aspiration for this iteration, re-opening the full window.
    #[inline(always)]
    fn widen_to_full(&mut self) {
        self.alpha = Score::ALPHA;
        self.beta = Score::BETA;
    }
}

/// The result of a search, containing the best move found, score, and total
/// nodes searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    /// Number of nodes searched.
    pub nodes: u64,

    /// Best move found during the search.
    pub bestmove: Option<Move>,

    /// Evaluation of the position after `bestmove` is made.
    pub score: Score,

    /// Deepest fully-completed iteration.
    pub depth: u8,

    /// Deepest ply reached by any line, quiescence included.
    pub seldepth: usize,
}

impl Default for SearchResult {
    /// A default search result should initialize to a *very bad* value,
    /// since there isn't a move to play.
    #[inline(always)]
    fn default() -> Self {
        Self {
            nodes: 0,
            bestmove: None,
            score: Score::ALPHA,
            depth: 0,
            seldepth: 0,
        }
    }
}

/// Configuration variables for executing a [`Search`].
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    /// Maximum depth to execute the search.
    pub max_depth: u8,

    /// Node allowance.
    ///
    /// If the search exceeds this many nodes, it will exit as quickly as possible.
    pub max_nodes: u64,

    /// Start time of the search.
    pub starttime: Instant,

    /// Soft limit on search time.
    ///
    /// Checked between iterative-deepening iterations: once exceeded, no new
    /// iteration is started.
    pub soft_timeout: Duration,

    /// Hard limit on search time.
    ///
    /// Checked periodically inside the tree; once exceeded, the search bails
    /// out of the current iteration and discards it.
    pub hard_timeout: Duration,
}

impl SearchConfig {
    /// Constructs a new [`SearchConfig`] from the provided UCI options.
    ///
    /// The [`Position`] determines whose clock applies. With no explicit
    /// `movetime`, the budget is `own_time / (movestogo + 2) + 2·own_inc / 3`,
    /// clamped between 10 milliseconds and half the remaining time.
    pub fn new(options: UciSearchOptions, position: &Position) -> Self {
        let mut config = Self::default();

        // If supplied, set the max depth / node allowance
        if let Some(depth) = options.depth {
            config.max_depth = depth as u8;
        }

        if let Some(nodes) = options.nodes {
            config.max_nodes = nodes as u64;
        }

        // If `movetime` was supplied, search exactly that long
        if let Some(movetime) = options.movetime {
            config.soft_timeout = movetime;
            config.hard_timeout = movetime;
        } else {
            let (time, inc) = if position.side_to_move().is_white() {
                (options.wtime, options.winc)
            } else {
                (options.btime, options.binc)
            };

            // Only compute a budget when a clock was provided
            if let Some(time) = time {
                let inc = inc.unwrap_or(Duration::ZERO);

                // Budget conservatively even when the time control is nearly over
                let movestogo = options
                    .movestogo
                    .unwrap_or(tune::movestogo_default!())
                    .max(tune::movestogo_default!());

                let floor = Duration::from_millis(tune::min_search_millis!());
                let ceiling = (time / 2).max(floor);
                let budget =
                    (time / (movestogo + 2) + inc * 2 / 3).clamp(floor, ceiling);

                config.soft_timeout = budget;
                config.hard_timeout = budget;
            }
        }

        config
    }
}

impl Default for SearchConfig {
    /// A default [`SearchConfig`] will permit an "infinite" search.
    ///
    /// The word "infinite" is quoted here because the actual defaults are the
    /// `::MAX` values for each field.
    #[inline(always)]
    fn default() -> Self {
        Self {
            max_depth: MAX_PLY as u8 - 1,
            max_nodes: u64::MAX,
            starttime: Instant::now(),
            soft_timeout: Duration::MAX,
            hard_timeout: Duration::MAX,
        }
    }
}

/// Executes a search on a game of chess.
///
/// The search owns a copy of the position and mutates it in place through
/// make/unmake; the transposition and history tables are borrowed from the
/// engine so their contents carry over between searches.
pub struct Search<'a, Log> {
    /// The position being searched, advanced and rewound as the tree is walked.
    position: Position,

    /// Number of nodes searched so far.
    nodes: u64,

    /// Deepest ply reached so far, quiescence included.
    seldepth: usize,

    /// An atomic flag to determine if the search should be cancelled at any time.
    ///
    /// If this is ever `false`, the search must exit as soon as possible.
    is_searching: Arc<AtomicBool>,

    /// Configuration variables for this instance of the search.
    config: SearchConfig,

    /// Set once any cancellation condition fires; checked on the way back up.
    stopped: bool,

    /// Zobrist keys of every ancestor of the current node, for repetition detection.
    repetition: RepetitionHistory,

    /// Quiet cutoff moves per ply.
    killers: Killers,

    /// Storage for quiet moves that caused a beta-cutoff during search.
    history: &'a mut HistoryTable,

    /// Transposition table used to cache information during search.
    ttable: &'a mut TTable,

    /// Marker for the level of logging to print.
    log: PhantomData<Log>,
}

impl<'a, Log: LogLevel> Search<'a, Log> {
    /// Construct a new [`Search`] instance to execute on `position`.
    ///
    /// `game_history` holds the Zobrist keys of the positions played to reach
    /// `position`, so that repetitions spanning the game/search boundary are found.
    pub fn new(
        position: &Position,
        is_searching: Arc<AtomicBool>,
        config: SearchConfig,
        game_history: &[ZobristKey],
        ttable: &'a mut TTable,
        history: &'a mut HistoryTable,
    ) -> Self {
        let mut repetition = RepetitionHistory::new();
        repetition.seed(game_history);

        Self {
            position: *position,
            nodes: 0,
            seldepth: 0,
            is_searching,
            config,
            stopped: false,
            repetition,
            killers: Killers::default(),
            history,
            ttable,
            log: PhantomData,
        }
    }

    /// Start the search, returning a [`SearchResult`].
    ///
    /// This is the entrypoint of the search; it concludes by sending the
    /// `bestmove` message and lowering the searching flag.
    pub fn start(mut self) -> SearchResult {
        if Log::DEBUG {
            self.send_string(format!("Starting search on {:?}", self.position.to_fen()));

            let soft = self.config.soft_timeout.as_millis();
            let hard = self.config.hard_timeout.as_millis();
            if soft < Duration::MAX.as_millis() {
                self.send_string(format!("Soft timeout := {soft}ms"));
            }
            if hard < Duration::MAX.as_millis() {
                self.send_string(format!("Hard timeout := {hard}ms"));
            }
            if self.config.max_nodes < u64::MAX {
                self.send_string(format!("Max nodes := {} nodes", self.config.max_nodes));
            }
            if self.config.max_depth < MAX_PLY as u8 - 1 {
                self.send_string(format!("Max depth := {}", self.config.max_depth));
            }
        }

        let result = self.iterative_deepening();

        // Search has ended; send bestmove
        if Log::INFO {
            self.send_response(UciResponse::BestMove {
                bestmove: result.bestmove.map(|mv| mv.to_string()),
                ponder: None,
            });
        }

        // Search has concluded, alert other thread(s) that we are no longer searching
        self.is_searching.store(false, Ordering::Relaxed);

        result
    }

    /// Performs [iterative deepening](https://www.chessprogramming.org/Iterative_Deepening)
    /// on the search's position.
    ///
    /// Each completed depth reports an `info` line; a cancelled iteration is
    /// discarded and the previous iteration's result stands.
    fn iterative_deepening(&mut self) -> SearchResult {
        // Initialize `bestmove` to the first legal move available, so there is
        // always something to play even if depth 1 never completes
        let mut result = SearchResult {
            bestmove: self.first_legal_move(),
            ..Default::default()
        };

        let mut depth = 1;

        'deepening: while self.config.starttime.elapsed() < self.config.soft_timeout
            && self.is_searching.load(Ordering::Relaxed)
            && depth <= self.config.max_depth
        {
            /****************************************************************************************************
             * Aspiration Windows: https://www.chessprogramming.org/Aspiration_Windows
             ****************************************************************************************************/
            let mut window = AspirationWindow::new(result.score, depth);

            let score = loop {
                let (score, bestmove) = self.root_search(depth, window.alpha, window.beta);

                // A cancelled iteration cannot be trusted; fall back to the
                // previous iteration's result
                if self.stopped {
                    if Log::DEBUG {
                        self.send_string(format!("Search cancelled during depth {depth}"));
                    }
                    break 'deepening;
                }

                if window.fails(score) {
                    window.widen_to_full();
                } else {
                    if let Some(bestmove) = bestmove {
                        result.bestmove = Some(bestmove);
                    }
                    break score;
                }
            };

            result.score = score;
            result.depth = depth;
            result.seldepth = self.seldepth;
            result.nodes = self.nodes;

            // Send search info to the GUI
            if Log::INFO {
                self.send_end_of_search_info(&result);
            }

            // Decay history bonuses so early iterations don't dominate later ones
            self.history.age();

            depth += 1;
        }

        result.nodes = self.nodes;
        result
    }

    /// Searches the root moves of the position with the provided window.
    ///
    /// Returns the best score found and the move that produced it. With no
    /// legal moves at all, returns the mate/stalemate score directly.
    fn root_search(&mut self, depth: u8, mut alpha: Score, beta: Score) -> (Score, Option<Move>) {
        let key = self.position.key();
        let side = self.position.side_to_move();
        let in_check = self.position.is_in_check(side);

        let mut moves = MoveList::new();
        self.position.pseudo_legal_moves(&mut moves);

        let tt_move = self.ttable.bestmove(key);
        let picker = MovePicker::new(moves, &self.position, tt_move, self.killers.at(0), self.history);

        let mut best = Score::ALPHA;
        let mut bestmove = None;
        let mut any_legal = false;

        for (mv, _) in picker {
            self.repetition.push(key);
            let undo = self.position.make_move(mv);

            // Legality filter: the mover may not leave their own king in check
            if self.position.is_in_check(side) {
                self.position.unmake_move(undo);
                self.repetition.pop();
                continue;
            }
            any_legal = true;

            let score = -self.negamax::<PvNode>(depth - 1, 1, -beta, -alpha);

            self.position.unmake_move(undo);
            self.repetition.pop();

            // Discard scores from a cancelled subtree
            if self.stopped {
                break;
            }

            if score > best {
                best = score;
                bestmove = Some(mv);
            }
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }

        if !any_legal && !self.stopped {
            let score = if in_check {
                -Score::CHECKMATE
            } else {
                Score::DRAW
            };
            return (score, None);
        }

        (best, bestmove)
    }

    /// Primary location of search logic.
    ///
    /// Uses the [negamax](https://www.chessprogramming.org/Negamax) algorithm
    /// in a fail-soft framework.
    fn negamax<Node: NodeType>(
        &mut self,
        depth: u8,
        ply: usize,
        mut alpha: Score,
        mut beta: Score,
    ) -> Score {
        /****************************************************************************************************
         * Quiescence Search: https://www.chessprogramming.org/Quiescence_Search
         *
         * In order to avoid the horizon effect, we don't stop at the depth limit. Instead, we keep
         * looking at captures until we reach a "quiet" (quiescent) position.
         ****************************************************************************************************/
        if depth == 0 {
            return self.quiescence(ply, alpha, beta);
        }

        self.nodes += 1;
        self.seldepth = self.seldepth.max(ply);

        let side = self.position.side_to_move();
        let key = self.position.key();

        // Fifty-move rule and threefold repetition
        if self.position.halfmove() >= 100 || self.repetition.is_threefold(key) {
            return Score::DRAW;
        }

        if ply >= MAX_PLY {
            return evaluate(&self.position);
        }

        let static_eval = evaluate(&self.position);

        // Sample the clock once every 1024 nodes; a static evaluation is a
        // safe bail-out value, since cancelled iterations are discarded
        if self.nodes % 1024 == 0 {
            self.check_deadline();
        }
        if self.stopped {
            return static_eval;
        }

        /****************************************************************************************************
         * Mate Distance Pruning: https://www.chessprogramming.org/Mate_Distance_Pruning
         *
         * Even the fastest possible mate from here is bounded by the current ply, so the window can
         * be tightened accordingly.
         ****************************************************************************************************/
        beta = beta.min(Score::CHECKMATE - ply as i32);
        alpha = alpha.max(-Score::CHECKMATE + ply as i32 + 1);
        if alpha >= beta {
            return alpha;
        }

        /****************************************************************************************************
         * TT Cutoffs: https://www.chessprogramming.org/Transposition_Table#Transposition_Table_Cutoffs
         ****************************************************************************************************/
        let tt_entry = self.ttable.probe(key, ply);
        if let Some(entry) = tt_entry {
            // Can only cut off if the existing entry came from an equal or greater depth
            if entry.depth >= depth {
                match entry.bound {
                    Bound::Exact => return entry.score,
                    Bound::Lower => alpha = alpha.max(entry.score),
                    Bound::Upper => beta = beta.min(entry.score),
                }

                if alpha >= beta {
                    return entry.score;
                }
            }
        }
        let tt_move = tt_entry.and_then(|entry| entry.bestmove);

        let in_check = self.position.is_in_check(side);

        /****************************************************************************************************
         * Futility Pruning: https://www.chessprogramming.org/Futility_Pruning
         *
         * At frontier nodes outside the PV (and not in check), quiet moves whose static evaluation
         * cannot reach alpha are skipped without being searched.
         ****************************************************************************************************/
        let futility = depth == 1 && !in_check && !Node::PV;

        let mut moves = MoveList::new();
        self.position.pseudo_legal_moves(&mut moves);
        let picker = MovePicker::new(
            moves,
            &self.position,
            tt_move,
            self.killers.at(ply),
            self.history,
        );

        let alpha_original = alpha;
        let mut best = Score::ALPHA;
        let mut bestmove = None;
        let mut legal: usize = 0;

        /****************************************************************************************************
         * Primary move loop
         ****************************************************************************************************/
        for (mv, bucket) in picker {
            self.repetition.push(key);
            let undo = self.position.make_move(mv);

            if self.position.is_in_check(side) {
                self.position.unmake_move(undo);
                self.repetition.pop();
                continue;
            }
            legal += 1;

            if futility
                && legal > 1
                && matches!(bucket, Bucket::Quiet | Bucket::Killer | Bucket::History)
                && static_eval + tune::futility_margin!() < alpha
            {
                self.position.unmake_move(undo);
                self.repetition.pop();
                continue;
            }

            /****************************************************************************************************
             * Late Move Reductions: https://www.chessprogramming.org/Late_Move_Reductions
             *
             * Ordering should put the best moves first, so late quiet moves are searched shallower
             * with a null window, and re-searched at full depth only if they surprise us.
             ****************************************************************************************************/
            let exempt = matches!(
                bucket,
                Bucket::TtMove | Bucket::GoodCapture | Bucket::Promotion
            ) || in_check
                || legal == 1
                || self.history.is_good(side, mv)
                || depth < 2;

            let score = if exempt {
                -self.negamax::<Node>(depth - 1, ply + 1, -beta, -alpha)
            } else {
                let reduced = depth.saturating_sub(reduction(depth, legal - 1)).max(1);
                let score = -self.negamax::<NonPvNode>(reduced, ply + 1, -(alpha + 1), -alpha);

                // The reduced search beat alpha without failing high: re-search for real
                if score > alpha && score < beta {
                    -self.negamax::<PvNode>(depth - 1, ply + 1, -beta, -alpha)
                } else {
                    score
                }
            };

            if score > best {
                best = score;
                bestmove = Some(mv);
            }
            alpha = alpha.max(score);

            // Deadline hit somewhere below; unwind with a placeholder, the
            // caller discards this iteration anyway
            if self.stopped {
                self.position.unmake_move(undo);
                self.repetition.pop();
                return Score::DRAW;
            }

            if alpha >= beta {
                /****************************************************************************************************
                 * Killer & History Heuristics
                 *
                 * A quiet move that fails high here will probably fail high in sibling nodes too.
                 ****************************************************************************************************/
                if mv.captured().is_none() {
                    self.killers.insert(ply, mv);
                    self.history.update(side, mv, depth);
                }

                self.position.unmake_move(undo);
                self.repetition.pop();
                break;
            }

            self.position.unmake_move(undo);
            self.repetition.pop();
        }

        // With no legal move, the position is either checkmate or stalemate
        if legal == 0 {
            return if in_check {
                -(Score::CHECKMATE - ply as i32)
            } else {
                Score::DRAW
            };
        }

        self.ttable.store(
            TTableEntry::new(key, best, depth, alpha_original, beta, bestmove),
            ply,
        );

        best
    }

    /// Quiescence Search (QSearch): resolves capture chains so the static
    /// evaluation is only ever trusted on quiet positions.
    ///
    /// When in check, every evasion is searched instead of captures only.
    fn quiescence(&mut self, ply: usize, mut alpha: Score, beta: Score) -> Score {
        self.nodes += 1;
        self.seldepth = self.seldepth.max(ply);

        let side = self.position.side_to_move();
        let alpha_original = alpha;

        // Stand pat: the side to move is never forced to capture
        let mut best = evaluate(&self.position);
        if best >= beta {
            return best;
        }
        alpha = alpha.max(best);

        if ply >= MAX_PLY {
            return best;
        }

        if self.nodes % 1024 == 0 {
            self.check_deadline();
        }
        if self.stopped {
            return best;
        }

        let in_check = self.position.is_in_check(side);

        let mut moves = MoveList::new();
        if in_check {
            self.position.pseudo_legal_moves(&mut moves);
        } else {
            self.position.pseudo_legal_captures(&mut moves);
        }

        let key = self.position.key();
        let tt_move = self.ttable.bestmove(key);
        let picker = MovePicker::new(
            moves,
            &self.position,
            tt_move,
            self.killers.at(ply),
            self.history,
        );

        for (mv, bucket) in picker {
            // Outside of check, only exchanges that don't lose material are examined
            if !in_check && !matches!(bucket, Bucket::TtMove | Bucket::GoodCapture) {
                continue;
            }

            self.repetition.push(key);
            let undo = self.position.make_move(mv);

            if self.position.is_in_check(side) {
                self.position.unmake_move(undo);
                self.repetition.pop();
                continue;
            }

            let score = -self.quiescence(ply + 1, -beta, -alpha);

            self.position.unmake_move(undo);
            self.repetition.pop();

            if score >= beta {
                self.ttable.store(
                    TTableEntry::new(key, score, 0, alpha_original, beta, Some(mv)),
                    ply,
                );
                return score;
            }

            best = best.max(score);
            alpha = alpha.max(score);

            if self.stopped {
                return best;
            }
        }

        self.ttable.store(
            TTableEntry::new(key, best, 0, alpha_original, beta, None),
            ply,
        );

        best
    }

    /// Raises the stop flag once any cancellation condition fires: hard
    /// deadline, external `stop`, or the node allowance running out.
    #[inline(always)]
    fn check_deadline(&mut self) {
        if self.config.starttime.elapsed() >= self.config.hard_timeout
            || !self.is_searching.load(Ordering::Relaxed)
            || self.nodes >= self.config.max_nodes
        {
            self.stopped = true;
        }
    }

    /// Finds the first legal move of the position, in generation order.
    fn first_legal_move(&mut self) -> Option<Move> {
        let side = self.position.side_to_move();
        let mut moves = MoveList::new();
        self.position.pseudo_legal_moves(&mut moves);

        moves.into_iter().find(|&mv| {
            let undo = self.position.make_move(mv);
            let legal = !self.position.is_in_check(side);
            self.position.unmake_move(undo);
            legal
        })
    }

    /// Sends a [`UciResponse`] to `stdout`.
    #[inline(always)]
    fn send_response<T: fmt::Display>(&self, response: UciResponse<T>) {
        println!("{response}");
    }

    /// Sends a [`UciInfo`] to `stdout`.
    #[inline(always)]
    fn send_info(&self, info: UciInfo) {
        self.send_response(UciResponse::<String>::Info(Box::new(info)));
    }

    /// Helper to send a [`UciInfo`] containing only a `string` message to `stdout`.
    #[inline(always)]
    fn send_string<T: fmt::Display>(&self, string: T) {
        self.send_info(UciInfo::new().string(string));
    }

    /// Sends UCI info about the conclusion of one search iteration.
    #[inline(always)]
    fn send_end_of_search_info(&self, result: &SearchResult) {
        let elapsed = self.config.starttime.elapsed();

        self.send_info(
            UciInfo::new()
                .depth(result.depth)
                .seldepth(result.seldepth)
                .score(result.score.into_uci())
                .nodes(self.nodes)
                .nps((self.nodes as f32 / elapsed.as_secs_f32()).trunc())
                .hashfull(self.ttable.hashfull())
                .time(elapsed.as_millis())
                .pv(result.bestmove.map(|mv| mv.to_string())),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_search(fen: &str, config: SearchConfig) -> SearchResult {
        let position: Position = fen.parse().unwrap();
        let is_searching = Arc::new(AtomicBool::new(true));

        let mut ttable = TTable::from_capacity(1 << 16);
        let mut history = HistoryTable::default();

        Search::<crate::LogNone>::new(
            &position,
            is_searching,
            config,
            &[],
            &mut ttable,
            &mut history,
        )
        .start()
    }

    fn depth_config(max_depth: u8) -> SearchConfig {
        SearchConfig {
            max_depth,
            ..Default::default()
        }
    }

    #[test]
    fn test_white_mate_in_1() {
        let res = run_search("k7/8/KQ6/8/8/8/8/8 w - - 0 1", depth_config(2));

        assert_eq!(res.score, Score::CHECKMATE - 1);
        let mating = res.bestmove.unwrap().to_string();
        assert!(
            mating == "b6b7" || mating == "b6a7",
            "{mating} does not deliver mate"
        );
    }

    #[test]
    fn test_black_mated_in_1() {
        let res = run_search("1k6/8/KQ6/2Q5/8/8/8/8 b - - 0 1", depth_config(3));

        // Black moves (1 ply), then White mates (ply 2)
        assert_eq!(res.score, -(Score::CHECKMATE - 2));
    }

    #[test]
    fn test_fools_mate_is_lost() {
        // White has already been checkmated by Qh4
        let res = run_search(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 2",
            depth_config(2),
        );

        assert!(res.score <= -(Score::CHECKMATE - 2));
        assert!(res.bestmove.is_none());
    }

    #[test]
    fn test_stalemate() {
        let res = run_search("k7/8/KQ6/8/8/8/8/8 b - - 0 1", depth_config(4));

        assert!(res.bestmove.is_none());
        assert_eq!(res.score, Score::DRAW);
    }

    #[test]
    fn test_obvious_capture_promote() {
        // Pawn should take the queen and promote to a queen doing it
        let res = run_search("3q1n2/4P3/8/8/8/8/k7/7K w - - 0 1", depth_config(1));
        assert_eq!(res.bestmove.unwrap().to_string(), "e7d8q");
    }

    #[test]
    fn test_quick_search_finds_move() {
        // If *any* legal move is available it must be returned, regardless of
        // how little time was given
        let config = SearchConfig {
            soft_timeout: Duration::ZERO,
            hard_timeout: Duration::ZERO,
            ..Default::default()
        };

        let res = run_search(crate::FEN_STARTPOS, config);
        assert!(res.bestmove.is_some());
    }

    #[test]
    fn test_fifty_move_rule_draw() {
        // Bare kings shuffling with the clock at 99: every reply is a draw
        let res = run_search("k7/8/8/8/8/8/8/K7 w - - 99 1", depth_config(3));
        assert_eq!(res.score, Score::DRAW);
    }

    #[test]
    fn test_mirrored_mates_score_equally() {
        // The same mate-in-1 from either color's perspective must score the same
        let white = run_search("k7/8/KQ6/8/8/8/8/8 w - - 0 1", depth_config(2));
        let black = run_search("K7/8/kq6/8/8/8/8/8 b - - 0 1", depth_config(2));

        assert_eq!(white.score, black.score);
    }

    #[test]
    fn test_bestmove_is_always_legal() {
        for fen in [
            crate::FEN_STARTPOS,
            crate::FEN_KIWIPETE,
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        ] {
            let res = run_search(fen, depth_config(4));
            let mv = res.bestmove.expect("every test position has a legal move");

            let mut position: Position = fen.parse().unwrap();
            let side = position.side_to_move();
            position.make_move(mv);
            assert!(
                !position.is_in_check(side),
                "search on {fen:?} returned {mv}, which leaves the king in check"
            );
        }
    }

    #[test]
    fn test_threefold_detection() {
        let mut ring = RepetitionHistory::new();
        let mut key = ZobristKey::default();
        key.hash(0xDEAD_BEEF);

        ring.push(key);
        assert!(!ring.is_threefold(key));

        ring.push(key);
        assert!(ring.is_threefold(key));

        ring.pop();
        assert!(!ring.is_threefold(key));
    }

    #[test]
    fn test_reduction_table_shape() {
        // No reduction below one ply, and reductions grow with depth and lateness
        assert_eq!(reduction(2, 0), 1);
        assert!(reduction(12, 100) >= reduction(2, 4));
        assert!(reduction(63, 218) <= tune::max_lmr_reduction!());
    }
}
