/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    io::{self, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{channel, Receiver, Sender},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
};

use anyhow::{bail, Context, Result};
use uci_parser::{UciCommand, UciInfo, UciParseError, UciResponse};

use crate::{
    evaluate, perft, splitperft, EngineCommand, HistoryTable, LogDebug, LogInfo, LogLevel, LogNone,
    Move, MoveList, Position, Search, SearchConfig, SearchResult, Square, TTable, ZobristKey,
    BENCHMARK_FENS,
};

/// Default depth at which to run the benchmark searches.
const BENCH_DEPTH: u8 = 7;

/// The engine: owns the game state and the hash tables, and executes commands
/// received over its channel.
///
/// Input is read on a dedicated thread and searches run on their own thread,
/// so a `stop` command can reach a running search; the only state they share
/// is the atomic searching flag.
#[derive(Debug)]
pub struct Engine {
    /// The position being played.
    position: Position,

    /// Zobrist keys of every position reached earlier in the game, for
    /// repetition detection across the game/search boundary.
    game_history: Vec<ZobristKey>,

    /// One half of a channel, responsible for sending commands to the engine to execute.
    sender: Sender<EngineCommand>,

    /// One half of a channel, responsible for receiving commands for the engine to execute.
    receiver: Receiver<EngineCommand>,

    /// Atomic flag to determine whether a search is currently running.
    is_searching: Arc<AtomicBool>,

    /// Handle to the currently-running search thread, if one exists.
    search_thread: Option<JoinHandle<SearchResult>>,

    /// Transposition table used to cache information found during search.
    ttable: Arc<Mutex<TTable>>,

    /// History table for keeping track of good/bad quiet moves during search.
    history: Arc<Mutex<HistoryTable>>,

    /// Whether to display extra information during execution.
    debug: bool,
}

impl Engine {
    /// Constructs a new [`Engine`] instance to be executed with [`Engine::run`].
    pub fn new() -> Self {
        let (sender, receiver) = channel();

        Self {
            position: Position::default(),
            game_history: Vec::with_capacity(512),
            sender,
            receiver,
            is_searching: Arc::default(),
            search_thread: None,
            ttable: Arc::default(),
            history: Arc::default(),
            debug: false,
        }
    }

    /// Returns a string of the engine's name and current version.
    #[inline(always)]
    pub fn name(&self) -> String {
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    /// Returns a string of all authors of this engine.
    #[inline(always)]
    pub fn authors(&self) -> String {
        // Split multiple authors by comma-space
        env!("CARGO_PKG_AUTHORS").replace(':', ", ")
    }

    /// Sends an [`EngineCommand`] to the engine to be executed.
    #[inline(always)]
    pub fn send_command(&self, command: EngineCommand) {
        // Safe unwrap: `send` can only fail if the receiver no longer exists,
        // and the receiver lives exactly as long as the engine itself.
        self.sender
            .send(command)
            .expect("Failed to send a command to the engine via channels.");
    }

    /// Entrypoint of the engine.
    ///
    /// Spawns a thread to read `stdin`, then executes commands in the order
    /// they are received until told to exit.
    pub fn run(&mut self) -> Result<()> {
        // Spawn a separate thread for handling user input
        let sender = self.sender.clone();
        thread::spawn(|| {
            if let Err(err) = input_handler(sender) {
                eprintln!("Input handler thread stopping after fatal error: {err:#}");
            }
        });

        while let Ok(cmd) = self.receiver.recv() {
            match cmd {
                EngineCommand::Bench { depth } => self.bench(depth)?,

                EngineCommand::Display => println!("{}", self.position),

                EngineCommand::Eval => println!("{}", evaluate(&self.position)),

                EngineCommand::Exit { cleanup } => {
                    // If requested, await the completion of any ongoing search
                    if cleanup {
                        self.stop_search();
                    } else {
                        self.set_is_searching(false);
                    }
                    break;
                }

                EngineCommand::Fen => println!("{}", self.position.to_fen()),

                EngineCommand::HashInfo => self.hash_info(),

                EngineCommand::MakeMove { mv_string } => {
                    if let Err(e) = self.apply_move(&mv_string) {
                        Self::send_string(format!("{e:#}"));
                    }
                }

                EngineCommand::Moves { square } => self.moves(square),

                EngineCommand::Perft { depth } => {
                    let mut position = self.position;
                    println!("{}", perft(&mut position, depth));
                }

                EngineCommand::Splitperft { depth } => {
                    let mut position = self.position;
                    println!("{}", splitperft(&mut position, depth));
                }

                EngineCommand::Uci { cmd } => {
                    // The UCI spec states to continue execution if an error occurs
                    if let Err(e) = self.handle_uci_command(cmd) {
                        Self::send_string(format!("{e:#}"));
                    }
                }
            }
        }

        Ok(())
    }

    /// Handle the execution of a single [`UciCommand`].
    fn handle_uci_command(&mut self, uci: UciCommand) -> Result<()> {
        use UciCommand::*;
        match uci {
            Uci => {
                println!("id name {}\nid author {}", self.name(), self.authors());
                println!("{}", UciResponse::<&str>::UciOk);
            }

            Debug(status) => self.debug = status,

            IsReady => println!("{}", UciResponse::<&str>::ReadyOk),

            UciNewGame => self.new_game(),

            Position { fen, moves } => self.set_position(fen, moves)?,

            Go(options) => {
                if let Some(depth) = options.perft {
                    let mut position = self.position;
                    println!("\n{}", splitperft(&mut position, depth as usize));
                    return Ok(());
                }

                let config = SearchConfig::new(options, &self.position);
                self.search_thread = if self.debug {
                    self.start_search::<LogDebug>(config)
                } else {
                    self.start_search::<LogInfo>(config)
                };
            }

            Stop => self.set_is_searching(false),

            Quit => self.send_command(EngineCommand::Exit { cleanup: false }),

            _ => bail!("{} does not support UCI command {uci:?}", self.name()),
        }

        Ok(())
    }

    /// Resets the engine's internal game state.
    ///
    /// This clears all hash tables and the game history, and cancels any
    /// ongoing search, ignoring its result.
    fn new_game(&mut self) {
        self.set_is_searching(false);
        self.position = Position::default();
        self.game_history.clear();
        self.ttable().clear();
        self.history().clear();
    }

    /// Set the position to the supplied FEN (defaulting to the standard start
    /// position), then apply `moves` one-by-one.
    ///
    /// A move that fails to parse or is illegal is rejected with a diagnostic,
    /// and none of the moves after it are applied.
    fn set_position(&mut self, fen: Option<String>, moves: Vec<String>) -> Result<()> {
        // Parse the FEN first so a malformed one leaves the board unchanged
        let mut position = match fen {
            Some(fen) => fen
                .parse()
                .with_context(|| format!("invalid FEN {fen:?}"))?,
            None => Position::default(),
        };
        let mut history = Vec::with_capacity(moves.len());

        for mv_string in &moves {
            if let Err(e) = Self::checked_move(&mut position, &mut history, mv_string) {
                Self::send_string(format!(
                    "ignoring {mv_string:?} and everything after it: {e:#}"
                ));
                break;
            }
        }

        self.position = position;
        self.game_history = history;
        Ok(())
    }

    /// Applies a single UCI move to the current position, as played over the board.
    fn apply_move(&mut self, mv_string: &str) -> Result<()> {
        let mut position = self.position;
        Self::checked_move(&mut position, &mut self.game_history, mv_string)?;
        self.position = position;
        Ok(())
    }

    /// Parses `mv_string` against `position` and makes it, recording the
    /// pre-move key in `history`.
    ///
    /// Fails without touching `position` if the move is unparseable, not
    /// producible by the generator, or leaves the mover's king in check.
    fn checked_move(
        position: &mut Position,
        history: &mut Vec<ZobristKey>,
        mv_string: &str,
    ) -> Result<()> {
        let mv = Move::from_uci(position, mv_string)?;

        let mut moves = MoveList::new();
        position.pseudo_legal_moves(&mut moves);
        if !moves.contains(&mv) {
            bail!("{mv} cannot be played in this position");
        }

        let side = position.side_to_move();
        let key = position.key();

        let undo = position.make_move(mv);
        if position.is_in_check(side) {
            position.unmake_move(undo);
            bail!("{mv} leaves the {} king in check", side.name());
        }

        history.push(key);
        Ok(())
    }

    /// Executes the `bench` command: a fixed-depth search on a series of
    /// positions, printing node counts and the overall speed.
    fn bench(&mut self, depth: Option<u8>) -> Result<()> {
        let config = SearchConfig {
            max_depth: depth.unwrap_or(BENCH_DEPTH),
            ..Default::default()
        };

        let mut nodes = 0;

        println!(
            "Running fixed-depth search (d={}) on {} positions",
            config.max_depth,
            BENCHMARK_FENS.len()
        );

        for (i, fen) in BENCHMARK_FENS.iter().enumerate() {
            print!("{:>2}/{:>2}: {fen} := ", i + 1, BENCHMARK_FENS.len());
            // Flush so the node count appears on the same line after the search
            io::stdout().flush()?;

            self.set_position(Some(fen.to_string()), Vec::new())?;
            self.search_thread = self.start_search::<LogNone>(config);

            let res = self
                .stop_search()
                .with_context(|| format!("benchmark search on {fen:?} did not finish"))?;
            nodes += res.nodes;
            println!("{}", res.nodes);

            // Each bench position is a fresh game
            self.new_game();
        }

        let elapsed = config.starttime.elapsed();
        let nps = (nodes as f32 / elapsed.as_secs_f32()) as u64;
        println!("{nodes} nodes / {elapsed:?} := {nps} nps");

        self.new_game();
        Ok(())
    }

    /// Display info about the internal hash table(s).
    fn hash_info(&self) {
        let ttable = self.ttable();

        let capacity = ttable.capacity();
        let mb = capacity * size_of::<crate::TTableEntry>() / (1024 * 1024);
        let permille = ttable.hashfull();
        println!("TT info: {mb}mb @ {capacity} slots, {permille} permille full");
    }

    /// Executes the `moves` command: prints all legal moves, or all legal
    /// moves from `square` if one was given.
    fn moves(&self, square: Option<Square>) {
        let mut position = self.position;
        let side = position.side_to_move();

        let mut moves = MoveList::new();
        position.pseudo_legal_moves(&mut moves);

        let mut legal: Vec<String> = moves
            .into_iter()
            .filter(|mv| square.map_or(true, |sq| mv.from() == sq))
            .filter(|&mv| {
                let undo = position.make_move(mv);
                let ok = !position.is_in_check(side);
                position.unmake_move(undo);
                ok
            })
            .map(|mv| mv.to_string())
            .collect();

        if legal.is_empty() {
            println!("(none)");
        } else {
            legal.sort();
            println!("{}", legal.join(", "));
        }
    }

    /// Sets the search flag to signal that the engine is starting/stopping a search.
    #[inline(always)]
    fn set_is_searching(&mut self, status: bool) {
        self.is_searching.store(status, Ordering::Relaxed);
    }

    /// Returns `true` if the engine is currently executing a search.
    #[inline(always)]
    fn is_searching(&self) -> bool {
        self.is_searching.load(Ordering::Relaxed)
    }

    /// Starts a search on the current position, given the parameters in `config`.
    fn start_search<Log: LogLevel + Send + 'static>(
        &mut self,
        config: SearchConfig,
    ) -> Option<JoinHandle<SearchResult>> {
        // Cannot start a search if one is already running
        if self.is_searching() {
            Self::send_string("A search is already running");
            return None;
        }
        self.set_is_searching(true);

        // Clone the parameters that will be sent into the thread
        let is_searching = Arc::clone(&self.is_searching);
        let position = self.position;
        let game_history = self.game_history.clone();
        let ttable = Arc::clone(&self.ttable);
        let history = Arc::clone(&self.history);

        // Spawn a thread to conduct the search
        let handle = thread::spawn(move || {
            // Lock the hash tables for the duration of the search so that only
            // the search thread may modify them
            let mut ttable = ttable
                .lock()
                .expect("Failed to acquire Transposition Table at the start of search.");
            let mut history = history
                .lock()
                .expect("Failed to acquire History Table at the start of search.");

            Search::<Log>::new(
                &position,
                is_searching,
                config,
                &game_history,
                &mut ttable,
                &mut history,
            )
            .start()
        });

        Some(handle)
    }

    /// Awaits the current search thread, blocking until it finishes and
    /// returning its result.
    fn stop_search(&mut self) -> Option<SearchResult> {
        // Can't stop a search if there aren't any threads searching!
        let handle = self.search_thread.take()?;

        // Attempt to join the thread handle to retrieve the result
        let id = handle.thread().id();
        let Ok(res) = handle.join() else {
            Self::send_string(format!("Failed to join on thread {id:?}"));
            return None;
        };

        // Flip the search flag so that any active threads will begin to clean themselves up
        self.set_is_searching(false);

        Some(res)
    }

    /// Helper to send a [`UciInfo`] containing only a `string` message to `stdout`.
    #[inline(always)]
    fn send_string<T: fmt::Display>(info: T) {
        let resp = UciResponse::<String>::Info(Box::new(UciInfo::new().string(info)));
        println!("{resp}");
    }

    /// Helper function to fetch the TTable, panicking if impossible.
    #[inline(always)]
    fn ttable(&self) -> std::sync::MutexGuard<'_, TTable> {
        self.ttable
            .lock()
            .expect("A thread holding the TTable panicked")
    }

    /// Helper function to fetch the History table, panicking if impossible.
    #[inline(always)]
    fn history(&self) -> std::sync::MutexGuard<'_, HistoryTable> {
        self.history
            .lock()
            .expect("A thread holding the History table panicked")
    }
}

impl Default for Engine {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

/// Loops endlessly to await input via `stdin`, sending all successfully-parsed
/// commands through the supplied `sender`.
fn input_handler(sender: Sender<EngineCommand>) -> Result<()> {
    let mut buffer = String::with_capacity(2048);

    loop {
        // Clear the buffer, read input, and trim the trailing newline
        buffer.clear();
        let bytes = io::stdin()
            .read_line(&mut buffer)
            .context("Failed to read line when parsing UCI commands")?;

        // For ctrl + d
        if 0 == bytes {
            // Send the Quit command and exit this function
            sender
                .send(EngineCommand::Exit { cleanup: false })
                .context("Failed to send 'quit' command after receiving empty input")?;

            bail!("Engine received input of 0 bytes and is quitting");
        }

        let buf = buffer.trim();

        // Ignore empty lines
        if buf.is_empty() {
            continue;
        }

        // Attempt to parse the input as a UCI command first, since that's the
        // primary use case of the engine
        match UciCommand::new(buf) {
            Ok(cmd) => sender
                .send(EngineCommand::Uci { cmd })
                .context("Failed to send UCI command to engine")?,

            // If it's not a UCI command, check if it's an engine-specific command
            Err(UciParseError::UnrecognizedCommand { cmd: _ }) => match buf.parse() {
                Ok(cmd) => sender
                    .send(cmd)
                    .context("Failed to send command to engine")?,

                // If it wasn't a custom command either, print an error
                Err(err) => err.print()?,
            },

            // If it was a malformed UCI command, print a diagnostic and carry on
            Err(uci_err) => Engine::send_string(format!("{uci_err:#}")),
        }
    }
}
