/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// How chatty a [`Search`](crate::Search) should be on stdout.
///
/// Encoded as a marker type parameter so the logging checks compile away
/// entirely for silent searches (benchmarks, tests).
pub trait LogLevel {
    /// Print `info` lines and the final `bestmove`.
    const INFO: bool;

    /// Additionally print diagnostic `info string` lines.
    const DEBUG: bool;
}

/// Print nothing at all.
pub struct LogNone;
impl LogLevel for LogNone {
    const INFO: bool = false;
    const DEBUG: bool = false;
}

/// Print the standard UCI search output.
pub struct LogInfo;
impl LogLevel for LogInfo {
    const INFO: bool = true;
    const DEBUG: bool = false;
}

/// Print the standard UCI search output plus diagnostics.
pub struct LogDebug;
impl LogLevel for LogDebug {
    const INFO: bool = true;
    const DEBUG: bool = true;
}

/// Positions searched by the `bench` command: a mix of openings,
/// middlegames, endgames, and tactical spots.
pub const BENCHMARK_FENS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1",
    "6k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1",
];
