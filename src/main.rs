/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::process::ExitCode;

use clap::Parser;
use newt::{Engine, EngineCommand};

fn main() -> ExitCode {
    let mut engine = Engine::new();
    println!("{} by {}", engine.name(), engine.authors());

    // Arguments turn the engine into a one-shot: the command they form is
    // queued ahead of an exit, so the event loop below runs it to completion
    // (waiting on any search it spawns) and then shuts down. Without
    // arguments, the loop keeps serving stdin until told to quit.
    let args: Vec<_> = std::env::args_os().skip(1).collect();
    if !args.is_empty() {
        match EngineCommand::try_parse_from(args) {
            Ok(cmd) => {
                engine.send_command(cmd);
                engine.send_command(EngineCommand::Exit { cleanup: true });
            }
            // Misspelled one-shots (and `help`/`version`) are clap's to report
            Err(err) => err.exit(),
        }
    }

    if let Err(e) = engine.run() {
        eprintln!("fatal: {e:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
