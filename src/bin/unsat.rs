#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The `unsat` verb: count all unsatisfiable clause sets.

use clap::Parser;
use min_unsat::command_line::cli::{run_unsat, UnsatCli};

fn main() {
    min_unsat::command_line::init_logging();
    let cli = UnsatCli::parse();
    if let Err(message) = run_unsat(&cli) {
        eprintln!("error: {message}");
        std::process::exit(1);
    }
}
