#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The `minunsat` verb: count minimally unsatisfiable formulas.

use clap::Parser;
use min_unsat::command_line::cli::{run_minunsat, MinUnsatCli};

fn main() {
    min_unsat::command_line::init_logging();
    let cli = MinUnsatCli::parse();
    if let Err(message) = run_minunsat(&cli) {
        eprintln!("error: {message}");
        std::process::exit(1);
    }
}
