#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The `formula` verb: evaluate the closed-form 2-SAT count.

use clap::Parser;
use min_unsat::command_line::cli::{run_formula, FormulaCli};

fn main() {
    min_unsat::command_line::init_logging();
    let cli = FormulaCli::parse();
    if let Err(message) = run_formula(&cli) {
        eprintln!("error: {message}");
        std::process::exit(1);
    }
}
