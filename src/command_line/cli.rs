#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Argument parsing and runners for the three verbs.
//!
//! Uses `clap` derive for parsing. Each verb is its own binary with its own
//! `Parser` struct; the runners return `Result<(), String>` and the thin
//! `main`s map an `Err` to a nonzero exit code. A cancelled run is a
//! success: it prints the partial answer and exits zero.

use crate::counting::counter::{
    select_counter, CountOutcome, Counter, Params, Progress, RunOptions,
};
use crate::counting::evaluator::CountMode;
use crate::counting::reference::count_reference;
use crate::formula::closed_form::{diagonal_breakdown, mu_two_sat, verify_table};
use clap::{Args, Parser};
use std::fmt::Display;
use std::path::PathBuf;

/// Shared `-v / -l / -c` parameter arguments.
#[derive(Args, Debug, Clone, Copy)]
pub struct ParamArgs {
    /// Number of Boolean variables (up to 10).
    #[arg(short = 'v', long = "vars")]
    pub vars: u32,

    /// Literals per clause: 2 or 3.
    #[arg(short = 'l', long = "literals", default_value_t = 2)]
    pub literals: u32,

    /// Number of distinct clauses (up to 20).
    #[arg(short = 'c', long = "clauses")]
    pub clauses: u32,
}

/// `minunsat`: count minimally unsatisfiable formulas by enumeration.
#[derive(Parser, Debug)]
#[command(
    name = "minunsat",
    version,
    about = "Counts minimally unsatisfiable k-CNF formulas by exhaustive enumeration"
)]
pub struct MinUnsatCli {
    /// Parameter triple.
    #[command(flatten)]
    pub params: ParamArgs,

    /// Force the single-thread CPU engine (many-vars variant for v > 6).
    #[arg(long)]
    pub cpu: bool,

    /// Persist resumable checkpoints while running.
    #[arg(long)]
    pub checkpoint: bool,

    /// Print throughput and pruning statistics after the run.
    #[arg(long)]
    pub benchmark: bool,

    /// Force the hybrid prefix depth (2 or 3) instead of the default.
    #[arg(short = 'p', long = "prefix")]
    pub prefix: Option<u32>,
}

/// `formula`: evaluate the closed-form 2-SAT count.
#[derive(Parser, Debug)]
#[command(
    name = "formula",
    version,
    about = "Evaluates the closed-form count of minimally unsatisfiable 2-CNF formulas"
)]
pub struct FormulaCli {
    /// Number of Boolean variables (up to 10).
    #[arg(short = 'v', long = "vars")]
    pub vars: u32,

    /// Number of distinct clauses (up to 20).
    #[arg(short = 'c', long = "clauses")]
    pub clauses: u32,

    /// Also print the per-stratum decomposition of the diagonal.
    #[arg(short = 'd', long = "diagonal")]
    pub diagonal: bool,

    /// Check the closed form against the built-in verification table.
    #[arg(long)]
    pub verify: bool,
}

/// `unsat`: count all unsatisfiable formulas (no minimality, no
/// all-variables constraint).
#[derive(Parser, Debug)]
#[command(
    name = "unsat",
    version,
    about = "Counts unsatisfiable k-CNF clause sets by exhaustive enumeration"
)]
pub struct UnsatCli {
    /// Parameter triple.
    #[command(flatten)]
    pub params: ParamArgs,

    /// Force the single-thread CPU engine.
    #[arg(long)]
    pub cpu: bool,

    /// Append the result as a CSV row to this file.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Cross-check the result against the brute-force reference (small
    /// parameters only).
    #[arg(long)]
    pub verify: bool,
}

/// Runs the `minunsat` verb.
///
/// # Errors
///
/// A human-readable message for configuration or I/O failures.
pub fn run_minunsat(cli: &MinUnsatCli) -> Result<(), String> {
    let params = parse_params(&cli.params)?;
    let options = RunOptions {
        force_cpu: cli.cpu,
        checkpoints: cli.checkpoint,
        prefix_len: cli.prefix,
        progress: Some(Box::new(print_progress)),
        ..RunOptions::default()
    };

    let mut counter =
        select_counter(params, options, CountMode::MinUnsat).map_err(|e| e.to_string())?;
    let outcome = counter.count().map_err(|e| e.to_string())?;

    if outcome.cancelled {
        println!(
            "[Cancelled] Processed: {} / {}",
            thousands(outcome.processed_units),
            thousands(outcome.total_units)
        );
        println!(
            "[Partial] MIN-UNSAT count so far: {}",
            thousands(outcome.count)
        );
    } else {
        println!(
            "RESULT: f_all(v={}, l={}, c={}) = {}",
            params.vars,
            params.literals,
            params.clauses,
            thousands(outcome.count)
        );
    }

    if cli.benchmark {
        print_benchmark(&outcome);
    }
    Ok(())
}

/// Runs the `formula` verb.
///
/// # Errors
///
/// A human-readable message for configuration failures or a failed table
/// verification.
pub fn run_formula(cli: &FormulaCli) -> Result<(), String> {
    if cli.verify {
        let failures = verify_table();
        if failures.is_empty() {
            println!("Verification: all 18 known values match");
        } else {
            for (v, c, expected, got) in &failures {
                eprintln!("MISMATCH: f_all(v={v}, l=2, c={c}) = {got}, expected {expected}");
            }
            return Err(format!("{} verification value(s) diverged", failures.len()));
        }
    }

    let value = mu_two_sat(cli.vars, cli.clauses).map_err(|e| e.to_string())?;
    println!(
        "RESULT: f_all(v={}, l=2, c={}) = {}",
        cli.vars,
        cli.clauses,
        thousands(value)
    );

    if cli.diagonal {
        let d = cli.clauses.saturating_sub(cli.vars);
        println!("Diagonal d = {d}, strata by doubled-variable count:");
        for (t, count) in diagonal_breakdown(cli.vars, cli.clauses).map_err(|e| e.to_string())? {
            println!("  t={t:>2}: {}", thousands(count));
        }
    }
    Ok(())
}

/// Runs the `unsat` verb.
///
/// # Errors
///
/// A human-readable message for configuration or I/O failures, or a failed
/// reference cross-check.
pub fn run_unsat(cli: &UnsatCli) -> Result<(), String> {
    let params = parse_params(&cli.params)?;
    let options = RunOptions {
        force_cpu: cli.cpu,
        progress: Some(Box::new(print_progress)),
        ..RunOptions::default()
    };

    let mut counter =
        select_counter(params, options, CountMode::Unsat).map_err(|e| e.to_string())?;
    let outcome = counter.count().map_err(|e| e.to_string())?;

    if outcome.cancelled {
        println!(
            "[Cancelled] Processed: {} / {}",
            thousands(outcome.processed_units),
            thousands(outcome.total_units)
        );
        println!("[Partial] UNSAT count so far: {}", thousands(outcome.count));
        return Ok(());
    }

    println!(
        "RESULT: unsat(v={}, l={}, c={}) = {}",
        params.vars,
        params.literals,
        params.clauses,
        thousands(outcome.count)
    );

    if cli.verify {
        let reference =
            count_reference(params.vars, params.literals, params.clauses, CountMode::Unsat)
                .map_err(|e| e.to_string())?;
        if reference == outcome.count {
            println!(
                "Verified against brute-force reference: {}",
                thousands(reference)
            );
        } else {
            return Err(format!(
                "engine disagrees with the brute-force reference: {} vs {reference}",
                outcome.count
            ));
        }
    }

    if let Some(path) = &cli.output {
        let record = super::csv_report::UnsatRecord {
            vars: params.vars,
            literals: params.literals,
            clauses: params.clauses,
            unsat: outcome.count,
            combinations: outcome.total_units,
            time_ms: outcome.elapsed.as_millis() as u64,
            mode: outcome.engine.to_string(),
        };
        super::csv_report::append_unsat_record(path, &record)
            .map_err(|e| format!("unable to append to {}: {e}", path.display()))?;
    }
    Ok(())
}

fn parse_params(args: &ParamArgs) -> Result<Params, String> {
    Params::new(args.vars, args.literals, args.clauses).map_err(|e| e.to_string())
}

fn print_progress(progress: &Progress) {
    let percent = if progress.total_units == 0 {
        100.0
    } else {
        progress.processed_units as f64 / progress.total_units as f64 * 100.0
    };
    println!(
        "Progress: {} / {} ({percent:.1}%), partial count {}",
        thousands(progress.processed_units),
        thousands(progress.total_units),
        thousands(progress.partial_count)
    );
}

fn print_benchmark(outcome: &CountOutcome) {
    let secs = outcome.elapsed.as_secs_f64();
    println!("\n====================[ Run Statistics ]====================");
    stat_line("Engine", outcome.engine);
    stat_line("Candidates", thousands(outcome.stats.tested));
    stat_line_with_rate("Throughput", outcome.stats.tested, secs);
    stat_line("Batches", outcome.stats.batches);
    if outcome.stats.tested > 0 {
        let skip = outcome.stats.group_skipped as f64 / outcome.stats.tested as f64 * 100.0;
        stat_line("Group-filter skips", thousands(outcome.stats.group_skipped));
        stat_line("Group skip rate", format!("{skip:.1}%"));
    }
    if outcome.stats.survivors > 0 || outcome.stats.prefixes_pruned > 0 {
        stat_line("Prefixes kept", thousands(outcome.stats.survivors));
        stat_line("Prefixes pruned", thousands(outcome.stats.prefixes_pruned));
    }
    if let Some(from) = outcome.stats.resumed_from {
        stat_line("Resumed from chunk", thousands(from));
    }
    stat_line("Wall time (s)", format!("{secs:.3}"));
    println!("==========================================================");
}

fn stat_line(label: &str, value: impl Display) {
    println!("|  {label:<24} {value:>28}  |");
}

fn stat_line_with_rate(label: &str, value: u64, secs: f64) {
    let rate = if secs > 0.0 { value as f64 / secs } else { 0.0 };
    stat_line(label, format!("{rate:.0}/sec"));
}

/// Formats an integer with `,` thousands separators.
#[must_use]
pub fn thousands(value: impl ToString) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
