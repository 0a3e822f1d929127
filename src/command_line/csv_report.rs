#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! CSV reporting for the `unsat` verb.
//!
//! Rows are appended so repeated invocations build up a table; a fresh file
//! gets a commented preamble and the column header first.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

/// One appended row.
#[derive(Debug, Clone)]
pub struct UnsatRecord {
    /// Variable count.
    pub vars: u32,
    /// Clause width.
    pub literals: u32,
    /// Clause count.
    pub clauses: u32,
    /// The UNSAT count.
    pub unsat: u64,
    /// Candidates enumerated.
    pub combinations: u64,
    /// Wall time in milliseconds.
    pub time_ms: u64,
    /// Engine name.
    pub mode: String,
}

/// Appends `record` to the CSV at `path`, creating it with a header first
/// if needed.
///
/// # Errors
///
/// Propagates filesystem errors.
pub fn append_unsat_record(path: &Path, record: &UnsatRecord) -> io::Result<()> {
    let fresh = !path.exists();
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if fresh {
        writeln!(file, "# Counts of unsatisfiable {{2,3}}-CNF clause sets")?;
        writeln!(file, "# One row per invocation; counts are exact")?;
        writeln!(file, "v,l,c,UNSAT,Combinations,TimeMs,Mode")?;
    }
    writeln!(
        file,
        "{},{},{},{},{},{},{}",
        record.vars,
        record.literals,
        record.clauses,
        record.unsat,
        record.combinations,
        record.time_ms,
        record.mode
    )?;
    Ok(())
}
