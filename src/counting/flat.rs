#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Flat chunked enumeration (the "V2" dispatcher).
//!
//! The `C(T, c)` candidate space is cut into chunks of `CHUNK_SIZE`
//! consecutive lexicographic positions. A worker unranks the first candidate
//! of its chunk once and then advances with the constant-time successor, so
//! the ranking cost is amortized across the whole chunk and the inner loop
//! touches only catalog rows.

use super::catalog::{ClauseCatalog, ClauseId};
use super::evaluator::{evaluate, Accumulator, CountMode, Verdict};
use super::mask::AssignmentMask;
use super::ranker::{next_combination, BinomialTable};

/// Candidates per chunk.
pub const CHUNK_SIZE: u64 = 1024;

/// Maximum clause count the scratch tuples accommodate.
pub const TUPLE_CAPACITY: usize = 20;

/// Per-chunk result, reduced by addition on the host side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkOutcome {
    /// Sum of orbit contributions found in the chunk.
    pub contribution: u64,
    /// Candidates examined.
    pub tested: u64,
    /// Candidates rejected by the group-coverage byte alone.
    pub group_skipped: u64,
}

impl ChunkOutcome {
    /// Combines two partial results; the reduction operator of every batch.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self {
            contribution: self.contribution + other.contribution,
            tested: self.tested + other.tested,
            group_skipped: self.group_skipped + other.group_skipped,
        }
    }

    pub(crate) fn absorb(&mut self, verdict: Verdict) {
        self.tested += 1;
        match verdict {
            Verdict::Counted(w) => self.contribution += w,
            Verdict::GroupSkipped => self.group_skipped += 1,
            Verdict::Rejected => {}
        }
    }
}

/// A configured flat enumeration over one catalog.
#[derive(Debug, Clone, Copy)]
pub struct FlatJob<'a, M: AssignmentMask> {
    cat: &'a ClauseCatalog,
    table: &'a BinomialTable,
    clauses: usize,
    mode: CountMode,
    full: M,
    total_combinations: u64,
}

impl<'a, M: AssignmentMask> FlatJob<'a, M> {
    /// Sets up the job; the Pascal table must cover `(T, c)`.
    #[must_use]
    pub fn new(cat: &'a ClauseCatalog, table: &'a BinomialTable, clauses: usize, mode: CountMode) -> Self {
        let total_combinations = table.count(cat.clause_count(), clauses);
        Self {
            cat,
            table,
            clauses,
            mode,
            full: M::full(cat.assignments()),
            total_combinations,
        }
    }

    /// Number of candidates, `C(T, c)`.
    #[must_use]
    pub const fn total_combinations(&self) -> u64 {
        self.total_combinations
    }

    /// Number of chunks covering the space.
    #[must_use]
    pub const fn total_chunks(&self) -> u64 {
        self.total_combinations.div_ceil(CHUNK_SIZE)
    }

    /// Processes one chunk: unrank once, evaluate, advance.
    #[must_use]
    pub fn process_chunk(&self, chunk: u64) -> ChunkOutcome {
        let n = self.cat.clause_count();
        let start = chunk * CHUNK_SIZE;
        let len = CHUNK_SIZE.min(self.total_combinations - start);

        let mut ids = [0 as ClauseId; TUPLE_CAPACITY];
        let tuple = &mut ids[..self.clauses];
        self.table.unrank(start, n, self.clauses, tuple);

        let seed = Accumulator::new();
        let mut out = ChunkOutcome::default();
        for i in 0..len {
            out.absorb(evaluate(self.cat, self.full, &seed, &[], tuple, self.mode));
            if i + 1 < len && !next_combination(tuple, n) {
                break;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_all<M: AssignmentMask>(job: &FlatJob<'_, M>) -> ChunkOutcome {
        (0..job.total_chunks())
            .map(|chunk| job.process_chunk(chunk))
            .fold(ChunkOutcome::default(), ChunkOutcome::merge)
    }

    #[test]
    fn counts_the_known_two_sat_values() {
        for (v, c, want) in [(2, 4, 1), (3, 4, 6), (3, 5, 36), (3, 6, 4), (4, 6, 1008)] {
            let cat = ClauseCatalog::new(v, 2).unwrap();
            let table = BinomialTable::new(cat.clause_count(), c);
            let job: FlatJob<'_, u64> = FlatJob::new(&cat, &table, c, CountMode::MinUnsat);
            let out = run_all(&job);
            assert_eq!(out.contribution, want, "v={v}, c={c}");
            assert_eq!(out.tested, job.total_combinations());
        }
    }

    #[test]
    fn counts_unsat_formulas_in_unsat_mode() {
        for (v, c, want) in [(3, 4, 9), (3, 5, 108), (4, 5, 888)] {
            let cat = ClauseCatalog::new(v, 2).unwrap();
            let table = BinomialTable::new(cat.clause_count(), c);
            let job: FlatJob<'_, u64> = FlatJob::new(&cat, &table, c, CountMode::Unsat);
            assert_eq!(run_all(&job).contribution, want, "v={v}, c={c}");
        }
    }

    #[test]
    fn chunk_results_are_independent_of_partitioning() {
        // Summing per-chunk results must equal a single sequential pass.
        let cat = ClauseCatalog::new(3, 2).unwrap();
        let table = BinomialTable::new(cat.clause_count(), 5);
        let job: FlatJob<'_, u64> = FlatJob::new(&cat, &table, 5, CountMode::MinUnsat);
        let total = run_all(&job);

        let mut shuffled = ChunkOutcome::default();
        for chunk in (0..job.total_chunks()).rev() {
            shuffled = shuffled.merge(job.process_chunk(chunk));
        }
        assert_eq!(total, shuffled);
    }

    #[test]
    fn last_partial_chunk_is_clamped() {
        let cat = ClauseCatalog::new(3, 2).unwrap();
        let table = BinomialTable::new(cat.clause_count(), 4);
        let job: FlatJob<'_, u64> = FlatJob::new(&cat, &table, 4, CountMode::MinUnsat);
        // C(12, 4) = 495 < 1024: one partial chunk.
        assert_eq!(job.total_chunks(), 1);
        assert_eq!(job.process_chunk(0).tested, 495);
    }
}
