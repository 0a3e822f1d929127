#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Prefix-pruned hybrid enumeration (the "V3" dispatcher).
//!
//! Flat enumeration at moderate 3-SAT parameters is bounded by `C(T, c)`
//! even though almost no candidate can be unsatisfiable. V3 walks the short
//! `P`-clause prefixes on the host, discards every prefix that provably
//! cannot be completed to a covering formula, and dispatches chunked suffix
//! enumeration only for the survivors.
//!
//! All three prunes are necessary conditions for full coverage, so the
//! partition is conservative: a candidate's contribution is identical
//! whether it is reached through V2 or V3.
//!
//! Work is flattened across prefixes: chunk id `g` is resolved to its owning
//! prefix by binary search over a cumulative-chunk vector, so the dispatcher
//! needs no per-prefix bookkeeping.

use super::catalog::{ClauseCatalog, ClauseId};
use super::error::CountError;
use super::evaluator::{evaluate, Accumulator, CountMode, Verdict};
use super::flat::{ChunkOutcome, CHUNK_SIZE, TUPLE_CAPACITY};
use super::mask::AssignmentMask;
use super::ranker::{next_combination, BinomialTable};

/// Default prefix depth: three clauses once the suffix space is large enough
/// to repay the extra host work.
#[must_use]
pub const fn default_prefix_len(clauses: u32) -> u32 {
    if clauses > 12 {
        3
    } else {
        2
    }
}

/// Folded state of one surviving prefix. The prefix clause IDs ride along
/// packed 16 bits each so the minimality check can reach them.
#[derive(Debug, Clone, Copy)]
pub struct PrefixState<M: AssignmentMask> {
    one: M,
    two: M,
    var_cov: u16,
    pos: u64,
    neg: u64,
    group: u8,
    packed_ids: u64,
    window_start: ClauseId,
}

impl<M: AssignmentMask> PrefixState<M> {
    fn ids(&self, prefix_len: usize) -> [ClauseId; 3] {
        let mut out = [0; 3];
        for (slot, id) in out.iter_mut().enumerate().take(prefix_len) {
            *id = (self.packed_ids >> (16 * slot)) as ClauseId;
        }
        out
    }
}

/// Survivor table plus the flattened work decomposition.
#[derive(Debug, Clone)]
pub struct HybridPlan<M: AssignmentMask> {
    prefix_len: usize,
    suffix_len: usize,
    states: Vec<PrefixState<M>>,
    /// `cumulative[p]` = suffix chunks owned by prefixes `0..p`.
    cumulative: Vec<u64>,
    total_chunks: u64,
    total_candidates: u64,
    /// Prefixes examined on the host (survivors + pruned).
    pub prefixes_examined: u64,
    /// Prefixes discarded by the coverage, variable, and capacity prunes.
    pub prefixes_pruned: u64,
}

impl<M: AssignmentMask> HybridPlan<M> {
    /// Surviving prefixes.
    #[must_use]
    pub fn survivors(&self) -> usize {
        self.states.len()
    }

    /// Total flattened chunk count `W`.
    #[must_use]
    pub const fn total_chunks(&self) -> u64 {
        self.total_chunks
    }

    /// Candidates reachable through the surviving prefixes.
    #[must_use]
    pub const fn total_candidates(&self) -> u64 {
        self.total_candidates
    }
}

/// Enumerates prefixes and builds the survivor table.
///
/// In [`CountMode::Unsat`] the variable prune is skipped: plain UNSAT
/// counting does not require every variable to appear.
///
/// # Errors
///
/// `CountError::Resource` when the survivor table cannot be allocated.
///
/// # Panics
///
/// Panics if `prefix_len` is not 2 or 3, or `clauses <= prefix_len`.
pub fn build_plan<M: AssignmentMask>(
    cat: &ClauseCatalog,
    table: &BinomialTable,
    clauses: usize,
    prefix_len: usize,
    mode: CountMode,
) -> Result<HybridPlan<M>, CountError> {
    assert!(prefix_len == 2 || prefix_len == 3, "prefix depth must be 2 or 3");
    assert!(clauses > prefix_len);

    let t = cat.clause_count();
    let suffix_len = clauses - prefix_len;
    let full = M::full(cat.assignments());
    let all_vars = cat.all_vars_mask();
    let suffix_capacity = suffix_len as u64 * cat.falsified_per_clause();
    let assignments = cat.assignments() as u64;

    // suffix-OR tables: what the clauses strictly after index i can still
    // falsify, and which variables they can still introduce.
    let mut suff_cov = vec![M::zero(); t];
    let mut suff_var = vec![0_u16; t];
    for i in (0..t - 1).rev() {
        let next_id = (i + 1) as ClauseId;
        suff_cov[i] = suff_cov[i + 1].or(M::load(cat.falsified(next_id)));
        suff_var[i] = suff_var[i + 1] | cat.var_usage(next_id);
    }

    let mut plan = HybridPlan {
        prefix_len,
        suffix_len,
        states: Vec::new(),
        cumulative: vec![0],
        total_chunks: 0,
        total_candidates: 0,
        prefixes_examined: 0,
        prefixes_pruned: 0,
    };

    // Last prefix index must leave room for the suffix.
    let max_last = t - suffix_len - 1;

    let mut consider = |ids: &[ClauseId], acc: &Accumulator<M>| -> Result<(), CountError> {
        plan.prefixes_examined += 1;
        let last = *ids.last().unwrap() as usize;

        if acc.one.or(suff_cov[last]) != full {
            plan.prefixes_pruned += 1;
            return Ok(());
        }
        if mode == CountMode::MinUnsat && acc.var_cov | suff_var[last] != all_vars {
            plan.prefixes_pruned += 1;
            return Ok(());
        }
        let missing = assignments - u64::from(acc.one.count_ones());
        if missing > suffix_capacity {
            plan.prefixes_pruned += 1;
            return Ok(());
        }

        let window = t - last - 1;
        let candidates = table.count(window, suffix_len);
        let chunks = candidates.div_ceil(CHUNK_SIZE);

        let mut packed = 0_u64;
        for (slot, &id) in ids.iter().enumerate() {
            packed |= u64::from(id) << (16 * slot);
        }

        if plan.states.len() == plan.states.capacity() {
            let grow = plan.states.len().max(4096);
            plan.states
                .try_reserve(grow)
                .map_err(|source| CountError::Resource { what: "prefix-state table", source })?;
        }
        plan.states.push(PrefixState {
            one: acc.one,
            two: acc.two,
            var_cov: acc.var_cov,
            pos: acc.pos,
            neg: acc.neg,
            group: acc.group,
            packed_ids: packed,
            window_start: (last + 1) as ClauseId,
        });
        plan.total_chunks += chunks;
        plan.total_candidates += candidates;
        plan.cumulative.push(plan.total_chunks);
        Ok(())
    };

    if prefix_len == 2 {
        for a in 0..max_last {
            let mut acc_a = Accumulator::new();
            acc_a.fold(cat, a as ClauseId);
            for b in a + 1..=max_last {
                let mut acc = acc_a;
                acc.fold(cat, b as ClauseId);
                consider(&[a as ClauseId, b as ClauseId], &acc)?;
            }
        }
    } else {
        for a in 0..max_last.saturating_sub(1) {
            let mut acc_a = Accumulator::new();
            acc_a.fold(cat, a as ClauseId);
            for b in a + 1..max_last {
                let mut acc_b = acc_a;
                acc_b.fold(cat, b as ClauseId);
                for c in b + 1..=max_last {
                    let mut acc = acc_b;
                    acc.fold(cat, c as ClauseId);
                    consider(&[a as ClauseId, b as ClauseId, c as ClauseId], &acc)?;
                }
            }
        }
    }

    Ok(plan)
}

/// A configured hybrid enumeration.
#[derive(Debug, Clone, Copy)]
pub struct HybridJob<'a, M: AssignmentMask> {
    cat: &'a ClauseCatalog,
    table: &'a BinomialTable,
    plan: &'a HybridPlan<M>,
    mode: CountMode,
    full: M,
}

impl<'a, M: AssignmentMask> HybridJob<'a, M> {
    /// Binds a plan to its catalog and ranking table.
    #[must_use]
    pub fn new(
        cat: &'a ClauseCatalog,
        table: &'a BinomialTable,
        plan: &'a HybridPlan<M>,
        mode: CountMode,
    ) -> Self {
        Self {
            cat,
            table,
            plan,
            mode,
            full: M::full(cat.assignments()),
        }
    }

    /// Processes flattened chunk `g`: locate the owning prefix, unrank the
    /// local suffix position, and run the evaluator seeded with the prefix
    /// fold.
    #[must_use]
    pub fn process_chunk(&self, g: u64) -> ChunkOutcome {
        let plan = self.plan;
        let t = self.cat.clause_count();

        let prefix_idx = plan.cumulative.partition_point(|&x| x <= g) - 1;
        let state = &plan.states[prefix_idx];
        let local = g - plan.cumulative[prefix_idx];

        let window_start = state.window_start as usize;
        let window = t - window_start;
        let candidates = self.table.count(window, plan.suffix_len);
        let start = local * CHUNK_SIZE;
        let len = CHUNK_SIZE.min(candidates - start);

        let mut ids = [0 as ClauseId; TUPLE_CAPACITY];
        let tuple = &mut ids[..plan.suffix_len];
        self.table.unrank(start, window, plan.suffix_len, tuple);
        for id in tuple.iter_mut() {
            *id += window_start as ClauseId;
        }

        let prefix_ids = state.ids(plan.prefix_len);
        let prefix_ids = &prefix_ids[..plan.prefix_len];
        let seed = Accumulator {
            one: state.one,
            two: state.two,
            var_cov: state.var_cov,
            pos: state.pos,
            neg: state.neg,
            group: state.group,
        };

        let mut out = ChunkOutcome::default();
        for i in 0..len {
            out.absorb(self.eval(&seed, prefix_ids, tuple));
            if i + 1 < len && !next_combination(tuple, t) {
                break;
            }
        }
        out
    }

    fn eval(&self, seed: &Accumulator<M>, prefix_ids: &[ClauseId], suffix: &[ClauseId]) -> Verdict {
        evaluate(self.cat, self.full, seed, prefix_ids, suffix, self.mode)
    }
}
