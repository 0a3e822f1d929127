#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Dedicated enumerator for 3-SAT with exactly eight clauses.
//!
//! Eight 3-clauses falsify at most `8 * 2^(v-3) = 2^v` assignments, which is
//! the whole space. Full coverage therefore forces every pair of
//! falsification sets to be disjoint: the formula is an exact cover, and
//! each clause uniquely falsifies its whole block, so minimality is
//! automatic. Counting reduces to enumerating 8-cliques of the clause
//! disjointness graph and applying the all-variables and canonicality
//! filters.
//!
//! The general engines reach the same numbers; this path just skips the
//! astronomically larger candidate space they would wade through.

use super::catalog::{ClauseCatalog, ClauseId};
use super::evaluator::{orbit_contribution, CountMode};
use super::flat::ChunkOutcome;

/// Clique size: the structural minimum clause count of unsatisfiable 3-CNF.
pub const EXACT_COVER_CLAUSES: usize = 8;

const ADJ_WORDS: usize = 15; // ceil(960 / 64): adjacency row for the largest catalog

/// Counts MU (or plain UNSAT) formulas for `(v, 3, 8)` by clique
/// enumeration over the disjointness graph.
///
/// # Panics
///
/// Panics if the catalog is not a 3-SAT catalog.
#[must_use]
pub fn count_exact_cover(cat: &ClauseCatalog, mode: CountMode) -> ChunkOutcome {
    assert_eq!(cat.literals(), 3, "exact cover applies to 3-SAT only");
    let t = cat.clause_count();
    debug_assert!(t.div_ceil(64) <= ADJ_WORDS);

    // adj[i] = clauses j > i whose falsification sets are disjoint from i's.
    let mut adj = vec![[0_u64; ADJ_WORDS]; t];
    for i in 0..t {
        let fi = cat.falsified(i as ClauseId);
        for j in i + 1..t {
            let fj = cat.falsified(j as ClauseId);
            if fi.iter().zip(fj).all(|(a, b)| a & b == 0) {
                adj[i][j / 64] |= 1 << (j % 64);
            }
        }
    }

    let mut out = ChunkOutcome::default();
    let mut chosen = [0 as ClauseId; EXACT_COVER_CLAUSES];
    let mut frontier = [[0_u64; ADJ_WORDS]; EXACT_COVER_CLAUSES];
    for first in 0..t {
        chosen[0] = first as ClauseId;
        frontier[0] = adj[first];
        extend(cat, &adj, &mut chosen, &mut frontier, 1, mode, &mut out);
    }
    out
}

fn extend(
    cat: &ClauseCatalog,
    adj: &[[u64; ADJ_WORDS]],
    chosen: &mut [ClauseId; EXACT_COVER_CLAUSES],
    frontier: &mut [[u64; ADJ_WORDS]; EXACT_COVER_CLAUSES],
    depth: usize,
    mode: CountMode,
    out: &mut ChunkOutcome,
) {
    let candidates = frontier[depth - 1];
    if depth == EXACT_COVER_CLAUSES {
        out.absorb_clique(cat, chosen, mode);
        return;
    }
    // Not enough candidates left to finish the clique.
    let remaining: u32 = candidates.iter().map(|w| w.count_ones()).sum();
    if (remaining as usize) < EXACT_COVER_CLAUSES - depth {
        return;
    }

    for (word_idx, &word) in candidates.iter().enumerate() {
        let mut bits = word;
        while bits != 0 {
            let next = word_idx * 64 + bits.trailing_zeros() as usize;
            bits &= bits - 1;
            chosen[depth] = next as ClauseId;
            for w in 0..ADJ_WORDS {
                frontier[depth][w] = candidates[w] & adj[next][w];
            }
            extend(cat, adj, chosen, frontier, depth + 1, mode, out);
        }
    }
}

impl ChunkOutcome {
    fn absorb_clique(
        &mut self,
        cat: &ClauseCatalog,
        ids: &[ClauseId; EXACT_COVER_CLAUSES],
        mode: CountMode,
    ) {
        self.tested += 1;
        // Disjoint blocks cover 8 * 2^(v-3) = 2^v assignments: UNSAT and
        // minimal by construction. Only the variable and orbit filters run.
        match mode {
            CountMode::Unsat => self.contribution += 1,
            CountMode::MinUnsat => {
                let mut var_cov = 0_u16;
                let mut pos = 0_u64;
                let mut neg = 0_u64;
                for &id in ids {
                    var_cov |= cat.var_usage(id);
                    pos += cat.pos_counts(id);
                    neg += cat.neg_counts(id);
                }
                if var_cov != cat.all_vars_mask() {
                    return;
                }
                if let Some(weight) = orbit_contribution(cat.vars(), pos, neg) {
                    self.contribution += weight;
                }
            }
        }
    }
}
