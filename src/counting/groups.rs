#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The 3-SAT pruning oracle.
//!
//! An unsatisfiable formula must falsify *every* assignment, so in
//! particular the assignments that the fewest clauses can falsify. The
//! oracle picks up to eight such "hard" assignments, preferring picks whose
//! covering-clause sets overlap little, and condenses each clause's
//! relationship to them into one byte: bit `g` set iff the clause falsifies
//! the `g`-th pick. The evaluator ORs the bytes of a candidate; anything
//! short of `0xFF` cannot be UNSAT and is skipped before the wide mask
//! work. The filter is a necessary condition, never a complete test.
//!
//! The oracle is built for 3-SAT only; for 2-SAT its overhead exceeds its
//! benefit and the catalog keeps the vacuous all-ones bytes.

use super::catalog::{ClauseCatalog, ClauseId};

/// Maximum number of hard assignments, one per bit of the group byte.
pub const MAX_GROUPS: usize = 8;

/// Two picks are considered redundant when their covering-clause sets
/// overlap by more than this share of the candidate's own cover.
pub const GROUP_OVERLAP_PERCENT: u64 = 80;

/// Selection produced by [`build_group_cover`].
#[derive(Debug, Clone)]
pub struct GroupSelection {
    /// The selected assignments, rarest-covered first.
    pub assignments: Vec<usize>,
    /// Per-clause coverage bytes ready for the catalog.
    pub bytes: Vec<u8>,
}

/// Runs the greedy hard-assignment selection over a catalog.
///
/// Returns `None` when no assignment can be selected (the dispatcher then
/// falls back to unpruned enumeration; the orchestrator logs the switch).
#[must_use]
pub fn build_group_cover(cat: &ClauseCatalog) -> Option<GroupSelection> {
    let t = cat.clause_count();
    let assignments = cat.assignments();
    let set_words = t.div_ceil(64);

    // Covering-clause set per assignment: which clauses falsify it.
    let mut covers = vec![0_u64; assignments * set_words];
    let mut cover_sizes = vec![0_u64; assignments];
    for id in 0..t {
        let row = cat.falsified(id as ClauseId);
        for (word_idx, &word) in row.iter().enumerate() {
            let mut bits = word;
            while bits != 0 {
                let a = word_idx * 64 + bits.trailing_zeros() as usize;
                bits &= bits - 1;
                covers[a * set_words + id / 64] |= 1 << (id % 64);
                cover_sizes[a] += 1;
            }
        }
    }

    let mut used = vec![false; assignments];
    let mut picks = Vec::with_capacity(MAX_GROUPS);
    while picks.len() < MAX_GROUPS {
        let pick = (0..assignments)
            .filter(|&a| !used[a])
            .min_by_key(|&a| (cover_sizes[a], a))?;
        if picks.is_empty() && cover_sizes[pick] == 0 {
            // An uncoverable assignment would make every candidate skip;
            // cannot happen for a well-formed catalog, but the contract is
            // to refuse rather than mispredict.
            return None;
        }
        picks.push(pick);
        used[pick] = true;

        // Retire assignments whose cover is mostly shared with the pick.
        let pick_set = &covers[pick * set_words..(pick + 1) * set_words];
        for a in 0..assignments {
            if used[a] {
                continue;
            }
            let a_set = &covers[a * set_words..(a + 1) * set_words];
            let shared: u64 = a_set
                .iter()
                .zip(pick_set)
                .map(|(x, y)| u64::from((x & y).count_ones()))
                .sum();
            if shared * 100 > cover_sizes[a] * GROUP_OVERLAP_PERCENT {
                used[a] = true;
            }
        }

        if (0..assignments).all(|a| used[a]) {
            break;
        }
    }

    if picks.is_empty() {
        return None;
    }

    let mut bytes = vec![0_u8; t];
    for (id, byte) in bytes.iter_mut().enumerate() {
        let row = cat.falsified(id as ClauseId);
        for (g, &a) in picks.iter().enumerate() {
            if row[a / 64] >> (a % 64) & 1 == 1 {
                *byte |= 1 << g;
            }
        }
        // Unused high bits read as covered so the full mask is always 0xFF.
        for g in picks.len()..8 {
            *byte |= 1 << g;
        }
    }

    Some(GroupSelection {
        assignments: picks,
        bytes,
    })
}
