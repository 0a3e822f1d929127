#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The per-candidate test.
//!
//! Given an ascending tuple of clause IDs, decide whether the formula is
//! minimally unsatisfiable and, if so, how much its polarity orbit
//! contributes to the total. The whole test is a single linear scan over the
//! clauses followed by constant-time filters:
//!
//! - UNSAT is "every assignment falsified by some clause" (`one` covers the
//!   space).
//! - Minimality is the unique-coverage criterion: every clause must falsify
//!   at least one assignment no other clause falsifies (`F[i] & one & !two`
//!   nonempty).
//! - Only canonical representatives are counted (each variable occurring at
//!   least as often positively as negatively); the contribution `2^(v-s)`
//!   weighs the orbit, where `s` counts the balanced variables.
//!
//! The same scan serves the plain UNSAT count: coverage only, contribution
//! one per formula, no orbit weighting.

use super::catalog::{ClauseCatalog, ClauseId, POLARITY_FIELD, POLARITY_STRIDE};
use super::mask::AssignmentMask;

/// Which census the evaluator runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountMode {
    /// Minimally unsatisfiable formulas using every variable, weighted by
    /// polarity-orbit size.
    MinUnsat,
    /// All unsatisfiable formulas, one count each.
    Unsat,
}

/// Folded state of a (partial) candidate.
///
/// `two` tracks assignments covered at least twice, maintained by the
/// incremental identity `two |= one & m; one |= m`. The group byte is the OR
/// of the clauses' group-coverage bytes; `0xFF` means "could still cover all
/// selected hard assignments".
#[derive(Debug, Clone, Copy)]
pub struct Accumulator<M: AssignmentMask> {
    /// Assignments falsified by at least one clause.
    pub one: M,
    /// Assignments falsified by at least two clauses.
    pub two: M,
    /// Variables used so far.
    pub var_cov: u16,
    /// Packed positive-occurrence counts.
    pub pos: u64,
    /// Packed negative-occurrence counts.
    pub neg: u64,
    /// OR of group-coverage bytes.
    pub group: u8,
}

impl<M: AssignmentMask> Accumulator<M> {
    /// The empty fold.
    #[must_use]
    pub fn new() -> Self {
        Self {
            one: M::zero(),
            two: M::zero(),
            var_cov: 0,
            pos: 0,
            neg: 0,
            group: 0,
        }
    }

    /// Folds one clause into the state.
    #[inline]
    pub fn fold(&mut self, cat: &ClauseCatalog, id: ClauseId) {
        let mask = M::load(cat.falsified(id));
        self.two = self.two.or(self.one.and(mask));
        self.one = self.one.or(mask);
        self.var_cov |= cat.var_usage(id);
        self.pos += cat.pos_counts(id);
        self.neg += cat.neg_counts(id);
        self.group |= cat.group_cover(id);
    }
}

impl<M: AssignmentMask> Default for Accumulator<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of evaluating one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The candidate counts, with this contribution.
    Counted(u64),
    /// Rejected by the group-coverage filter before the coverage test.
    GroupSkipped,
    /// Rejected by the coverage, variable, minimality, or canonicality test.
    Rejected,
}

/// Evaluates the candidate formed by `prefix_ids` followed by `suffix_ids`,
/// starting from `seed` (the fold of the prefix clauses). Flat enumeration
/// passes an empty prefix and seed.
///
/// The tuple is never mutated; the verdict is a pure function of the
/// ascending ID sequence.
#[inline]
pub fn evaluate<M: AssignmentMask>(
    cat: &ClauseCatalog,
    full: M,
    seed: &Accumulator<M>,
    prefix_ids: &[ClauseId],
    suffix_ids: &[ClauseId],
    mode: CountMode,
) -> Verdict {
    let mut acc = *seed;
    for &id in suffix_ids {
        acc.fold(cat, id);
    }

    // Necessary condition for UNSAT: the formula must cover the selected
    // hard assignments. Vacuous (all bytes 0xFF) when the oracle is off.
    if acc.group != 0xFF {
        return Verdict::GroupSkipped;
    }

    match mode {
        CountMode::Unsat => {
            if acc.one == full {
                Verdict::Counted(1)
            } else {
                Verdict::Rejected
            }
        }
        CountMode::MinUnsat => {
            if acc.var_cov != cat.all_vars_mask() {
                return Verdict::Rejected;
            }
            if acc.one != full {
                return Verdict::Rejected;
            }

            // Minimality: each clause must uniquely falsify something.
            let unique = acc.one.and_not(acc.two);
            for &id in prefix_ids.iter().chain(suffix_ids) {
                if !M::load(cat.falsified(id)).intersects(unique) {
                    return Verdict::Rejected;
                }
            }

            match orbit_contribution(cat.vars(), acc.pos, acc.neg) {
                Some(weight) => Verdict::Counted(weight),
                None => Verdict::Rejected,
            }
        }
    }
}

/// Orbit weight of a canonical candidate, or `None` when some variable
/// occurs more often negatively than positively (the candidate is a
/// non-canonical orbit member and is counted via its representative).
#[inline]
#[must_use]
pub fn orbit_contribution(vars: u32, pos: u64, neg: u64) -> Option<u64> {
    let mut balanced = 0_u32;
    for var in 0..vars {
        let p = (pos >> (POLARITY_STRIDE * var)) & POLARITY_FIELD;
        let n = (neg >> (POLARITY_STRIDE * var)) & POLARITY_FIELD;
        if p < n {
            return None;
        }
        balanced += u32::from(p == n);
    }
    Some(1 << (vars - balanced))
}
