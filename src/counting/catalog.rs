#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The clause-type catalog.
//!
//! The catalog enumerates every `k`-clause over `v` labeled variables once,
//! in a fixed canonical order, and precomputes the per-clause data every
//! other component consumes:
//!
//! - the falsification mask `F[c]` (bitset over all `2^v` assignments),
//! - the variable-usage mask `V[c]`,
//! - packed per-variable polarity counters `P+[c]` / `P-[c]`,
//! - the group-coverage byte `G[c]` (populated by the pruning oracle).
//!
//! Canonical clause IDs are assigned by iterating variable tuples
//! `v1 < v2 < .. < vk` in ascending lexicographic order and, within each
//! tuple, polarity tuples in ascending binary order with positive before
//! negative. The enumeration order is load-bearing: the ranker's bijection
//! and checkpoint resumption both depend on it.
//!
//! Building a catalog is the only place the `2^v` factor appears; the cost
//! is amortized across every candidate evaluated afterwards.

use super::error::{ConfigError, MAX_VARS};
use super::ranker::next_combination;

/// Index of a clause type in the catalog. `T = C(v,k) * 2^k <= 960` for all
/// parameters in scope, so sixteen bits always suffice.
pub type ClauseId = u16;

/// Stride of the packed polarity counters: five bits per variable, which
/// tolerates up to 31 occurrences. The engine caps `c` at 20.
pub const POLARITY_STRIDE: u32 = 5;

/// Mask of one packed polarity field.
pub const POLARITY_FIELD: u64 = 0x1F;

/// Immutable per-`(v, k)` clause data. Built once, shared read-only by every
/// worker for the rest of the run.
#[derive(Debug, Clone)]
pub struct ClauseCatalog {
    vars: u32,
    literals: u32,
    clause_count: usize,
    words: usize,
    assignments: usize,
    falsified: Vec<u64>,
    var_usage: Vec<u16>,
    pos_counts: Vec<u64>,
    neg_counts: Vec<u64>,
    group_cover: Vec<u8>,
}

impl ClauseCatalog {
    /// Builds the catalog for `v` variables and clause width `k`.
    ///
    /// # Errors
    ///
    /// `ConfigError` when `k` is not 2 or 3 or `v` is outside `k..=10`.
    pub fn new(vars: u32, literals: u32) -> Result<Self, ConfigError> {
        if !(2..=3).contains(&literals) {
            return Err(ConfigError::UnsupportedLiteralCount { literals });
        }
        if vars < literals || vars > MAX_VARS {
            return Err(ConfigError::VariableCountOutOfRange { vars, literals });
        }

        let k = literals as usize;
        let assignments = 1_usize << vars;
        let words = assignments.div_ceil(64);
        let var_choices = choose(vars as usize, k);
        let clause_count = var_choices << k;

        let mut falsified = vec![0_u64; clause_count * words];
        let mut var_usage = Vec::with_capacity(clause_count);
        let mut pos_counts = Vec::with_capacity(clause_count);
        let mut neg_counts = Vec::with_capacity(clause_count);

        let mut var_tuple: [ClauseId; 3] = [0, 1, 2];
        let tuple = &mut var_tuple[..k];

        let mut id = 0_usize;
        loop {
            // Polarity tuples in ascending binary order, first variable most
            // significant; bit 0 is positive, bit 1 negative.
            for pols in 0..1_u32 << k {
                let mut usage = 0_u16;
                let mut pos = 0_u64;
                let mut neg = 0_u64;
                for (j, &var) in tuple.iter().enumerate() {
                    let negated = (pols >> (k - 1 - j)) & 1 == 1;
                    usage |= 1 << var;
                    if negated {
                        neg += 1 << (POLARITY_STRIDE * u32::from(var));
                    } else {
                        pos += 1 << (POLARITY_STRIDE * u32::from(var));
                    }
                }

                let row = &mut falsified[id * words..(id + 1) * words];
                for a in 0..assignments {
                    let falsifies = tuple.iter().enumerate().all(|(j, &var)| {
                        let bit = (a >> var) & 1;
                        let negated = (pols >> (k - 1 - j)) & 1;
                        bit == negated as usize
                    });
                    if falsifies {
                        row[a / 64] |= 1 << (a % 64);
                    }
                }

                var_usage.push(usage);
                pos_counts.push(pos);
                neg_counts.push(neg);
                id += 1;
            }
            if !next_combination(tuple, vars as usize) {
                break;
            }
        }
        debug_assert_eq!(id, clause_count);

        Ok(Self {
            vars,
            literals,
            clause_count,
            words,
            assignments,
            falsified,
            var_usage,
            pos_counts,
            neg_counts,
            group_cover: vec![0xFF; clause_count],
        })
    }

    /// Variable count `v`.
    #[must_use]
    pub const fn vars(&self) -> u32 {
        self.vars
    }

    /// Clause width `k`.
    #[must_use]
    pub const fn literals(&self) -> u32 {
        self.literals
    }

    /// Number of clause types `T`.
    #[must_use]
    pub const fn clause_count(&self) -> usize {
        self.clause_count
    }

    /// Words per falsification mask, `ceil(2^v / 64)`.
    #[must_use]
    pub const fn words(&self) -> usize {
        self.words
    }

    /// Size of the assignment space, `2^v`.
    #[must_use]
    pub const fn assignments(&self) -> usize {
        self.assignments
    }

    /// Assignments falsified by any single clause, `2^(v-k)`.
    #[must_use]
    pub const fn falsified_per_clause(&self) -> u64 {
        1 << (self.vars - self.literals)
    }

    /// Mask with one bit per variable.
    #[must_use]
    pub const fn all_vars_mask(&self) -> u16 {
        ((1_u32 << self.vars) - 1) as u16
    }

    /// Falsification mask words of clause `id`.
    #[must_use]
    pub fn falsified(&self, id: ClauseId) -> &[u64] {
        let i = id as usize * self.words;
        &self.falsified[i..i + self.words]
    }

    /// Variable-usage mask of clause `id`.
    #[must_use]
    pub fn var_usage(&self, id: ClauseId) -> u16 {
        self.var_usage[id as usize]
    }

    /// Packed positive-occurrence counters of clause `id`.
    #[must_use]
    pub fn pos_counts(&self, id: ClauseId) -> u64 {
        self.pos_counts[id as usize]
    }

    /// Packed negative-occurrence counters of clause `id`.
    #[must_use]
    pub fn neg_counts(&self, id: ClauseId) -> u64 {
        self.neg_counts[id as usize]
    }

    /// Group-coverage byte of clause `id`. `0xFF` while the pruning oracle
    /// has not been installed, so the evaluator's filter is vacuous then.
    #[must_use]
    pub fn group_cover(&self, id: ClauseId) -> u8 {
        self.group_cover[id as usize]
    }

    /// Installs the group-coverage bytes produced by the pruning oracle.
    ///
    /// # Panics
    ///
    /// Panics if the vector length does not match the clause count.
    pub fn set_group_cover(&mut self, bytes: Vec<u8>) {
        assert_eq!(bytes.len(), self.clause_count);
        self.group_cover = bytes;
    }
}

const fn choose(n: usize, r: usize) -> usize {
    // Only ever called with r in {2, 3}.
    match r {
        2 => n * (n - 1) / 2,
        _ => n * (n - 1) * (n - 2) / 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn popcount_row(cat: &ClauseCatalog, id: ClauseId) -> u32 {
        cat.falsified(id).iter().map(|w| w.count_ones()).sum()
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        assert!(matches!(
            ClauseCatalog::new(3, 4),
            Err(ConfigError::UnsupportedLiteralCount { literals: 4 })
        ));
        assert!(matches!(
            ClauseCatalog::new(2, 3),
            Err(ConfigError::VariableCountOutOfRange { vars: 2, literals: 3 })
        ));
        assert!(matches!(
            ClauseCatalog::new(11, 2),
            Err(ConfigError::VariableCountOutOfRange { vars: 11, .. })
        ));
    }

    #[test]
    fn clause_counts_match_the_formula() {
        for (v, k, t) in [(2, 2, 4), (3, 2, 12), (3, 3, 8), (6, 2, 60), (5, 3, 80)] {
            let cat = ClauseCatalog::new(v, k).unwrap();
            assert_eq!(cat.clause_count(), t, "T for v={v}, k={k}");
        }
    }

    #[test]
    fn every_clause_falsifies_exactly_two_to_the_v_minus_k() {
        for (v, k) in [(3, 2), (4, 2), (3, 3), (5, 3), (6, 2)] {
            let cat = ClauseCatalog::new(v, k).unwrap();
            for id in 0..cat.clause_count() as ClauseId {
                assert_eq!(
                    u64::from(popcount_row(&cat, id)),
                    cat.falsified_per_clause(),
                    "clause {id} of v={v}, k={k}"
                );
            }
        }
    }

    #[test]
    fn usage_masks_have_k_bits_and_match_polarity_fields() {
        let cat = ClauseCatalog::new(5, 3).unwrap();
        for id in 0..cat.clause_count() as ClauseId {
            let usage = cat.var_usage(id);
            assert_eq!(usage.count_ones(), 3);
            let occ = cat.pos_counts(id) + cat.neg_counts(id);
            for var in 0..5 {
                let field = (occ >> (POLARITY_STRIDE * var)) & POLARITY_FIELD;
                let used = (usage >> var) & 1;
                assert_eq!(field, u64::from(used), "var {var} of clause {id}");
            }
        }
    }

    #[test]
    fn canonical_order_is_vars_then_polarities() {
        // v=3, k=2: first four clauses use variables {0,1} with polarity
        // tuples (+,+), (+,-), (-,+), (-,-).
        let cat = ClauseCatalog::new(3, 2).unwrap();
        assert_eq!(cat.var_usage(0), 0b011);
        assert_eq!(cat.var_usage(3), 0b011);
        assert_eq!(cat.var_usage(4), 0b101);
        assert_eq!(cat.var_usage(8), 0b110);

        // Clause 0 = (x0 OR x1): falsified exactly when both are false.
        // Assignments with x0=0, x1=0 over 3 vars: a in {0b000, 0b100}.
        assert_eq!(cat.falsified(0)[0], 0b0001_0001);
        // Clause 1 = (x0 OR !x1): falsified when x0=0, x1=1.
        assert_eq!(cat.falsified(1)[0], 0b0100_0100);
        // Clause 2 = (!x0 OR x1): falsified when x0=1, x1=0.
        assert_eq!(cat.falsified(2)[0], 0b0010_0010);
    }

    #[test]
    fn multi_word_catalog_has_wide_rows() {
        let cat = ClauseCatalog::new(7, 3).unwrap();
        assert_eq!(cat.words(), 2);
        assert_eq!(cat.assignments(), 128);
        assert_eq!(cat.falsified(0).len(), 2);
        assert_eq!(u64::from(popcount_row(&cat, 0)), cat.falsified_per_clause());
    }

    #[test]
    fn group_cover_defaults_to_full() {
        let cat = ClauseCatalog::new(4, 3).unwrap();
        assert!((0..cat.clause_count() as ClauseId).all(|id| cat.group_cover(id) == 0xFF));
    }
}
