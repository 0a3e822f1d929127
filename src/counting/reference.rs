#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Brute-force reference counter.
//!
//! A deliberately naive implementation used to cross-check the engine on
//! small parameters: clauses are literal lists, satisfiability is a scan
//! over all assignments, and minimality re-tests satisfiability with each
//! clause removed. Nothing here shares code with the bitmask path, which is
//! the point.

use super::error::ConfigError;
use super::evaluator::CountMode;
use itertools::Itertools;
use smallvec::SmallVec;

/// Largest candidate space the reference will walk.
const REFERENCE_LIMIT: u128 = 25_000_000;

type Clause = SmallVec<[(u32, bool); 3]>;

/// Counts MU or UNSAT formulas by direct enumeration and semantic checks.
///
/// # Errors
///
/// `ConfigError::ReferenceOutOfScope` when `C(T, c)` exceeds the reference
/// budget.
pub fn count_reference(
    vars: u32,
    literals: u32,
    clauses: u32,
    mode: CountMode,
) -> Result<u64, ConfigError> {
    let catalog = clause_list(vars, literals);
    let t = catalog.len();
    if combinations(t as u128, clauses as u128) > REFERENCE_LIMIT {
        return Err(ConfigError::ReferenceOutOfScope {
            vars,
            literals,
            clauses,
        });
    }

    let mut total = 0_u64;
    for combo in (0..t).combinations(clauses as usize) {
        let formula: Vec<&Clause> = combo.iter().map(|&i| &catalog[i]).collect();
        let counted = match mode {
            CountMode::Unsat => !satisfiable(&formula, vars),
            CountMode::MinUnsat => is_minimally_unsatisfiable(&formula, vars),
        };
        total += u64::from(counted);
    }
    Ok(total)
}

/// Clause types in the catalog's canonical order, as literal lists.
fn clause_list(vars: u32, literals: u32) -> Vec<Clause> {
    let k = literals as usize;
    let mut out = Vec::new();
    for combo in (0..vars).combinations(k) {
        for pols in 0..1_u32 << k {
            let clause: Clause = combo
                .iter()
                .enumerate()
                .map(|(j, &var)| (var, (pols >> (k - 1 - j)) & 1 == 1))
                .collect();
            out.push(clause);
        }
    }
    out
}

/// Does some assignment satisfy every clause?
fn satisfiable(formula: &[&Clause], vars: u32) -> bool {
    (0..1_u64 << vars).any(|a| {
        formula.iter().all(|clause| {
            clause
                .iter()
                .any(|&(var, negated)| ((a >> var) & 1 == 1) != negated)
        })
    })
}

fn is_minimally_unsatisfiable(formula: &[&Clause], vars: u32) -> bool {
    if satisfiable(formula, vars) {
        return false;
    }
    let mut used = 0_u64;
    for clause in formula {
        for &(var, _) in clause.iter() {
            used |= 1 << var;
        }
    }
    if used != (1 << vars) - 1 {
        return false;
    }
    // Removing any single clause must leave a satisfiable formula.
    (0..formula.len()).all(|skip| {
        let rest: Vec<&Clause> = formula
            .iter()
            .enumerate()
            .filter_map(|(i, c)| (i != skip).then_some(*c))
            .collect();
        satisfiable(&rest, vars)
    })
}

fn combinations(n: u128, r: u128) -> u128 {
    if r > n {
        return 0;
    }
    let mut result = 1_u128;
    for i in 0..r {
        result = result.saturating_mul(n - i) / (i + 1);
        if result > REFERENCE_LIMIT {
            return result;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_reproduces_the_small_table() {
        assert_eq!(count_reference(2, 2, 4, CountMode::MinUnsat).unwrap(), 1);
        assert_eq!(count_reference(3, 2, 4, CountMode::MinUnsat).unwrap(), 6);
        assert_eq!(count_reference(3, 2, 5, CountMode::MinUnsat).unwrap(), 36);
        assert_eq!(count_reference(3, 2, 6, CountMode::MinUnsat).unwrap(), 4);
        assert_eq!(count_reference(3, 3, 8, CountMode::MinUnsat).unwrap(), 1);
    }

    #[test]
    fn reference_unsat_counts() {
        assert_eq!(count_reference(3, 2, 4, CountMode::Unsat).unwrap(), 9);
        assert_eq!(count_reference(3, 2, 5, CountMode::Unsat).unwrap(), 108);
        assert_eq!(count_reference(3, 2, 6, CountMode::Unsat).unwrap(), 352);
    }

    #[test]
    fn oversized_parameters_are_refused() {
        assert!(matches!(
            count_reference(6, 2, 12, CountMode::Unsat),
            Err(ConfigError::ReferenceOutOfScope { .. })
        ));
    }

    fn is_canonical(formula: &[&Clause], vars: u32) -> bool {
        (0..vars).all(|var| {
            let pos = formula
                .iter()
                .flat_map(|c| c.iter())
                .filter(|&&(v, negated)| v == var && !negated)
                .count();
            let neg = formula
                .iter()
                .flat_map(|c| c.iter())
                .filter(|&&(v, negated)| v == var && negated)
                .count();
            pos >= neg
        })
    }

    #[test]
    fn polarity_orbits_preserve_mu_and_match_contributions() {
        use crate::counting::catalog::{ClauseCatalog, ClauseId};
        use crate::counting::evaluator::{evaluate, Accumulator, Verdict};
        use crate::counting::mask::AssignmentMask;
        use crate::counting::ranker::next_combination;
        use std::collections::{BTreeSet, HashMap};

        let (vars, literals, clauses) = (3_u32, 2_u32, 5_usize);
        let catalog = ClauseCatalog::new(vars, literals).unwrap();
        let listing = clause_list(vars, literals);
        let full = <u64 as AssignmentMask>::full(catalog.assignments());

        // Literal-set -> clause id, to map a flipped clause back to the
        // catalog.
        let id_of: HashMap<BTreeSet<(u32, bool)>, ClauseId> = listing
            .iter()
            .enumerate()
            .map(|(id, cl)| (cl.iter().copied().collect(), id as ClauseId))
            .collect();

        let flip = |ids: &[ClauseId], flipped_vars: u32| -> BTreeSet<ClauseId> {
            ids.iter()
                .map(|&id| {
                    let moved: BTreeSet<(u32, bool)> = listing[id as usize]
                        .iter()
                        .map(|&(var, negated)| {
                            if (flipped_vars >> var) & 1 == 1 {
                                (var, !negated)
                            } else {
                                (var, negated)
                            }
                        })
                        .collect();
                    id_of[&moved]
                })
                .collect()
        };

        // Unbalanced variables of a candidate: more positive than negative
        // occurrences (canonical candidates never have the reverse).
        let unbalanced_mask = |ids: &[ClauseId]| -> u32 {
            let mut mask = 0;
            for var in 0..vars {
                let pos = ids
                    .iter()
                    .flat_map(|&i| listing[i as usize].iter())
                    .filter(|&&(v, negated)| v == var && !negated)
                    .count();
                let neg = ids
                    .iter()
                    .flat_map(|&i| listing[i as usize].iter())
                    .filter(|&&(v, negated)| v == var && negated)
                    .count();
                if pos != neg {
                    mask |= 1 << var;
                }
            }
            mask
        };

        let mut ids: Vec<ClauseId> = (0..clauses as ClauseId).collect();
        let mut orbit_weight_total = 0_u64;
        loop {
            if let Verdict::Counted(weight) =
                evaluate(&catalog, full, &Accumulator::new(), &[], &ids, CountMode::MinUnsat)
            {
                // Every polarity flip of an MU formula is MU; flips over
                // subsets of the unbalanced variables yield exactly `weight`
                // distinct formulas, of which only the identity flip is
                // canonical.
                let unbalanced = unbalanced_mask(&ids);
                let mut orbit = BTreeSet::new();
                for flipped_vars in 0..1_u32 << vars {
                    let image = flip(&ids, flipped_vars);
                    let formula: Vec<&Clause> =
                        image.iter().map(|&i| &listing[i as usize]).collect();
                    assert!(
                        is_minimally_unsatisfiable(&formula, vars),
                        "flip {flipped_vars:#b} of {ids:?} lost minimal unsatisfiability"
                    );
                    if flipped_vars & !unbalanced == 0 {
                        if flipped_vars != 0 {
                            assert!(!is_canonical(&formula, vars), "flip {flipped_vars:#b}");
                        }
                        orbit.insert(image);
                    }
                }
                assert_eq!(orbit.len() as u64, weight, "orbit size of {ids:?}");
                orbit_weight_total += weight;
            }
            if !next_combination(&mut ids, catalog.clause_count()) {
                break;
            }
        }
        // The orbit weights of the canonical candidates add up to the full
        // labeled count.
        assert_eq!(orbit_weight_total, 36);
    }

    #[test]
    fn evaluator_agrees_with_direct_semantics_on_random_candidates() {
        use crate::counting::catalog::{ClauseCatalog, ClauseId};
        use crate::counting::evaluator::{evaluate, Accumulator, Verdict};
        use crate::counting::mask::AssignmentMask;
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(0x00c0_ffee);
        for (vars, literals, clauses) in [(4, 2, 6), (4, 3, 9), (5, 2, 7)] {
            let catalog = ClauseCatalog::new(vars, literals).unwrap();
            let listing = clause_list(vars, literals);
            let full = <u64 as AssignmentMask>::full(catalog.assignments());
            for _ in 0..300 {
                let mut pool: Vec<ClauseId> = (0..catalog.clause_count() as ClauseId).collect();
                for i in 0..clauses {
                    let j = rng.gen_range(i..pool.len());
                    pool.swap(i, j);
                }
                let mut ids = pool[..clauses].to_vec();
                ids.sort_unstable();

                let formula: Vec<&Clause> = ids.iter().map(|&i| &listing[i as usize]).collect();
                let mu = is_minimally_unsatisfiable(&formula, vars);
                let canonical = is_canonical(&formula, vars);
                let verdict =
                    evaluate(&catalog, full, &Accumulator::new(), &[], &ids, CountMode::MinUnsat);
                // The evaluator counts exactly the canonical MU candidates.
                assert_eq!(
                    matches!(verdict, Verdict::Counted(_)),
                    mu && canonical,
                    "v={vars}, l={literals}, ids={ids:?}"
                );
            }
        }
    }
}
