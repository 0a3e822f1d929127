#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Closed-form evaluation of the 2-SAT count.
//!
//! Every minimally unsatisfiable 2-CNF formula decomposes into `d = c - v`
//! pairwise-crossing "chords" in its implication cycle: `t` of the
//! variables occur in both polarities and form the chords (spine-linked
//! runs of them act as one merged chord), while the remaining `v - t`
//! single-polarity variables decorate the `2d` gaps between chord
//! endpoints. Counting the labeled structures per stratum `t` and dividing
//! by the symmetry of the cyclic arrangement gives, for `1 <= d <= v`:
//!
//! ```text
//! f(v, c) = (1 / m(d)) * sum_{t=d}^{v}  C(v,t) * t! * C(t-1, d-1) * 2^v * P(v-t, d)
//!
//! P(u, 1) = u! * (u - 1)          (two gaps, both nonempty; 0 when u = 0)
//! P(u, g) = u! * C(u + 2g - 1, 2g - 1)   for g >= 2
//! m(1) = 8,   m(d) = 4d           for d >= 2
//! ```
//!
//! The Burnside coefficient `m(d)` absorbs the rotation and mirror
//! symmetries of the cycle together with the polarity flips of fork
//! helpers. The formula is exact: it reproduces the brute-force counts for
//! every `v <= 4` and the full verification table below, and it is the
//! independent cross-check for the enumeration engine.
//!
//! Everything here is plain arithmetic over big integers; the enumeration
//! engine shares no code with it.

use crate::counting::error::{ConfigError, MAX_CLAUSES, MAX_VARS};
use num_bigint::BigUint;
use num_traits::{One, Zero};

/// The known-value table: `(v, c, expected)` for every verified triple.
/// These values must remain exact across engine changes.
pub const VERIFICATION_TABLE: [(u32, u32, u64); 18] = [
    (3, 4, 6),
    (3, 5, 36),
    (3, 6, 4),
    (4, 5, 144),
    (4, 6, 1008),
    (4, 7, 288),
    (4, 8, 24),
    (5, 6, 2880),
    (5, 7, 26_880),
    (5, 8, 14_400),
    (5, 9, 2880),
    (5, 10, 192),
    (6, 7, 57_600),
    (6, 8, 725_760),
    (6, 9, 633_600),
    (6, 10, 224_640),
    (6, 11, 34_560),
    (6, 12, 1920),
];

/// `n!` as a big integer.
#[must_use]
pub fn factorial(n: u64) -> BigUint {
    let mut out = BigUint::one();
    for i in 2..=n {
        out *= i;
    }
    out
}

/// `C(n, r)` as a big integer; zero when `r > n`.
#[must_use]
pub fn binomial(n: u64, r: u64) -> BigUint {
    if r > n {
        return BigUint::zero();
    }
    let r = r.min(n - r);
    let mut out = BigUint::one();
    for i in 0..r {
        out = out * (n - i) / (i + 1);
    }
    out
}

/// Ways to distribute `u` labeled single-polarity variables into the gaps
/// of a `g`-chord cycle, order within each gap significant.
fn gap_arrangements(u: u64, g: u64) -> BigUint {
    if g == 1 {
        // Two gaps, both between a chord endpoint and its complement, and
        // both must be nonempty to keep complementary literals apart.
        if u == 0 {
            return BigUint::zero();
        }
        factorial(u) * (u - 1)
    } else {
        factorial(u) * binomial(u + 2 * g - 1, 2 * g - 1)
    }
}

/// Burnside coefficient of the diagonal: cycle symmetries identified per
/// labeled structure.
const fn burnside(d: u64) -> u64 {
    if d == 1 {
        8
    } else {
        4 * d
    }
}

/// One stratum of the closed-form sum: labeled structures with exactly `t`
/// doubled variables, already divided by the Burnside coefficient.
#[must_use]
pub fn stratum(v: u32, d: u32, t: u32) -> BigUint {
    let (v, d, t) = (u64::from(v), u64::from(d), u64::from(t));
    let raw = binomial(v, t)
        * factorial(t)
        * binomial(t - 1, d - 1)
        * BigUint::from(2_u64).pow(v as u32)
        * gap_arrangements(v - t, d);
    let m = burnside(d);
    debug_assert!((raw.clone() % m).is_zero());
    raw / m
}

/// The number of minimally unsatisfiable 2-CNF formulas over `v` labeled
/// variables with exactly `c` distinct clauses, every variable used.
///
/// # Errors
///
/// `ConfigError` for parameters outside the supported ranges (same policy
/// as the enumeration engine).
pub fn mu_two_sat(vars: u32, clauses: u32) -> Result<BigUint, ConfigError> {
    if vars < 2 || vars > MAX_VARS {
        return Err(ConfigError::VariableCountOutOfRange { vars, literals: 2 });
    }
    if clauses > MAX_CLAUSES {
        return Err(ConfigError::ClauseCountTooLarge { clauses });
    }
    if vars == 2 {
        if clauses != 4 {
            return Err(ConfigError::TwoVarsRequireFourClauses { clauses });
        }
    } else if clauses < vars + 1 {
        return Err(ConfigError::ClauseCountTooSmall {
            clauses,
            minimum: vars + 1,
            vars,
            literals: 2,
        });
    }

    if clauses > 2 * vars {
        // Diagonals run 1..=v; beyond them no formula exists.
        return Ok(BigUint::zero());
    }
    let d = clauses - vars;
    let mut total = BigUint::zero();
    for t in d..=vars {
        total += stratum(vars, d, t);
    }
    Ok(total)
}

/// The per-stratum decomposition `(t, count)` of a diagonal, for the `-d`
/// reporting flag.
///
/// # Errors
///
/// Same validation as [`mu_two_sat`].
pub fn diagonal_breakdown(vars: u32, clauses: u32) -> Result<Vec<(u32, BigUint)>, ConfigError> {
    mu_two_sat(vars, clauses)?;
    if clauses > 2 * vars {
        return Ok(Vec::new());
    }
    let d = clauses - vars;
    Ok((d..=vars).map(|t| (t, stratum(vars, d, t))).collect())
}

/// Checks the closed form against every entry of the verification table.
/// Returns the failures; empty means all 18 triples are exact.
#[must_use]
pub fn verify_table() -> Vec<(u32, u32, u64, BigUint)> {
    VERIFICATION_TABLE
        .iter()
        .filter_map(|&(v, c, expected)| {
            let got = mu_two_sat(v, c).ok()?;
            (got != BigUint::from(expected)).then_some((v, c, expected, got))
        })
        .collect()
}
