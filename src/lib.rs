#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![warn(missing_docs)]
//! Exhaustive counting of minimally unsatisfiable k-CNF formulas.
//!
//! A formula over `v` labeled Boolean variables with `c` distinct clauses
//! of `k` literals each is counted when it is unsatisfiable, every clause
//! is necessary, and every variable appears. The crate provides the
//! bitmask enumeration engine (flat, prefix-pruned hybrid, exact-cover, and
//! multi-word variants behind one `Counter` contract), the independent
//! closed-form evaluator for 2-SAT, and the command-line verbs built on
//! both.

/// Argument parsing and runners for the `minunsat`, `formula`, and `unsat`
/// binaries.
pub mod command_line;

/// The enumeration engine: catalog, ranker, evaluator, dispatchers,
/// orchestration, and checkpoints.
pub mod counting;

/// The closed-form 2-SAT evaluator used to cross-check the engine.
pub mod formula;
