#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Error types for the counting engine.
//!
//! Two categories exist: `ConfigError` for user-facing parameter problems
//! (fatal, no count produced) and `CountError` for everything the engine can
//! report, including resource exhaustion during catalog or prefix-table
//! construction. Cancellation is not an error; a cancelled run returns a
//! successful outcome with its `cancelled` flag set.

use std::path::PathBuf;
use thiserror::Error;

/// Highest supported variable count.
pub const MAX_VARS: u32 = 10;

/// Engine capacity for the clause count. The packed 5-bit polarity fields
/// tolerate up to 31 occurrences per variable; the engine stops well short.
pub const MAX_CLAUSES: u32 = 20;

/// A fatal configuration problem. No partial result is produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The clause width is not 2 or 3.
    #[error("unsupported literal count {literals}: only 2-SAT and 3-SAT are supported")]
    UnsupportedLiteralCount {
        /// The rejected clause width.
        literals: u32,
    },

    /// The variable count is outside `literals..=10`.
    #[error("variable count {vars} out of range for {literals}-SAT (expected {literals}..={MAX_VARS})")]
    VariableCountOutOfRange {
        /// The rejected variable count.
        vars: u32,
        /// The clause width of the run.
        literals: u32,
    },

    /// The clause count is below the structural minimum for the parameters.
    #[error("clause count {clauses} below the structural minimum {minimum} for v={vars}, l={literals}")]
    ClauseCountTooSmall {
        /// The rejected clause count.
        clauses: u32,
        /// The structural minimum for `(vars, literals)`.
        minimum: u32,
        /// The variable count of the run.
        vars: u32,
        /// The clause width of the run.
        literals: u32,
    },

    /// 2-SAT over two variables admits exactly one clause count.
    #[error("2-SAT over 2 variables admits only c=4 (got c={clauses})")]
    TwoVarsRequireFourClauses {
        /// The rejected clause count.
        clauses: u32,
    },

    /// The clause count exceeds the engine capacity.
    #[error("clause count {clauses} exceeds the engine capacity of {MAX_CLAUSES}")]
    ClauseCountTooLarge {
        /// The rejected clause count.
        clauses: u32,
    },

    /// A forced prefix depth outside the supported range, or one that does
    /// not leave room for a suffix.
    #[error("prefix depth {prefix_len} is not usable for c={clauses} (supported: 2 or 3, below c)")]
    InvalidPrefixLength {
        /// The rejected prefix depth.
        prefix_len: u32,
        /// The clause count of the run.
        clauses: u32,
    },

    /// A checkpoint file exists but cannot be parsed.
    #[error("checkpoint {path} is corrupt: {reason}")]
    CorruptCheckpoint {
        /// Path of the offending file.
        path: PathBuf,
        /// Parser diagnostic.
        reason: String,
    },

    /// The brute-force reference was asked for a parameter set it cannot
    /// enumerate in reasonable time.
    #[error("parameters v={vars}, l={literals}, c={clauses} are too large for the brute-force reference")]
    ReferenceOutOfScope {
        /// The rejected variable count.
        vars: u32,
        /// The clause width of the run.
        literals: u32,
        /// The rejected clause count.
        clauses: u32,
    },
}

/// Any failure the counting engine can report.
#[derive(Debug, Error)]
pub enum CountError {
    /// Invalid parameters or checkpoint state.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Allocation failure while building the catalog or prefix-state table.
    /// The orchestrator propagates this without retrying.
    #[error("resource exhaustion while building {what}: {source}")]
    Resource {
        /// Which table failed to allocate.
        what: &'static str,
        /// The underlying allocation error.
        #[source]
        source: std::collections::TryReserveError,
    },

    /// Checkpoint file I/O failed.
    #[error("checkpoint I/O failed")]
    CheckpointIo(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_messages_name_the_offender() {
        let err = ConfigError::UnsupportedLiteralCount { literals: 4 };
        assert!(err.to_string().contains('4'));

        let err = ConfigError::ClauseCountTooSmall {
            clauses: 4,
            minimum: 8,
            vars: 3,
            literals: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("minimum 8"));
        assert!(msg.contains("v=3"));
    }
}
