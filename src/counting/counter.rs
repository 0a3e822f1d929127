#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The counter capability: parameters, options, outcomes, and the engine
//! family behind one trait.
//!
//! Mirrors the structure of a configurable solver: a `Counter` trait with
//! `count` / `count_cancellable`, several concrete engines, and a
//! `CounterImpls` enum that dispatches to whichever the selection rule
//! picked. Callers configure a run, select, and count; they never name a
//! concrete engine.

use super::checkpoint::CHECKPOINT_DIR;
use super::error::{ConfigError, CountError, MAX_CLAUSES, MAX_VARS};
use super::evaluator::CountMode;
use super::orchestrator::{EnumerationEngine, ExactCoverEngine};
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

/// A validated parameter triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    /// Variable count `v`.
    pub vars: u32,
    /// Clause width `k` (the CLI calls it `l`).
    pub literals: u32,
    /// Clause count `c`.
    pub clauses: u32,
}

impl Params {
    /// Validates and constructs a parameter triple.
    ///
    /// # Errors
    ///
    /// `ConfigError` for any parameter outside the supported ranges or below
    /// the structural minimum clause count.
    pub fn new(vars: u32, literals: u32, clauses: u32) -> Result<Self, ConfigError> {
        if !(2..=3).contains(&literals) {
            return Err(ConfigError::UnsupportedLiteralCount { literals });
        }
        if vars < literals || vars > MAX_VARS {
            return Err(ConfigError::VariableCountOutOfRange { vars, literals });
        }
        if clauses > MAX_CLAUSES {
            return Err(ConfigError::ClauseCountTooLarge { clauses });
        }
        if literals == 2 && vars == 2 {
            // The sole two-variable family.
            if clauses != 4 {
                return Err(ConfigError::TwoVarsRequireFourClauses { clauses });
            }
            return Ok(Self { vars, literals, clauses });
        }
        let minimum = Self::structural_minimum(vars, literals);
        if clauses < minimum {
            return Err(ConfigError::ClauseCountTooSmall {
                clauses,
                minimum,
                vars,
                literals,
            });
        }
        Ok(Self { vars, literals, clauses })
    }

    /// Smallest admissible clause count for `(v, l)`.
    #[must_use]
    pub const fn structural_minimum(vars: u32, literals: u32) -> u32 {
        match (literals, vars) {
            (2, 2) => 4,
            (3, 3) => 8,
            (_, v) => v + 1,
        }
    }
}

/// Progress snapshot handed to the reporting callback between batches.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    /// Candidates processed so far.
    pub processed_units: u64,
    /// Total candidates of the run.
    pub total_units: u64,
    /// Contributions accumulated so far.
    pub partial_count: u64,
    /// Wall time spent, including time banked by resumed checkpoints.
    pub elapsed: Duration,
}

/// Progress reporting hook.
pub type ProgressCallback = Box<dyn Fn(&Progress) + Send + Sync>;

/// Knobs of a counting run.
pub struct RunOptions {
    /// Force the single-thread CPU engines.
    pub force_cpu: bool,
    /// Enable checkpoint persistence and resumption.
    pub checkpoints: bool,
    /// Directory for checkpoint documents.
    pub checkpoint_dir: PathBuf,
    /// Forced V3 prefix depth (2 or 3); `None` selects the default.
    pub prefix_len: Option<u32>,
    /// Chunks submitted per parallel region.
    pub batch_chunks: u64,
    /// Minimum delay between progress reports.
    pub progress_interval: Duration,
    /// Minimum delay between checkpoint writes.
    pub checkpoint_interval: Duration,
    /// Progress reporting hook.
    pub progress: Option<ProgressCallback>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            force_cpu: false,
            checkpoints: false,
            checkpoint_dir: PathBuf::from(CHECKPOINT_DIR),
            prefix_len: None,
            batch_chunks: 500_000,
            progress_interval: Duration::from_secs(5),
            checkpoint_interval: Duration::from_secs(30),
            progress: None,
        }
    }
}

impl fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOptions")
            .field("force_cpu", &self.force_cpu)
            .field("checkpoints", &self.checkpoints)
            .field("checkpoint_dir", &self.checkpoint_dir)
            .field("prefix_len", &self.prefix_len)
            .field("batch_chunks", &self.batch_chunks)
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}

/// Counters available behind the shared contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// Single-thread flat enumeration, one-word masks.
    CpuOptimized,
    /// Single-thread flat enumeration, multi-word masks. Checkpoints are
    /// observability-only: this engine restarts from zero.
    CpuManyVars,
    /// Parallel chunked flat enumeration ("V2").
    ParallelV2,
    /// Parallel prefix-pruned hybrid ("V3").
    PrefixHybridV3,
    /// Multi-word variant of V2/V3 for `v > 6`.
    ManyVarsHybrid,
    /// Disjointness-clique enumerator for 3-SAT with eight clauses.
    ExactCover,
}

impl EngineKind {
    /// Whether the engine can seek to a checkpointed position.
    #[must_use]
    pub const fn resumable(self) -> bool {
        matches!(self, Self::ParallelV2 | Self::PrefixHybridV3 | Self::ManyVarsHybrid)
    }

    /// Whether batches run on the rayon pool.
    #[must_use]
    pub const fn parallel(self) -> bool {
        matches!(self, Self::ParallelV2 | Self::PrefixHybridV3 | Self::ManyVarsHybrid)
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CpuOptimized => "cpu-optimized",
            Self::CpuManyVars => "cpu-many-vars",
            Self::ParallelV2 => "parallel-v2",
            Self::PrefixHybridV3 => "prefix-hybrid-v3",
            Self::ManyVarsHybrid => "many-vars-hybrid",
            Self::ExactCover => "exact-cover",
        };
        f.write_str(name)
    }
}

/// Run statistics, for regression tracking and `--benchmark` output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Candidates evaluated.
    pub tested: u64,
    /// Candidates rejected by the group-coverage byte alone.
    pub group_skipped: u64,
    /// Parallel regions submitted.
    pub batches: u64,
    /// Chunk index a resumed run continued from.
    pub resumed_from: Option<u64>,
    /// V3 prefixes surviving the host-side prunes.
    pub survivors: u64,
    /// V3 prefixes discarded by the host-side prunes.
    pub prefixes_pruned: u64,
}

/// Result of a completed (or cancelled) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountOutcome {
    /// The count; partial when `cancelled`.
    pub count: u64,
    /// Candidates processed.
    pub processed_units: u64,
    /// Candidates in the full run.
    pub total_units: u64,
    /// Wall time, including time banked before resumed checkpoints.
    pub elapsed: Duration,
    /// Whether the run stopped at the cancellation signal.
    pub cancelled: bool,
    /// The engine that produced the numbers.
    pub engine: EngineKind,
    /// Throughput and pruning statistics.
    pub stats: RunStats,
}

/// The counting capability.
pub trait Counter {
    /// Runs to completion or to the next cancellation window.
    ///
    /// # Errors
    ///
    /// `CountError` on invalid configuration, checkpoint corruption, or
    /// resource exhaustion. Cancellation is a successful outcome.
    fn count_cancellable(&mut self, cancel: &AtomicBool) -> Result<CountOutcome, CountError>;

    /// Runs to completion.
    ///
    /// # Errors
    ///
    /// See [`Counter::count_cancellable`].
    fn count(&mut self) -> Result<CountOutcome, CountError> {
        let cancel = AtomicBool::new(false);
        self.count_cancellable(&cancel)
    }
}

/// Selection rule mapping parameters onto an engine.
#[must_use]
pub const fn select_engine(params: &Params, force_cpu: bool) -> EngineKind {
    if params.literals == 3 && params.clauses == 8 {
        return EngineKind::ExactCover;
    }
    if force_cpu {
        return if params.vars <= 6 {
            EngineKind::CpuOptimized
        } else {
            EngineKind::CpuManyVars
        };
    }
    if params.vars > 6 {
        return EngineKind::ManyVarsHybrid;
    }
    if params.literals == 3 {
        return EngineKind::PrefixHybridV3;
    }
    EngineKind::ParallelV2
}

/// The selected counter, one variant per engine.
#[derive(Debug)]
pub enum CounterImpls {
    /// Single-thread flat enumeration over one-word masks.
    CpuOptimized(EnumerationEngine),
    /// Single-thread flat enumeration over multi-word masks.
    CpuManyVars(EnumerationEngine),
    /// Parallel chunked flat enumeration.
    ParallelV2(EnumerationEngine),
    /// Parallel prefix-pruned hybrid.
    PrefixHybridV3(EnumerationEngine),
    /// Multi-word parallel variant.
    ManyVarsHybrid(EnumerationEngine),
    /// The eight-clause 3-SAT special case.
    ExactCover(ExactCoverEngine),
}

/// Builds the counter for a validated parameter triple.
///
/// # Errors
///
/// `ConfigError` when a forced prefix depth is unusable for the clause
/// count.
pub fn select_counter(
    params: Params,
    options: RunOptions,
    mode: CountMode,
) -> Result<CounterImpls, CountError> {
    if let Some(p) = options.prefix_len {
        if !(p == 2 || p == 3) || p >= params.clauses {
            return Err(ConfigError::InvalidPrefixLength {
                prefix_len: p,
                clauses: params.clauses,
            }
            .into());
        }
    }

    let kind = select_engine(&params, options.force_cpu);
    Ok(match kind {
        EngineKind::ExactCover => CounterImpls::ExactCover(ExactCoverEngine::new(params, mode)),
        kind => {
            let engine = EnumerationEngine::new(params, options, mode, kind);
            match kind {
                EngineKind::CpuOptimized => CounterImpls::CpuOptimized(engine),
                EngineKind::CpuManyVars => CounterImpls::CpuManyVars(engine),
                EngineKind::ParallelV2 => CounterImpls::ParallelV2(engine),
                EngineKind::PrefixHybridV3 => CounterImpls::PrefixHybridV3(engine),
                _ => CounterImpls::ManyVarsHybrid(engine),
            }
        }
    })
}

impl Counter for CounterImpls {
    fn count_cancellable(&mut self, cancel: &AtomicBool) -> Result<CountOutcome, CountError> {
        match self {
            Self::CpuOptimized(e)
            | Self::CpuManyVars(e)
            | Self::ParallelV2(e)
            | Self::PrefixHybridV3(e)
            | Self::ManyVarsHybrid(e) => e.count_cancellable(cancel),
            Self::ExactCover(e) => e.count_cancellable(cancel),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_enforces_the_structural_minimums() {
        assert!(Params::new(2, 2, 4).is_ok());
        assert!(matches!(
            Params::new(2, 2, 5),
            Err(ConfigError::TwoVarsRequireFourClauses { clauses: 5 })
        ));
        assert!(matches!(
            Params::new(3, 2, 3),
            Err(ConfigError::ClauseCountTooSmall { minimum: 4, .. })
        ));
        assert!(matches!(
            Params::new(3, 3, 7),
            Err(ConfigError::ClauseCountTooSmall { minimum: 8, .. })
        ));
        assert!(Params::new(4, 3, 5).is_ok());
        assert!(matches!(
            Params::new(5, 2, 21),
            Err(ConfigError::ClauseCountTooLarge { clauses: 21 })
        ));
        assert!(matches!(
            Params::new(11, 2, 12),
            Err(ConfigError::VariableCountOutOfRange { .. })
        ));
        assert!(matches!(
            Params::new(4, 4, 5),
            Err(ConfigError::UnsupportedLiteralCount { literals: 4 })
        ));
    }

    #[test]
    fn selection_follows_the_table() {
        let p = |v, l, c| Params::new(v, l, c).unwrap();
        assert_eq!(select_engine(&p(5, 3, 8), false), EngineKind::ExactCover);
        assert_eq!(select_engine(&p(5, 3, 8), true), EngineKind::ExactCover);
        assert_eq!(select_engine(&p(5, 3, 11), false), EngineKind::PrefixHybridV3);
        assert_eq!(select_engine(&p(7, 3, 9), false), EngineKind::ManyVarsHybrid);
        assert_eq!(select_engine(&p(5, 2, 7), false), EngineKind::ParallelV2);
        assert_eq!(select_engine(&p(8, 2, 9), false), EngineKind::ManyVarsHybrid);
        assert_eq!(select_engine(&p(5, 2, 7), true), EngineKind::CpuOptimized);
        assert_eq!(select_engine(&p(8, 2, 9), true), EngineKind::CpuManyVars);
    }

    #[test]
    fn forced_prefix_depth_is_validated() {
        let params = Params::new(4, 3, 9).unwrap();
        let options = RunOptions {
            prefix_len: Some(4),
            ..RunOptions::default()
        };
        assert!(matches!(
            select_counter(params, options, CountMode::MinUnsat),
            Err(CountError::Config(ConfigError::InvalidPrefixLength { .. }))
        ));
    }
}
