#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The run loop shared by every chunked engine.
//!
//! One batch is one parallel region of at most `batch_chunks` chunk ids;
//! between batches the host drains the partial sum, reports progress when
//! five seconds have passed, writes a checkpoint when thirty have, and polls
//! the cancellation flag. A batch in flight when cancellation arrives is
//! always completed and included, so `partial_count` and `processed_units`
//! stay mutually consistent.
//!
//! The single-thread CPU engines run the identical loop without the rayon
//! region; their checkpoints are observability-only and a resumed run
//! restarts from zero, visibly.

use super::catalog::ClauseCatalog;
use super::checkpoint::CheckpointStore;
use super::counter::{
    CountOutcome, Counter, EngineKind, Params, Progress, RunOptions, RunStats,
};
use super::error::CountError;
use super::evaluator::CountMode;
use super::exact_cover::count_exact_cover;
use super::flat::{ChunkOutcome, FlatJob, CHUNK_SIZE};
use super::groups::build_group_cover;
use super::hybrid::{build_plan, default_prefix_len, HybridJob, HybridPlan};
use super::mask::{AssignmentMask, WideMask};
use super::ranker::BinomialTable;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// A chunk-dispatching engine bound to one parameter triple.
#[derive(Debug)]
pub struct EnumerationEngine {
    params: Params,
    options: RunOptions,
    mode: CountMode,
    kind: EngineKind,
}

impl EnumerationEngine {
    pub(crate) fn new(
        params: Params,
        options: RunOptions,
        mode: CountMode,
        kind: EngineKind,
    ) -> Self {
        Self {
            params,
            options,
            mode,
            kind,
        }
    }

    fn run<M: AssignmentMask>(&self, cancel: &AtomicBool) -> Result<CountOutcome, CountError> {
        let params = self.params;
        let mut catalog = ClauseCatalog::new(params.vars, params.literals)?;
        let clauses = params.clauses as usize;

        let mut use_hybrid = matches!(self.kind, EngineKind::PrefixHybridV3)
            || (matches!(self.kind, EngineKind::ManyVarsHybrid) && params.literals == 3);

        if params.literals == 3 {
            match build_group_cover(&catalog) {
                Some(selection) => {
                    debug!(
                        groups = selection.assignments.len(),
                        "pruning oracle installed"
                    );
                    catalog.set_group_cover(selection.bytes);
                }
                None => {
                    warn!("pruning oracle selected no groups; falling back to flat enumeration");
                    use_hybrid = false;
                }
            }
        }

        if clauses > catalog.clause_count() {
            // More clauses than clause types exist: the count is zero and
            // there is no work to dispatch.
            return Ok(CountOutcome {
                count: 0,
                processed_units: 0,
                total_units: 0,
                elapsed: Duration::ZERO,
                cancelled: false,
                engine: self.kind,
                stats: RunStats::default(),
            });
        }

        let table = BinomialTable::new(catalog.clause_count(), clauses);

        if use_hybrid {
            let prefix_len = self
                .options
                .prefix_len
                .unwrap_or_else(|| default_prefix_len(params.clauses))
                as usize;
            let plan: HybridPlan<M> =
                build_plan(&catalog, &table, clauses, prefix_len, self.mode)?;
            info!(
                survivors = plan.survivors(),
                pruned = plan.prefixes_pruned,
                chunks = plan.total_chunks(),
                "prefix plan built"
            );
            let mut stats = RunStats {
                survivors: plan.survivors() as u64,
                prefixes_pruned: plan.prefixes_pruned,
                ..RunStats::default()
            };
            let job = HybridJob::new(&catalog, &table, &plan, self.mode);
            self.drive(
                cancel,
                plan.total_chunks(),
                plan.total_candidates(),
                &mut stats,
                |g| job.process_chunk(g),
            )
        } else {
            let job: FlatJob<'_, M> = FlatJob::new(&catalog, &table, clauses, self.mode);
            let mut stats = RunStats::default();
            self.drive(
                cancel,
                job.total_chunks(),
                job.total_combinations(),
                &mut stats,
                |g| job.process_chunk(g),
            )
        }
    }

    /// The batch loop. `process` must be safe to call for any chunk id below
    /// `total_chunks`, from any worker.
    fn drive<F>(
        &self,
        cancel: &AtomicBool,
        total_chunks: u64,
        total_units: u64,
        stats: &mut RunStats,
        process: F,
    ) -> Result<CountOutcome, CountError>
    where
        F: Fn(u64) -> ChunkOutcome + Sync,
    {
        let params = self.params;
        let options = &self.options;
        let parallel = self.kind.parallel();
        let resumable = self.kind.resumable();

        let store = options.checkpoints.then(|| {
            CheckpointStore::new(
                &options.checkpoint_dir,
                params.vars,
                params.literals,
                params.clauses,
            )
        });

        let mut acc = ChunkOutcome::default();
        let mut banked = Duration::ZERO;
        let mut start_chunk = 0_u64;
        // Resumable engines persist chunk indices; the sequential CPU
        // engines persist candidate counts (observability only).
        let load_limit = if resumable { total_chunks } else { total_units };
        if let Some(store) = &store {
            if let Some(doc) = store.load(load_limit)? {
                if resumable {
                    info!(
                        processed = doc.processed_units,
                        partial = doc.partial_count,
                        "resuming from checkpoint"
                    );
                    start_chunk = doc.processed_units;
                    acc.contribution = doc.partial_count;
                    banked = Duration::from_millis(doc.elapsed_ms_before_checkpoint);
                    stats.resumed_from = Some(doc.processed_units);
                } else {
                    warn!(
                        engine = %self.kind,
                        "checkpoint found, but this engine cannot resume; restarting from zero"
                    );
                }
            }
        }

        let started = Instant::now();
        let mut last_progress = Instant::now();
        let mut last_checkpoint = Instant::now();
        let mut next = start_chunk;
        let mut cancelled = false;

        while next < total_chunks {
            let end = total_chunks.min(next + options.batch_chunks.max(1));
            let batch = if parallel {
                (next..end)
                    .into_par_iter()
                    .map(&process)
                    .reduce(ChunkOutcome::default, ChunkOutcome::merge)
            } else {
                (next..end).map(&process).fold(ChunkOutcome::default(), ChunkOutcome::merge)
            };
            acc = acc.merge(batch);
            next = end;
            stats.batches += 1;

            let elapsed = banked + started.elapsed();
            let processed_units = total_units.min(next.saturating_mul(CHUNK_SIZE));
            if last_progress.elapsed() >= options.progress_interval {
                last_progress = Instant::now();
                info!(
                    processed = processed_units,
                    total = total_units,
                    partial = acc.contribution,
                    "progress"
                );
                if let Some(callback) = &options.progress {
                    callback(&Progress {
                        processed_units,
                        total_units,
                        partial_count: acc.contribution,
                        elapsed,
                    });
                }
            }
            if let Some(store) = &store {
                if next < total_chunks && last_checkpoint.elapsed() >= options.checkpoint_interval
                {
                    last_checkpoint = Instant::now();
                    let units = if resumable { next } else { processed_units };
                    store.save(units, acc.contribution, elapsed.as_millis() as u64)?;
                }
            }
            if cancel.load(Ordering::Relaxed) {
                cancelled = true;
                break;
            }
        }

        let elapsed = banked + started.elapsed();
        if let Some(store) = &store {
            if cancelled {
                let units = if resumable {
                    next
                } else {
                    total_units.min(next.saturating_mul(CHUNK_SIZE))
                };
                store.save(units, acc.contribution, elapsed.as_millis() as u64)?;
            } else {
                store.delete()?;
            }
        }

        stats.tested += acc.tested;
        stats.group_skipped += acc.group_skipped;
        Ok(CountOutcome {
            count: acc.contribution,
            processed_units: total_units.min(next.saturating_mul(CHUNK_SIZE)),
            total_units,
            elapsed,
            cancelled,
            engine: self.kind,
            stats: *stats,
        })
    }
}

impl Counter for EnumerationEngine {
    fn count_cancellable(&mut self, cancel: &AtomicBool) -> Result<CountOutcome, CountError> {
        match (1_usize << self.params.vars).div_ceil(64) {
            1 => self.run::<u64>(cancel),
            2 => self.run::<WideMask<2>>(cancel),
            4 => self.run::<WideMask<4>>(cancel),
            8 => self.run::<WideMask<8>>(cancel),
            _ => self.run::<WideMask<16>>(cancel),
        }
    }
}

/// The eight-clause 3-SAT special case. Completes in one region, so the
/// cancellation flag is only honored before the work starts.
#[derive(Debug)]
pub struct ExactCoverEngine {
    params: Params,
    mode: CountMode,
}

impl ExactCoverEngine {
    pub(crate) const fn new(params: Params, mode: CountMode) -> Self {
        Self { params, mode }
    }
}

impl Counter for ExactCoverEngine {
    fn count_cancellable(&mut self, cancel: &AtomicBool) -> Result<CountOutcome, CountError> {
        let catalog = ClauseCatalog::new(self.params.vars, self.params.literals)?;
        let started = Instant::now();
        if cancel.load(Ordering::Relaxed) {
            return Ok(CountOutcome {
                count: 0,
                processed_units: 0,
                total_units: 0,
                elapsed: Duration::ZERO,
                cancelled: true,
                engine: EngineKind::ExactCover,
                stats: RunStats::default(),
            });
        }
        let out = count_exact_cover(&catalog, self.mode);
        Ok(CountOutcome {
            count: out.contribution,
            processed_units: out.tested,
            total_units: out.tested,
            elapsed: started.elapsed(),
            cancelled: false,
            engine: EngineKind::ExactCover,
            stats: RunStats {
                tested: out.tested,
                batches: 1,
                ..RunStats::default()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counting::counter::select_counter;
    use std::sync::atomic::AtomicU64;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn count(v: u32, l: u32, c: u32, mode: CountMode, options: RunOptions) -> CountOutcome {
        let params = Params::new(v, l, c).unwrap();
        let mut counter = select_counter(params, options, mode).unwrap();
        counter.count().unwrap()
    }

    fn mu(v: u32, l: u32, c: u32) -> u64 {
        count(v, l, c, CountMode::MinUnsat, RunOptions::default()).count
    }

    fn unsat(v: u32, l: u32, c: u32) -> u64 {
        count(v, l, c, CountMode::Unsat, RunOptions::default()).count
    }

    #[test]
    fn end_to_end_two_sat_counts() {
        assert_eq!(mu(2, 2, 4), 1);
        assert_eq!(mu(3, 2, 4), 6);
        assert_eq!(mu(3, 2, 5), 36);
        assert_eq!(mu(3, 2, 6), 4);
        assert_eq!(mu(4, 2, 5), 144);
        assert_eq!(mu(4, 2, 6), 1008);
        assert_eq!(mu(4, 2, 7), 288);
        assert_eq!(mu(4, 2, 8), 24);
    }

    #[test]
    fn end_to_end_three_sat_counts() {
        assert_eq!(mu(3, 3, 8), 1);
        assert_eq!(mu(4, 3, 8), 268);
    }

    #[test]
    fn end_to_end_unsat_counts() {
        assert_eq!(unsat(2, 2, 4), 1);
        assert_eq!(unsat(3, 2, 4), 9);
        assert_eq!(unsat(3, 2, 5), 108);
        assert_eq!(unsat(3, 2, 6), 352);
        assert_eq!(unsat(4, 2, 5), 888);
        assert_eq!(unsat(3, 3, 8), 1);
        assert_eq!(unsat(4, 3, 8), 272);
    }

    #[test]
    fn mu_is_bounded_by_unsat_with_equality_at_the_minimum() {
        assert_eq!(mu(2, 2, 4), unsat(2, 2, 4));
        assert_eq!(mu(3, 3, 8), unsat(3, 3, 8));
        assert!(mu(3, 2, 5) < unsat(3, 2, 5));
        assert!(mu(4, 2, 6) < unsat(4, 2, 6));
    }

    #[test]
    fn forced_cpu_engine_agrees_with_the_parallel_one() {
        let cpu = RunOptions {
            force_cpu: true,
            ..RunOptions::default()
        };
        let out = count(4, 2, 6, CountMode::MinUnsat, cpu);
        assert_eq!(out.count, 1008);
        assert_eq!(out.engine, EngineKind::CpuOptimized);
    }

    #[test]
    fn clause_count_beyond_the_catalog_yields_zero() {
        // v=4, k=3 has T=32 clause types; c=20 combinations of them exist,
        // but v=3, k=3 has only 8, so c=9 over v=3 is vacuously zero.
        let out = count(3, 3, 9, CountMode::MinUnsat, RunOptions::default());
        assert_eq!(out.count, 0);
        assert_eq!(out.total_units, 0);
    }

    #[test]
    fn outcome_accounts_for_every_candidate() {
        let out = count(4, 2, 6, CountMode::MinUnsat, RunOptions::default());
        assert_eq!(out.processed_units, out.total_units);
        assert_eq!(out.stats.tested, out.total_units);
        assert!(!out.cancelled);
        assert_eq!(out.engine, EngineKind::ParallelV2);
    }

    #[test]
    fn cancellation_returns_a_consistent_partial_answer() {
        let cancel = Arc::new(AtomicBool::new(false));
        let seen = Arc::new(AtomicU64::new(0));
        let options = RunOptions {
            batch_chunks: 1,
            progress_interval: Duration::ZERO,
            progress: Some({
                let cancel = Arc::clone(&cancel);
                let seen = Arc::clone(&seen);
                Box::new(move |p: &Progress| {
                    seen.store(p.processed_units, Ordering::Relaxed);
                    if p.processed_units >= 2048 {
                        cancel.store(true, Ordering::Relaxed);
                    }
                })
            }),
            ..RunOptions::default()
        };
        let params = Params::new(4, 2, 6).unwrap();
        let mut counter = select_counter(params, options, CountMode::MinUnsat).unwrap();
        let out = counter.count_cancellable(&cancel).unwrap();
        assert!(out.cancelled);
        assert!(out.processed_units < out.total_units);
        // The partial count sums exactly the chunks that completed.
        assert_eq!(out.stats.tested, out.processed_units);
    }

    #[test]
    fn checkpoint_interrupt_and_resume_reach_the_full_count() {
        let dir = tempdir().unwrap();
        let params = Params::new(4, 2, 6).unwrap();
        let cancel = Arc::new(AtomicBool::new(false));
        let options = RunOptions {
            checkpoints: true,
            checkpoint_dir: dir.path().to_path_buf(),
            batch_chunks: 1,
            progress_interval: Duration::ZERO,
            checkpoint_interval: Duration::ZERO,
            progress: Some({
                let cancel = Arc::clone(&cancel);
                Box::new(move |p: &Progress| {
                    if p.processed_units >= 40 * 1024 {
                        cancel.store(true, Ordering::Relaxed);
                    }
                })
            }),
            ..RunOptions::default()
        };
        let mut counter = select_counter(params, options, CountMode::MinUnsat).unwrap();
        let first = counter.count_cancellable(&cancel).unwrap();
        assert!(first.cancelled);
        assert!(first.processed_units < first.total_units);

        let resume_options = RunOptions {
            checkpoints: true,
            checkpoint_dir: dir.path().to_path_buf(),
            ..RunOptions::default()
        };
        let mut counter = select_counter(params, resume_options, CountMode::MinUnsat).unwrap();
        let second = counter.count().unwrap();
        assert!(!second.cancelled);
        assert_eq!(second.count, 1008);
        assert!(second.stats.resumed_from.is_some());
        // The checkpoint is gone after a completed run.
        let store = CheckpointStore::new(dir.path(), 4, 2, 6);
        assert!(store.load(u64::MAX).unwrap().is_none());
    }

    #[test]
    fn corrupt_checkpoint_is_a_config_error() {
        use crate::counting::error::ConfigError;
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("checkpoint_v4_l2_c6.json"), "{ bogus").unwrap();
        let params = Params::new(4, 2, 6).unwrap();
        let options = RunOptions {
            checkpoints: true,
            checkpoint_dir: dir.path().to_path_buf(),
            ..RunOptions::default()
        };
        let mut counter = select_counter(params, options, CountMode::MinUnsat).unwrap();
        assert!(matches!(
            counter.count(),
            Err(CountError::Config(ConfigError::CorruptCheckpoint { .. }))
        ));
    }

    #[test]
    fn checkpoint_for_a_different_triple_is_ignored() {
        let dir = tempdir().unwrap();
        // A valid checkpoint document for other parameters at this run's
        // path: it must be ignored, and the run must complete normally.
        let stray = CheckpointStore::new(dir.path(), 5, 2, 7);
        stray.save(10, 3, 0).unwrap();
        std::fs::rename(
            stray.path(),
            dir.path().join("checkpoint_v4_l2_c6.json"),
        )
        .unwrap();

        let params = Params::new(4, 2, 6).unwrap();
        let options = RunOptions {
            checkpoints: true,
            checkpoint_dir: dir.path().to_path_buf(),
            ..RunOptions::default()
        };
        let mut counter = select_counter(params, options, CountMode::MinUnsat).unwrap();
        let out = counter.count().unwrap();
        assert_eq!(out.count, 1008);
        assert!(out.stats.resumed_from.is_none());
    }

    #[test]
    #[ignore = "minutes of work in debug builds; run with --release"]
    fn large_reference_counts() {
        assert_eq!(mu(5, 2, 7), 26880);
        assert_eq!(mu(6, 2, 8), 725_760);
        assert_eq!(mu(4, 3, 9), 9408);
        assert_eq!(mu(4, 3, 10), 29_792);
        assert_eq!(mu(7, 2, 8), 1_209_600);
    }

    #[test]
    #[ignore = "hours of work; the published value for v=5 3-SAT"]
    fn five_variable_three_sat() {
        assert_eq!(mu(5, 3, 11), 258_380_800);
    }
}
