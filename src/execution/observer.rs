use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::transformers::TransformerId;

/// Why a stage did not run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The stage config has `disabled: true`.
    Disabled,
}

/// Execution events emitted by a [`super::Pipeline`].
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        stages: usize,
        frames_in: usize,
    },
    StageStarted {
        index: usize,
        id: TransformerId,
    },
    StageSkipped {
        index: usize,
        id: String,
        reason: SkipReason,
    },
    /// The stage config could not be decoded; the stage passed its input through.
    StageFailed {
        index: usize,
        id: String,
        message: String,
    },
    StageFinished {
        index: usize,
        id: TransformerId,
        frames_out: usize,
        elapsed: Duration,
    },
    RunFinished {
        elapsed: Duration,
        metrics: ExecutionMetricsSnapshot,
    },
}

/// Observer hook for execution events.
pub trait ExecutionObserver: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent);
}

/// Forwards execution events to `tracing`.
#[derive(Debug, Default)]
pub struct TracingExecutionObserver;

impl ExecutionObserver for TracingExecutionObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::RunStarted { stages, frames_in } => {
                debug!(stages, frames_in, "pipeline run started");
            }
            ExecutionEvent::StageStarted { index, id } => debug!(index, %id, "stage started"),
            ExecutionEvent::StageSkipped { index, id, reason } => {
                debug!(index, id = %id, ?reason, "stage skipped");
            }
            ExecutionEvent::StageFailed { index, id, message } => {
                warn!(index, id = %id, message = %message, "stage passed input through");
            }
            ExecutionEvent::StageFinished {
                index,
                id,
                frames_out,
                elapsed,
            } => debug!(index, %id, frames_out, ?elapsed, "stage finished"),
            ExecutionEvent::RunFinished { elapsed, metrics } => {
                info!(?elapsed, %metrics, "pipeline run finished");
            }
        }
    }
}

/// An observer that fans out events to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn ExecutionObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn ExecutionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl ExecutionObserver for CompositeObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}

/// Real-time counters for a pipeline.
///
/// Counters accumulate over every run of the pipeline, including runs executing concurrently on
/// different batches; callers can snapshot them at any time.
#[derive(Debug, Default)]
pub struct ExecutionMetrics {
    runs_started: AtomicU64,
    runs_finished: AtomicU64,
    stages_applied: AtomicU64,
    stages_skipped: AtomicU64,
    stages_failed: AtomicU64,
    frames_in: AtomicU64,
    frames_out: AtomicU64,
    elapsed_ns: AtomicU64,

    active_runs: AtomicUsize,
    max_active_runs: AtomicUsize,
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_run(&self, frames_in: usize) {
        let _ = self.runs_started.fetch_add(1, Ordering::SeqCst);
        let _ = self.frames_in.fetch_add(frames_in as u64, Ordering::SeqCst);
        let now = self.active_runs.fetch_add(1, Ordering::SeqCst) + 1;
        update_max_usize(&self.max_active_runs, now);
    }

    pub fn end_run(&self, frames_out: usize, elapsed: Duration) {
        let _ = self.runs_finished.fetch_add(1, Ordering::SeqCst);
        let _ = self.frames_out.fetch_add(frames_out as u64, Ordering::SeqCst);
        let add = elapsed.as_nanos().min(u64::MAX as u128) as u64;
        let _ = self.elapsed_ns.fetch_add(add, Ordering::SeqCst);
        let _ = self.active_runs.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn on_stage_applied(&self) {
        let _ = self.stages_applied.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_stage_skipped(&self) {
        let _ = self.stages_skipped.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_stage_failed(&self) {
        let _ = self.stages_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ExecutionMetricsSnapshot {
        ExecutionMetricsSnapshot {
            runs_started: self.runs_started.load(Ordering::SeqCst),
            runs_finished: self.runs_finished.load(Ordering::SeqCst),
            stages_applied: self.stages_applied.load(Ordering::SeqCst),
            stages_skipped: self.stages_skipped.load(Ordering::SeqCst),
            stages_failed: self.stages_failed.load(Ordering::SeqCst),
            frames_in: self.frames_in.load(Ordering::SeqCst),
            frames_out: self.frames_out.load(Ordering::SeqCst),
            total_elapsed: Duration::from_nanos(self.elapsed_ns.load(Ordering::SeqCst)),
            max_active_runs: self.max_active_runs.load(Ordering::SeqCst),
        }
    }
}

fn update_max_usize(dst: &AtomicUsize, now: usize) {
    loop {
        let cur = dst.load(Ordering::SeqCst);
        if now <= cur {
            break;
        }
        if dst
            .compare_exchange(cur, now, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            break;
        }
    }
}

/// Immutable snapshot of [`ExecutionMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMetricsSnapshot {
    pub runs_started: u64,
    pub runs_finished: u64,
    pub stages_applied: u64,
    pub stages_skipped: u64,
    pub stages_failed: u64,
    pub frames_in: u64,
    pub frames_out: u64,
    pub total_elapsed: Duration,
    pub max_active_runs: usize,
}

impl fmt::Display for ExecutionMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "runs={}/{}, stages applied={} skipped={} failed={}, frames in={} out={}, max_active_runs={}, total_elapsed={:?}",
            self.runs_finished,
            self.runs_started,
            self.stages_applied,
            self.stages_skipped,
            self.stages_failed,
            self.frames_in,
            self.frames_out,
            self.max_active_runs,
            self.total_elapsed
        )
    }
}
