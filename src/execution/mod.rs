//! Pipeline runner: chains transformer stages and reports progress.
//!
//! This module sits "above" [`crate::transformers`] and provides:
//!
//! - Stage decoding with pass-through for disabled or undecodable stages
//! - A lazy adaptor over a stream of frame batches
//! - Parallel execution of independent batches on a rayon pool
//! - Real-time metrics + observer hooks for monitoring
//!
//! A pipeline never fails while running. Configuration problems are reported once when the
//! pipeline is built (and again as [`ExecutionEvent::StageFailed`] on every run); use
//! [`Pipeline::try_new`] to reject them instead.

mod observer;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, warn};

use crate::error::FrameResult;
use crate::transformers::{TransformContext, Transformer, TransformerConfig};
use crate::types::DataFrame;

pub use observer::{
    CompositeObserver, ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver, SkipReason,
    TracingExecutionObserver,
};

/// Configuration for a [`Pipeline`].
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Worker threads used by [`Pipeline::apply_batches`].
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Template variables (names without `$`) available to stage options.
    pub variables: HashMap<String, String>,
}

#[derive(Debug)]
enum StageKind {
    Ready(Transformer),
    Disabled,
    Invalid(String),
}

#[derive(Debug)]
struct Stage {
    id: String,
    kind: StageKind,
}

/// An ordered list of decoded transformer stages.
pub struct Pipeline {
    stages: Vec<Stage>,
    context: TransformContext,
    pool: Option<ThreadPool>,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl Pipeline {
    /// Decode every stage. Stages that fail to decode are kept as pass-through stages.
    pub fn new(configs: &[TransformerConfig], options: PipelineOptions) -> Self {
        let stages = configs
            .iter()
            .map(|config| {
                let kind = if config.disabled {
                    StageKind::Disabled
                } else {
                    match Transformer::from_config(config) {
                        Ok(t) => StageKind::Ready(t),
                        Err(error) => {
                            warn!(id = %config.id, %error, "stage cannot be decoded and will pass its input through");
                            StageKind::Invalid(error.to_string())
                        }
                    }
                };
                Stage {
                    id: config.id.clone(),
                    kind,
                }
            })
            .collect();
        Self::assemble(stages, options)
    }

    /// Decode every stage, failing on the first one that cannot be decoded.
    ///
    /// Disabled stages are not decoded.
    pub fn try_new(configs: &[TransformerConfig], options: PipelineOptions) -> FrameResult<Self> {
        let stages = configs
            .iter()
            .map(|config| -> FrameResult<Stage> {
                let kind = if config.disabled {
                    StageKind::Disabled
                } else {
                    StageKind::Ready(Transformer::from_config(config)?)
                };
                Ok(Stage {
                    id: config.id.clone(),
                    kind,
                })
            })
            .collect::<FrameResult<Vec<_>>>()?;
        Ok(Self::assemble(stages, options))
    }

    fn assemble(stages: Vec<Stage>, options: PipelineOptions) -> Self {
        let context = options
            .variables
            .into_iter()
            .fold(TransformContext::new(), |ctx, (name, value)| ctx.with_variable(name, value));

        let n_threads = options
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
            .max(1);
        let pool = match ThreadPoolBuilder::new().num_threads(n_threads).build() {
            Ok(pool) => Some(pool),
            Err(error) => {
                warn!(%error, "failed to build thread pool, batches will run sequentially");
                None
            }
        };

        Self {
            stages,
            context,
            pool,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        }
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Number of configured stages, including disabled and invalid ones.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage over one batch of frames.
    pub fn apply(&self, frames: &[DataFrame]) -> Vec<DataFrame> {
        let start = Instant::now();
        self.metrics.begin_run(frames.len());
        self.emit(ExecutionEvent::RunStarted {
            stages: self.stages.len(),
            frames_in: frames.len(),
        });

        let mut current = frames.to_vec();
        for (index, stage) in self.stages.iter().enumerate() {
            match &stage.kind {
                StageKind::Disabled => {
                    self.metrics.on_stage_skipped();
                    self.emit(ExecutionEvent::StageSkipped {
                        index,
                        id: stage.id.clone(),
                        reason: SkipReason::Disabled,
                    });
                }
                StageKind::Invalid(message) => {
                    self.metrics.on_stage_failed();
                    self.emit(ExecutionEvent::StageFailed {
                        index,
                        id: stage.id.clone(),
                        message: message.clone(),
                    });
                }
                StageKind::Ready(transformer) => {
                    let id = transformer.id();
                    self.emit(ExecutionEvent::StageStarted { index, id });
                    let stage_start = Instant::now();
                    current = transformer.apply(&current, &self.context);
                    let elapsed = stage_start.elapsed();
                    debug!(index, %id, ?elapsed, frames = current.len(), "applied stage");
                    self.metrics.on_stage_applied();
                    self.emit(ExecutionEvent::StageFinished {
                        index,
                        id,
                        frames_out: current.len(),
                        elapsed,
                    });
                }
            }
        }

        self.metrics.end_run(current.len(), start.elapsed());
        self.emit(ExecutionEvent::RunFinished {
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
        });
        current
    }

    /// Lazily run the pipeline over each batch of a stream, in order.
    pub fn apply_stream<'a, I>(&'a self, batches: I) -> impl Iterator<Item = Vec<DataFrame>> + 'a
    where
        I: IntoIterator<Item = Vec<DataFrame>>,
        I::IntoIter: 'a,
    {
        batches.into_iter().map(move |batch| self.apply(&batch))
    }

    /// Run the pipeline over independent batches in parallel. Output order matches input order.
    pub fn apply_batches(&self, batches: &[Vec<DataFrame>]) -> Vec<Vec<DataFrame>> {
        match &self.pool {
            Some(pool) => pool.install(|| batches.par_iter().map(|batch| self.apply(batch)).collect()),
            None => batches.iter().map(|batch| self.apply(batch)).collect(),
        }
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}
