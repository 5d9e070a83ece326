//! Cache-warming worker pool.
//!
//! # Responsibilities
//! - Accept fire-and-forget jobs from request handlers
//! - Run them on a fixed number of tokio workers
//! - Stop workers on shutdown
//!
//! # Design Decisions
//! - Bounded channel; a full queue drops the job (at-most-once delivery)
//! - A job is finished whether it succeeds, fails or panics; no requeue
//! - Workers share one receiver behind an async mutex

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::JobsConfig;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

/// A unit of background work. Its outcome is never observed by the enqueuer.
pub type Job = BoxFuture<'static, ()>;

/// Fire-and-forget job submission.
pub trait JobQueue: Send + Sync {
    fn enqueue(&self, job: Job);
}

struct QueuedJob {
    id: Uuid,
    job: Job,
}

/// Fixed-size pool of tokio workers draining a bounded queue.
#[derive(Clone)]
pub struct WorkerPool {
    tx: mpsc::Sender<QueuedJob>,
}

impl WorkerPool {
    /// Spawn the workers. Must be called from within a tokio runtime.
    pub fn start(config: &JobsConfig, shutdown: &Shutdown) -> (Self, Vec<JoinHandle<()>>) {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let handles = (0..config.workers.max(1))
            .map(|worker| tokio::spawn(run_worker(worker, rx.clone(), shutdown.subscribe())))
            .collect();

        tracing::info!(
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            "Job workers started"
        );

        (Self { tx }, handles)
    }
}

impl JobQueue for WorkerPool {
    fn enqueue(&self, job: Job) {
        let id = Uuid::new_v4();
        match self.tx.try_send(QueuedJob { id, job }) {
            Ok(()) => tracing::trace!(job_id = %id, "Job enqueued"),
            Err(TrySendError::Full(_)) => {
                metrics::record_job("dropped");
                tracing::warn!(job_id = %id, "Job queue full, dropping job");
            }
            Err(TrySendError::Closed(_)) => {
                metrics::record_job("dropped");
                tracing::warn!(job_id = %id, "Job workers stopped, dropping job");
            }
        }
    }
}

async fn run_worker(
    worker: usize,
    rx: Arc<Mutex<mpsc::Receiver<QueuedJob>>>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        let next = async { rx.lock().await.recv().await };

        let queued = tokio::select! {
            queued = next => queued,
            _ = shutdown.recv() => {
                tracing::debug!(worker, "Job worker received shutdown signal, exiting loop");
                break;
            }
        };

        let Some(QueuedJob { id, job }) = queued else {
            break;
        };

        tracing::trace!(worker, job_id = %id, "Job started");
        if AssertUnwindSafe(job).catch_unwind().await.is_err() {
            metrics::record_job("panicked");
            tracing::error!(worker, job_id = %id, "Job panicked");
        }
    }
}
