//! Background job subsystem.
//!
//! # Data Flow
//! ```text
//! Orchestrator (regular visitor, cache miss or stale)
//!     → JobQueue::enqueue (returns immediately)
//!     → pool.rs worker picks the job up
//!     → RenderFetcher::warm (fetch, validate, write back)
//! ```

pub mod pool;

pub use pool::{Job, JobQueue, WorkerPool};
