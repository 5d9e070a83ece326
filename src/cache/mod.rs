//! Snapshot cache subsystem.
//!
//! # Data Flow
//! ```text
//! cache key
//!     → store.rs (exists / get / delete / put against the key-value store)
//!     → validator.rs (is the stored HTML a complete render?)
//!     → gateway.rs (Hit | Miss | Stale, deleting stale entries)
//! ```
//!
//! # Design Decisions
//! - The store is an injected trait object; the bundled implementation is in-process
//! - No locking on top of the store; duplicate concurrent renders are tolerated
//! - Invalid snapshots are deleted eagerly, never served

pub mod gateway;
pub mod store;
pub mod validator;

pub use gateway::{Lookup, SnapshotCache};
pub use store::{MemoryStore, SnapshotStore};
pub use validator::{ContentValidator, HtmlValidator};
