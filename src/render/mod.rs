//! Renderer integration subsystem.
//!
//! # Data Flow
//! ```text
//! Classification + request snapshot
//!     → target.rs (renderer URL, port by mode, forwarded headers)
//!     → fetcher.rs (attempt loop, validation, cache eviction, alerting)
//!     → client.rs (HTTP GET with the configured redirect policy)
//!     → Return: Rendered | NotFound | transport error
//! ```

pub mod client;
pub mod error;
pub mod fetcher;
pub mod target;

pub use client::{HttpRenderClient, RenderClient, RenderedPage};
pub use error::RenderError;
pub use fetcher::{RenderFetcher, RenderOutcome};
pub use target::{RenderRequest, RenderTarget, X_PRERENDER_TOKEN};
