//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → prerender.rs (classify, serve snapshot or render, or pass on)
//!     → response.rs (shape snapshot and renderer responses)
//!     → server.rs upstream handler (forward to the live application)
//!     → Send to client
//! ```

pub mod prerender;
pub mod response;
pub mod server;

pub use prerender::{prerender_middleware, Collaborators, Prerender};
pub use server::HttpServer;
