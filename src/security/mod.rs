//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → auth.rs (authenticated sessions bypass prerendering)
//!     → headers.rs (strip hop-by-hop, add X-Forwarded-For)
//!     → Pass to upstream
//! ```

pub mod auth;
pub mod headers;

pub use auth::{Anonymous, Authenticator, SessionAuthenticator};
