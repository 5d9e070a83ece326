//! Request classification subsystem.
//!
//! # Data Flow
//! ```text
//! Framework request
//!     → request.rs (snapshot: method, scheme, host, path, query, UA, referer, IP)
//!     → classifier.rs (eligibility rules, crawler detection, cache key)
//!     → Return: Classification value threaded through the rest of the flow
//! ```

pub mod classifier;
pub mod request;

pub use classifier::{Classification, Classifier, Reason, ESCAPED_FRAGMENT};
pub use request::IncomingRequest;
