//! Rule matching subsystem.
//!
//! # Data Flow
//! ```text
//! Config lists (whitelist, blacklist, whitelist_for_all_users)
//!     → RuleList::new (compile once at startup)
//!     → matcher.rs (glob match URI / referer against the list)
//!     → Return: listed or not listed
//! ```
//!
//! # Design Decisions
//! - Lists compiled at startup, immutable at runtime
//! - Deterministic: same input always yields the same answer

pub mod matcher;

pub use matcher::{Pattern, RuleList};
