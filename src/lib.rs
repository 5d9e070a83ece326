//! Prerender gateway library.
//!
//! Serves crawler-friendly HTML snapshots of a client-rendered application:
//! crawlers get a synchronous render, regular visitors get cached snapshots
//! or the live application while a background job warms the cache.

pub mod cache;
pub mod classify;
pub mod config;
pub mod http;
pub mod jobs;
pub mod lifecycle;
pub mod observability;
pub mod render;
pub mod rules;
pub mod security;

pub use config::schema::GatewayConfig;
pub use http::{HttpServer, Prerender};
pub use lifecycle::Shutdown;
