//! Render fetch with bounded retries.
//!
//! # State Machine
//! ```text
//! attempt = 1
//! loop:
//!     GET target
//!         transport error        → Err(Transport)
//!         strict && 3xx          → Rendered (as-is, no validation)
//!         strict && 404          → NotFound
//!     validate body
//!         valid                  → Rendered (write back if enabled)
//!         invalid, attempt < max → delete key, attempt += 1, retry immediately
//!         invalid, attempt = max → delete key, alert, Rendered (last response)
//! ```
//!
//! # Design Decisions
//! - No backoff: invalid renders are assumed to be renderer-side, and the bound is small
//! - Exhaustion is not an error for the caller; it degrades to the last response
//! - Transport failures are not retried here; the orchestrator decides

use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;

use crate::cache::SnapshotCache;
use crate::observability::alerts::{AlertPayload, AlertSink, RENDER_EXHAUSTED};
use crate::observability::metrics;
use crate::render::client::{RenderClient, RenderedPage};
use crate::render::error::RenderError;
use crate::render::target::RenderRequest;

/// Terminal result of a fetch that reached the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered(RenderedPage),
    /// Strict mode only: the renderer reported the page does not exist.
    NotFound,
}

/// Fetches pages from the renderer and keeps the snapshot cache honest.
pub struct RenderFetcher {
    client: Arc<dyn RenderClient>,
    cache: SnapshotCache,
    alerts: Arc<dyn AlertSink>,
    soft_http_codes: bool,
    max_attempts: u32,
    write_back: bool,
}

impl RenderFetcher {
    pub fn new(
        client: Arc<dyn RenderClient>,
        cache: SnapshotCache,
        alerts: Arc<dyn AlertSink>,
        soft_http_codes: bool,
        max_attempts: u32,
    ) -> Self {
        Self {
            client,
            cache,
            alerts,
            soft_http_codes,
            max_attempts: max_attempts.max(1),
            write_back: true,
        }
    }

    /// Store validated 2xx renders under their cache key.
    pub fn with_write_back(mut self, write_back: bool) -> Self {
        self.write_back = write_back;
        self
    }

    /// Fetch a page from the renderer.
    pub async fn fetch(&self, request: &RenderRequest) -> Result<RenderOutcome, RenderError> {
        let start = Instant::now();
        let outcome = self.attempt_loop(request).await;
        metrics::record_render_duration(request.mode(), start);
        outcome
    }

    async fn attempt_loop(&self, request: &RenderRequest) -> Result<RenderOutcome, RenderError> {
        let mode = request.mode();
        let mut attempt: u32 = 1;

        loop {
            let page = match self.client.get(&request.target).await {
                Ok(page) => page,
                Err(e) => {
                    metrics::record_render_attempt(mode, "transport_error");
                    tracing::warn!(
                        cache_key = %request.cache_key,
                        mode,
                        attempt,
                        error = %e,
                        "Renderer unreachable"
                    );
                    return Err(e);
                }
            };

            if !self.soft_http_codes {
                if page.status.is_redirection() {
                    metrics::record_render_attempt(mode, "redirect");
                    tracing::debug!(cache_key = %request.cache_key, status = %page.status, "Renderer redirect");
                    return Ok(RenderOutcome::Rendered(page));
                }
                if page.status == StatusCode::NOT_FOUND {
                    metrics::record_render_attempt(mode, "not_found");
                    tracing::debug!(cache_key = %request.cache_key, "Renderer reported not found");
                    return Ok(RenderOutcome::NotFound);
                }
            }

            if self.cache.is_valid(&page.body) {
                metrics::record_render_attempt(mode, "valid");
                if self.write_back && page.status.is_success() {
                    self.cache.store(&request.cache_key, page.body.clone()).await;
                }
                tracing::debug!(cache_key = %request.cache_key, mode, attempt, "Render accepted");
                return Ok(RenderOutcome::Rendered(page));
            }

            metrics::record_render_attempt(mode, "invalid");
            self.cache.delete(&request.cache_key).await;

            if attempt >= self.max_attempts {
                tracing::error!(
                    cache_key = %request.cache_key,
                    mode,
                    attempts = attempt,
                    status = %page.status,
                    "Render still invalid after final attempt"
                );
                self.alerts
                    .notify(RENDER_EXHAUSTED, exhausted_payload(request, attempt, page.status));
                return Ok(RenderOutcome::Rendered(page));
            }

            tracing::info!(
                cache_key = %request.cache_key,
                mode,
                attempt,
                status = %page.status,
                "Invalid render, retrying"
            );
            attempt += 1;
        }
    }

    /// Background cache-warming entry point. Never fails; outcomes are logged.
    pub async fn warm(&self, request: RenderRequest) {
        match self.fetch(&request).await {
            Ok(RenderOutcome::Rendered(page)) => {
                metrics::record_job("rendered");
                tracing::debug!(cache_key = %request.cache_key, status = %page.status, "Cache warmed");
            }
            Ok(RenderOutcome::NotFound) => {
                metrics::record_job("not_found");
                tracing::debug!(cache_key = %request.cache_key, "Cache warm skipped, page not found");
            }
            Err(e) => {
                metrics::record_job("failed");
                tracing::warn!(cache_key = %request.cache_key, error = %e, "Cache warm failed");
            }
        }
    }
}

fn exhausted_payload(request: &RenderRequest, attempts: u32, status: StatusCode) -> AlertPayload {
    let mut payload = AlertPayload::new();
    payload.insert("cache_key".to_string(), request.cache_key.clone());
    payload.insert("is_crawler".to_string(), request.is_crawler.to_string());
    payload.insert(
        "client_ip".to_string(),
        request
            .client_ip
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    );
    payload.insert("attempts".to_string(), attempts.to_string());
    payload.insert("status".to_string(), status.as_u16().to_string());
    payload
}
