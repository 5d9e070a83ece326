//! Prerender request orchestration.
//!
//! # Data Flow
//! ```text
//! request
//!     → snapshot + classify (once)
//!     → not eligible                    → next(request)
//!     → regular visitor, cache hit      → snapshot
//!     → regular visitor, miss or stale  → enqueue warm-up, next(request)
//!     → crawler                         → synchronous render
//!           transport error             → one more render, else next(request)
//!           budget elapsed              → next(request)
//! ```
//!
//! # Design Decisions
//! - Regular visitors never wait on the renderer
//! - No fetch or cache failure ever reaches a visitor as an error page
//! - The classification is a value passed along, never stored on `Prerender`

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use tokio::time::{timeout_at, Instant};

use crate::cache::{ContentValidator, Lookup, SnapshotCache, SnapshotStore};
use crate::classify::{Classifier, IncomingRequest};
use crate::config::PrerenderConfig;
use crate::http::response::{outcome_response, snapshot_response};
use crate::jobs::JobQueue;
use crate::observability::alerts::AlertSink;
use crate::observability::metrics;
use crate::render::{RenderClient, RenderFetcher, RenderRequest};
use crate::security::Authenticator;

/// Renderer round trips a crawler request gets before falling back.
const CRAWLER_FETCH_ROUNDS: u32 = 2;

/// External collaborators injected into [`Prerender`].
pub struct Collaborators {
    pub store: Arc<dyn SnapshotStore>,
    pub validator: Arc<dyn ContentValidator>,
    pub render_client: Arc<dyn RenderClient>,
    pub queue: Arc<dyn JobQueue>,
    pub alerts: Arc<dyn AlertSink>,
    pub authenticator: Arc<dyn Authenticator>,
}

/// The prerender decision and response flow.
pub struct Prerender {
    config: PrerenderConfig,
    classifier: Classifier,
    cache: SnapshotCache,
    fetcher: Arc<RenderFetcher>,
    queue: Arc<dyn JobQueue>,
    authenticator: Arc<dyn Authenticator>,
}

impl Prerender {
    pub fn new(config: PrerenderConfig, deps: Collaborators) -> Self {
        let cache = SnapshotCache::new(deps.store, deps.validator);
        let fetcher = RenderFetcher::new(
            deps.render_client,
            cache.clone(),
            deps.alerts,
            config.soft_http_codes,
            config.max_attempts,
        )
        .with_write_back(config.write_back);

        Self {
            classifier: Classifier::from_config(&config),
            cache,
            fetcher: Arc::new(fetcher),
            queue: deps.queue,
            authenticator: deps.authenticator,
            config,
        }
    }

    /// Handle one request; `next` continues to the live application.
    pub async fn handle<F, Fut>(&self, request: Request<Body>, next: F) -> Response
    where
        F: FnOnce(Request<Body>) -> Fut,
        Fut: Future<Output = Response>,
    {
        let authenticated = self.authenticator.is_authenticated(&request);
        let incoming = IncomingRequest::capture(&request, authenticated);
        let classification = self.classifier.classify(&incoming);
        metrics::record_decision(classification.reason.as_str());

        if !classification.eligible {
            tracing::trace!(
                path = %incoming.path,
                reason = classification.reason.as_str(),
                "Passing through"
            );
            return next(request).await;
        }

        let render = match RenderRequest::new(&self.config, &classification, &incoming) {
            Ok(render) => render,
            Err(e) => {
                tracing::warn!(cache_key = %classification.cache_key, error = %e, "Cannot build render target");
                return next(request).await;
            }
        };

        tracing::debug!(
            cache_key = %render.cache_key,
            mode = render.mode(),
            reason = classification.reason.as_str(),
            "Prerender eligible"
        );

        if !render.is_crawler || self.config.serve_cache_to_crawlers {
            if let Lookup::Hit(html) = self.cache.lookup(&render.cache_key).await {
                return snapshot_response(html);
            }
        }

        if render.is_crawler {
            return self.render_for_crawler(render, request, next).await;
        }

        self.enqueue_warm_up(render);
        next(request).await
    }

    async fn render_for_crawler<F, Fut>(
        &self,
        render: RenderRequest,
        request: Request<Body>,
        next: F,
    ) -> Response
    where
        F: FnOnce(Request<Body>) -> Fut,
        Fut: Future<Output = Response>,
    {
        let deadline = Instant::now() + Duration::from_secs(self.config.crawler_budget_secs);

        for round in 1..=CRAWLER_FETCH_ROUNDS {
            match timeout_at(deadline, self.fetcher.fetch(&render)).await {
                Ok(Ok(outcome)) => return outcome_response(outcome),
                Ok(Err(e)) => {
                    tracing::warn!(cache_key = %render.cache_key, round, error = %e, "Crawler render failed");
                }
                Err(_) => {
                    tracing::warn!(
                        cache_key = %render.cache_key,
                        round,
                        budget_secs = self.config.crawler_budget_secs,
                        "Crawler render budget exhausted"
                    );
                    break;
                }
            }
        }

        tracing::error!(cache_key = %render.cache_key, "Crawler render failed, serving live page");
        next(request).await
    }

    fn enqueue_warm_up(&self, render: RenderRequest) {
        let fetcher = self.fetcher.clone();
        self.queue
            .enqueue(Box::pin(async move { fetcher.warm(render).await }));
    }
}

/// Axum middleware running [`Prerender::handle`] in front of the inner service.
pub async fn prerender_middleware(
    State(prerender): State<Arc<Prerender>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    prerender.handle(request, |request| next.run(request)).await
}
