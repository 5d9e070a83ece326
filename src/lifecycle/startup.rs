//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the default collaborators from a validated config
//! - Start the cache-warming workers
//! - Assemble the HTTP server around the prerender layer
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::sync::Arc;
use std::time::Duration;

use axum::http::uri::InvalidUri;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::cache::{HtmlValidator, MemoryStore};
use crate::config::GatewayConfig;
use crate::http::{Collaborators, HttpServer, Prerender};
use crate::jobs::WorkerPool;
use crate::lifecycle::Shutdown;
use crate::observability::alerts::build_alert_sink;
use crate::render::{HttpRenderClient, RenderError};
use crate::security::SessionAuthenticator;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("renderer client: {0}")]
    RenderClient(#[from] RenderError),

    #[error("alert sink: {0}")]
    AlertSink(#[from] reqwest::Error),

    #[error("upstream address: {0}")]
    Upstream(#[from] InvalidUri),
}

/// A built gateway that has not started accepting traffic yet.
pub struct Gateway {
    pub server: HttpServer,
    pub workers: Vec<JoinHandle<()>>,
}

/// Build the prerender layer with the bundled collaborators.
///
/// Must be called from within a tokio runtime; the job workers start here.
pub fn build_prerender(
    config: &GatewayConfig,
    shutdown: &Shutdown,
) -> Result<(Arc<Prerender>, Vec<JoinHandle<()>>), StartupError> {
    let prerender_config = &config.prerender;

    let render_client = HttpRenderClient::new(
        prerender_config.soft_http_codes,
        Duration::from_secs(prerender_config.timeout_secs),
    )?;
    let alerts = build_alert_sink(&config.alerts)?;
    let (pool, workers) = WorkerPool::start(&config.jobs, shutdown);

    let prerender = Prerender::new(
        prerender_config.clone(),
        Collaborators {
            store: Arc::new(MemoryStore::new()),
            validator: Arc::new(HtmlValidator::from_config(&config.validator)),
            render_client: Arc::new(render_client),
            queue: Arc::new(pool),
            alerts,
            authenticator: Arc::new(SessionAuthenticator::from_config(&config.auth)),
        },
    );

    tracing::info!(
        enabled = prerender_config.enabled,
        renderer_host = %prerender_config.renderer_host,
        crawler_port = prerender_config.crawler_port,
        user_port = prerender_config.user_port,
        soft_http_codes = prerender_config.soft_http_codes,
        "Prerender layer ready"
    );

    Ok((Arc::new(prerender), workers))
}

/// Build the full gateway: prerender layer, workers and HTTP server.
pub fn build_gateway(config: &GatewayConfig, shutdown: &Shutdown) -> Result<Gateway, StartupError> {
    let (prerender, workers) = build_prerender(config, shutdown)?;
    let server = HttpServer::new(config, prerender)?;
    Ok(Gateway { server, workers })
}
