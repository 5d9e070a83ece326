//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (attempts > 0, ports valid, workers > 0)
//! - Check that addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("invalid socket address '{}'", config.listener.bind_address),
        ));
    }

    if config.upstream.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "upstream.address",
            format!("invalid socket address '{}'", config.upstream.address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    let prerender = &config.prerender;
    match Url::parse(&prerender.renderer_host) {
        Ok(url) if url.port().is_some() => errors.push(ValidationError::new(
            "prerender.renderer_host",
            "must not carry a port; use crawler_port and user_port",
        )),
        Ok(url) if !matches!(url.scheme(), "http" | "https") => errors.push(ValidationError::new(
            "prerender.renderer_host",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::new(
            "prerender.renderer_host",
            format!("invalid URL '{}': {}", prerender.renderer_host, e),
        )),
    }

    if prerender.crawler_port == 0 {
        errors.push(ValidationError::new("prerender.crawler_port", "must be non-zero"));
    }
    if prerender.user_port == 0 {
        errors.push(ValidationError::new("prerender.user_port", "must be non-zero"));
    }
    if prerender.max_attempts == 0 {
        errors.push(ValidationError::new("prerender.max_attempts", "must be at least 1"));
    }
    if prerender.timeout_secs == 0 {
        errors.push(ValidationError::new("prerender.timeout_secs", "must be greater than 0"));
    }
    if prerender.crawler_user_agents.iter().any(|ua| ua.trim().is_empty()) {
        errors.push(ValidationError::new(
            "prerender.crawler_user_agents",
            "empty entries would match every user agent",
        ));
    }

    if prerender.renderer_user_agent.trim().is_empty() {
        errors.push(ValidationError::new(
            "prerender.renderer_user_agent",
            "an empty signature would mark every visitor as the renderer",
        ));
    }
    if prerender.crawler_budget_secs == 0 {
        errors.push(ValidationError::new(
            "prerender.crawler_budget_secs",
            "must be greater than 0",
        ));
    } else if prerender.crawler_budget_secs >= config.timeouts.request_secs {
        errors.push(ValidationError::new(
            "prerender.crawler_budget_secs",
            format!(
                "must be less than timeouts.request_secs ({}) so crawlers can fall back to the live page",
                config.timeouts.request_secs
            ),
        ));
    }

    if config.jobs.workers == 0 {
        errors.push(ValidationError::new("jobs.workers", "must be at least 1"));
    }
    if config.jobs.queue_capacity == 0 {
        errors.push(ValidationError::new("jobs.queue_capacity", "must be at least 1"));
    }

    if let Some(webhook) = &config.alerts.webhook_url {
        if Url::parse(webhook).is_err() {
            errors.push(ValidationError::new(
                "alerts.webhook_url",
                format!("invalid URL '{}'", webhook),
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address '{}'", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
