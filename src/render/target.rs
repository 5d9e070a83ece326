//! Render target construction.
//!
//! # Responsibilities
//! - Pick the renderer port for crawler or user traffic
//! - Encode the cache key into the renderer path
//! - Build the forwarded headers (`User-Agent`, `X-Prerender-Token`)

use std::net::IpAddr;

use axum::http::{header, HeaderMap, HeaderValue};
use url::form_urlencoded;

use crate::classify::{Classification, IncomingRequest};
use crate::config::PrerenderConfig;
use crate::render::error::RenderError;

pub const X_PRERENDER_TOKEN: &str = "x-prerender-token";

/// Renderer URL plus the headers sent with it.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    pub url: String,
    pub headers: HeaderMap,
}

impl RenderTarget {
    pub fn new(
        renderer_host: &str,
        port: u16,
        cache_key: &str,
        user_agent: &str,
        token: Option<&str>,
    ) -> Result<Self, RenderError> {
        let encoded: String = form_urlencoded::byte_serialize(cache_key.as_bytes()).collect();
        let url = format!("{}:{}/{}", renderer_host.trim_end_matches('/'), port, encoded);

        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| RenderError::InvalidTarget(format!("user agent: {}", e)))?,
        );
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(token)
                .map_err(|e| RenderError::InvalidTarget(format!("token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(X_PRERENDER_TOKEN, value);
        }

        Ok(Self { url, headers })
    }
}

/// Everything one render fetch needs, detached from the inbound request so it
/// can move into a background job.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub target: RenderTarget,
    pub cache_key: String,
    pub is_crawler: bool,
    pub client_ip: Option<IpAddr>,
}

impl RenderRequest {
    pub fn new(
        config: &PrerenderConfig,
        classification: &Classification,
        request: &IncomingRequest,
    ) -> Result<Self, RenderError> {
        let port = if classification.is_crawler {
            config.crawler_port
        } else {
            config.user_port
        };
        let user_agent = request.user_agent.as_deref().unwrap_or_default();

        Ok(Self {
            target: RenderTarget::new(
                &config.renderer_host,
                port,
                &classification.cache_key,
                user_agent,
                config.token.as_deref(),
            )?,
            cache_key: classification.cache_key.clone(),
            is_crawler: classification.is_crawler,
            client_ip: request.client_ip,
        })
    }

    /// Label used in logs and metrics.
    pub fn mode(&self) -> &'static str {
        if self.is_crawler {
            "crawler"
        } else {
            "user"
        }
    }
}
