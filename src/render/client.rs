//! HTTP client for the external renderer.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use reqwest::redirect::Policy;

use crate::render::error::RenderError;
use crate::render::target::RenderTarget;

/// A fully read renderer response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// Issues GET requests to the renderer. Redirect policy is fixed at construction.
#[async_trait]
pub trait RenderClient: Send + Sync {
    async fn get(&self, target: &RenderTarget) -> Result<RenderedPage, RenderError>;
}

/// `reqwest`-backed renderer client.
#[derive(Debug, Clone)]
pub struct HttpRenderClient {
    client: reqwest::Client,
}

impl HttpRenderClient {
    /// Build a client that follows redirects only when `follow_redirects` is set.
    pub fn new(follow_redirects: bool, timeout: Duration) -> Result<Self, RenderError> {
        let policy = if follow_redirects {
            Policy::default()
        } else {
            Policy::none()
        };
        let client = reqwest::Client::builder()
            .redirect(policy)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RenderClient for HttpRenderClient {
    async fn get(&self, target: &RenderTarget) -> Result<RenderedPage, RenderError> {
        let response = self
            .client
            .get(&target.url)
            .headers(target.headers.clone())
            .send()
            .await?;

        let status = response.status();
        let mut headers = response.headers().clone();
        let body = response.text().await?;
        relabel_as_utf8(&mut headers);

        Ok(RenderedPage {
            status,
            headers,
            body,
        })
    }
}

/// Point a declared charset at UTF-8; `text()` has already transcoded the body.
fn relabel_as_utf8(headers: &mut HeaderMap) {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return;
    };

    let mut parts = content_type.split(';').map(str::trim);
    let mime = parts.next().unwrap_or_default();
    let mut declared_charset = false;
    let mut relabeled = mime.to_string();
    for param in parts.filter(|p| !p.is_empty()) {
        if param.to_ascii_lowercase().starts_with("charset=") {
            declared_charset = true;
            continue;
        }
        relabeled.push_str("; ");
        relabeled.push_str(param);
    }
    if !declared_charset {
        return;
    }
    relabeled.push_str("; charset=utf-8");

    if let Ok(value) = HeaderValue::from_str(&relabeled) {
        headers.insert(header::CONTENT_TYPE, value);
    }
}
