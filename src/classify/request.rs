//! Request snapshot.
//!
//! # Responsibilities
//! - Capture everything classification and rendering need from the framework request
//! - Resolve scheme, host and client IP once, before the request moves on
//!
//! # Design Decisions
//! - The snapshot is owned and immutable; downstream stages never look at the
//!   framework request again
//! - Host is reported without port, scheme falls back to `X-Forwarded-Proto`

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use axum::extract::ConnectInfo;
use axum::http::uri::Authority;
use axum::http::{header, HeaderMap, Method, Request};
use url::form_urlencoded;

/// Header set by Buffer's link-preview bot.
pub const X_BUFFERBOT: &str = "x-bufferbot";

/// Read-only view of an inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingRequest {
    pub method: Method,
    pub scheme: String,
    pub host: String,
    /// Raw (still percent-encoded) path, always starting with `/`.
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
    /// Decoded query pairs in request order.
    pub query_pairs: Vec<(String, String)>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub buffer_bot: bool,
    pub client_ip: Option<IpAddr>,
    pub authenticated: bool,
}

impl IncomingRequest {
    /// Snapshot a framework request.
    pub fn capture<B>(request: &Request<B>, authenticated: bool) -> Self {
        let uri = request.uri();
        let headers = request.headers();

        let query = uri.query().map(str::to_string);
        let query_pairs = query
            .as_deref()
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        let client_ip = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .or_else(|| forwarded_for(headers));

        Self {
            method: request.method().clone(),
            scheme: resolve_scheme(request),
            host: resolve_host(request),
            path: uri.path().to_string(),
            query,
            query_pairs,
            user_agent: header_str(headers, header::USER_AGENT.as_str())
                .filter(|ua| !ua.is_empty()),
            referer: header_str(headers, header::REFERER.as_str()),
            buffer_bot: headers.contains_key(X_BUFFERBOT),
            client_ip,
            authenticated,
        }
    }

    /// Path plus query string, the form rule lists are matched against.
    pub fn request_uri(&self) -> String {
        match &self.query {
            Some(q) if !q.is_empty() => format!("{}?{}", self.path, q),
            _ => self.path.clone(),
        }
    }

    pub fn has_query_param(&self, name: &str) -> bool {
        self.query_pairs.iter().any(|(k, _)| k == name)
    }

    /// First value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Header value as text; obs-text bytes are replaced rather than dropping the header.
fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

fn resolve_scheme<B>(request: &Request<B>) -> String {
    if let Some(scheme) = request.uri().scheme_str() {
        return scheme.to_ascii_lowercase();
    }
    request
        .headers()
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| v == "https" || v == "http")
        .unwrap_or_else(|| "http".to_string())
}

fn resolve_host<B>(request: &Request<B>) -> String {
    if let Some(host) = request.uri().host() {
        return host.to_ascii_lowercase();
    }
    request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Authority::from_str(v).ok())
        .map(|authority| authority.host().to_ascii_lowercase())
        .unwrap_or_else(|| "localhost".to_string())
}

fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())
}
