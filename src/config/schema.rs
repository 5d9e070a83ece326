//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the prerender gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The live application the gateway fronts.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Prerender decision rules and renderer location.
    pub prerender: PrerenderConfig,

    /// Heuristics for detecting truncated or placeholder renders.
    pub validator: ValidatorConfig,

    /// Cache-warming worker pool.
    pub jobs: JobsConfig,

    /// Alert delivery for exhausted renders.
    pub alerts: AlertConfig,

    /// How authenticated sessions are recognized.
    pub auth: AuthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream (live application) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Prerender rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PrerenderConfig {
    /// Master switch. When false every request passes through.
    pub enabled: bool,

    /// Return the renderer's own 3xx/404 responses instead of following them.
    ///
    /// When false (strict mode) redirects are not followed and a renderer 404
    /// becomes a 404 for the page.
    pub soft_http_codes: bool,

    /// Case-insensitive substrings identifying crawler user agents.
    pub crawler_user_agents: Vec<String>,

    /// Only these URIs are prerendered (empty = no restriction).
    pub whitelist: Vec<String>,

    /// These URIs and referers are never prerendered (empty = no restriction).
    pub blacklist: Vec<String>,

    /// URIs prerendered for every visitor, crawler or not.
    pub whitelist_for_all_users: Vec<String>,

    /// Sent to the renderer as `X-Prerender-Token`.
    pub token: Option<String>,

    /// Renderer base URL without port (e.g., "http://127.0.0.1").
    pub renderer_host: String,

    /// Renderer port used for crawler traffic.
    pub crawler_port: u16,

    /// Renderer port used for cache warming on behalf of regular users.
    pub user_port: u16,

    /// Query parameters that are part of the cache key, in key order.
    pub retained_query_params: Vec<String>,

    /// User-agent signature of the renderer's own headless browser.
    pub renderer_user_agent: String,

    /// Render attempts before giving up and alerting.
    pub max_attempts: u32,

    /// Timeout of a single render attempt in seconds.
    pub timeout_secs: u64,

    /// Wall-clock limit on a crawler's synchronous render, retries included.
    ///
    /// Must stay below `timeouts.request_secs`; when it elapses the crawler
    /// gets the live page.
    pub crawler_budget_secs: u64,

    /// Store validated renders under their cache key.
    pub write_back: bool,

    /// Let crawlers read cached snapshots before rendering synchronously.
    pub serve_cache_to_crawlers: bool,
}

impl Default for PrerenderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            soft_http_codes: true,
            crawler_user_agents: default_crawler_user_agents(),
            whitelist: Vec::new(),
            blacklist: default_blacklist(),
            whitelist_for_all_users: Vec::new(),
            token: None,
            renderer_host: "http://127.0.0.1".to_string(),
            crawler_port: 3000,
            user_port: 3001,
            retained_query_params: Vec::new(),
            renderer_user_agent: "https://github.com/prerender/prerender".to_string(),
            max_attempts: 3,
            timeout_secs: 30,
            crawler_budget_secs: 50,
            write_back: true,
            serve_cache_to_crawlers: false,
        }
    }
}

fn default_crawler_user_agents() -> Vec<String> {
    [
        "googlebot",
        "yahoo",
        "bingbot",
        "yandex",
        "baiduspider",
        "facebookexternalhit",
        "twitterbot",
        "rogerbot",
        "linkedinbot",
        "embedly",
        "bufferbot",
        "quora link preview",
        "showyoubot",
        "outbrain",
        "pinterest/0.",
        "developers.google.com/+/web/snippet",
        "www.google.com/webmasters/tools/richsnippets",
        "slackbot",
        "vkshare",
        "w3c_validator",
        "redditbot",
        "applebot",
        "whatsapp",
        "flipboard",
        "tumblr",
        "bitlybot",
        "skypeuripreview",
        "nuzzel",
        "discordbot",
        "google page speed",
        "qwantify",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_blacklist() -> Vec<String> {
    [
        "*.js", "*.css", "*.xml", "*.less", "*.png", "*.jpg", "*.jpeg", "*.gif", "*.pdf", "*.doc",
        "*.txt", "*.ico", "*.rss", "*.zip", "*.mp3", "*.rar", "*.exe", "*.wmv", "*.avi", "*.ppt",
        "*.mpg", "*.mpeg", "*.tif", "*.wav", "*.mov", "*.psd", "*.ai", "*.xls", "*.mp4", "*.m4a",
        "*.swf", "*.dat", "*.dmg", "*.iso", "*.flv", "*.m4v", "*.torrent", "*.svg", "*.woff",
        "*.woff2", "*.ttf", "*.eot",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Render validity heuristics.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Bodies shorter than this are treated as truncated.
    pub min_body_bytes: usize,

    /// Every marker must appear in a complete render.
    pub required_markers: Vec<String>,

    /// Any of these markers flags a placeholder render.
    pub placeholder_markers: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            min_body_bytes: 64,
            required_markers: vec!["</html>".to_string()],
            placeholder_markers: Vec::new(),
        }
    }
}

/// Cache-warming worker pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JobsConfig {
    /// Number of concurrent workers.
    pub workers: usize,

    /// Pending jobs beyond this are dropped.
    pub queue_capacity: usize,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 1024,
        }
    }
}

/// Alert delivery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Optional webhook receiving alerts as JSON.
    pub webhook_url: Option<String>,

    /// Webhook request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: 5,
        }
    }
}

/// Authenticated session detection.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Session cookie whose presence marks a logged-in visitor.
    pub session_cookie: Option<String>,

    /// Treat any `Authorization` header as authenticated.
    pub authorization_header: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the compact format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
