//! Alert delivery for renders that never validated.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::AlertConfig;
use crate::observability::metrics;

/// Alert kind raised when every render attempt for a key failed validation.
pub const RENDER_EXHAUSTED: &str = "prerender_render_exhausted";

pub type AlertPayload = BTreeMap<String, String>;

/// Best-effort alert receiver. Delivery failures are never propagated.
pub trait AlertSink: Send + Sync {
    fn notify(&self, kind: &str, payload: AlertPayload);
}

/// Writes alerts to the structured log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn notify(&self, kind: &str, payload: AlertPayload) {
        metrics::record_alert(kind);
        tracing::error!(kind = %kind, payload = ?payload, "Prerender alert");
    }
}

#[derive(Serialize)]
struct WebhookBody<'a> {
    kind: &'a str,
    payload: &'a AlertPayload,
}

/// Logs alerts and POSTs them as JSON to a webhook in the background.
#[derive(Debug, Clone)]
pub struct WebhookAlertSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookAlertSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl AlertSink for WebhookAlertSink {
    fn notify(&self, kind: &str, payload: AlertPayload) {
        TracingAlertSink.notify(kind, payload.clone());

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(kind = %kind, "No runtime available, webhook alert skipped");
            return;
        };

        let client = self.client.clone();
        let url = self.url.clone();
        let kind = kind.to_string();
        handle.spawn(async move {
            let body = WebhookBody {
                kind: &kind,
                payload: &payload,
            };
            match client.post(&url).json(&body).send().await {
                Ok(res) if res.status().is_success() => {
                    tracing::debug!(kind = %kind, "Webhook alert delivered");
                }
                Ok(res) => {
                    tracing::warn!(kind = %kind, status = %res.status(), "Webhook alert rejected");
                }
                Err(e) => {
                    tracing::warn!(kind = %kind, error = %e, "Webhook alert failed");
                }
            }
        });
    }
}

/// Build the configured alert sink.
pub fn build_alert_sink(config: &AlertConfig) -> Result<Arc<dyn AlertSink>, reqwest::Error> {
    match &config.webhook_url {
        Some(url) => Ok(Arc::new(WebhookAlertSink::new(
            url.clone(),
            Duration::from_secs(config.timeout_secs),
        )?)),
        None => Ok(Arc::new(TracingAlertSink)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_body_shape() {
        let mut payload = AlertPayload::new();
        payload.insert("cache_key".to_string(), "https://example.com/".to_string());
        payload.insert("is_crawler".to_string(), "true".to_string());

        let body = WebhookBody {
            kind: RENDER_EXHAUSTED,
            payload: &payload,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["kind"], RENDER_EXHAUSTED);
        assert_eq!(json["payload"]["cache_key"], "https://example.com/");
        assert_eq!(json["payload"]["is_crawler"], "true");
    }

    #[test]
    fn test_webhook_without_runtime_does_not_panic() {
        let sink = WebhookAlertSink::new("http://127.0.0.1:9/alerts", Duration::from_secs(1)).unwrap();
        sink.notify(RENDER_EXHAUSTED, AlertPayload::new());
    }
}
