//! Metrics collection and exposition.
//!
//! # Metrics
//! - `prerender_decisions_total` (counter): classification outcomes by reason
//! - `prerender_cache_lookups_total` (counter): hit / miss / stale
//! - `prerender_render_attempts_total` (counter): attempts by mode and result
//! - `prerender_render_duration_seconds` (histogram): full fetch latency by mode
//! - `prerender_alerts_total` (counter): alerts raised by kind
//! - `prerender_jobs_total` (counter): cache-warming jobs by result
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so tests need no setup
//! - Prometheus exporter is optional and bound to its own address

use std::net::SocketAddr;
use std::sync::Once;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;

static DESCRIPTIONS: Once = Once::new();

/// Install the Prometheus exporter and describe all metrics.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            describe_metrics();
            tracing::info!(address = %addr, "Metrics exporter listening");
        }
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter");
        }
    }
}

fn describe_metrics() {
    DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "prerender_decisions_total",
            Unit::Count,
            "Classification outcomes by reason."
        );
        describe_counter!(
            "prerender_cache_lookups_total",
            Unit::Count,
            "Snapshot cache lookups by outcome."
        );
        describe_counter!(
            "prerender_render_attempts_total",
            Unit::Count,
            "Renderer requests by mode and result."
        );
        describe_histogram!(
            "prerender_render_duration_seconds",
            Unit::Seconds,
            "Time spent in one render fetch including retries."
        );
        describe_counter!(
            "prerender_alerts_total",
            Unit::Count,
            "Alerts raised by kind."
        );
        describe_counter!(
            "prerender_jobs_total",
            Unit::Count,
            "Cache-warming jobs by result."
        );
    });
}

pub fn record_decision(reason: &'static str) {
    counter!("prerender_decisions_total", "reason" => reason).increment(1);
}

pub fn record_cache_lookup(outcome: &'static str) {
    counter!("prerender_cache_lookups_total", "outcome" => outcome).increment(1);
}

pub fn record_render_attempt(mode: &'static str, result: &'static str) {
    counter!("prerender_render_attempts_total", "mode" => mode, "result" => result).increment(1);
}

pub fn record_render_duration(mode: &'static str, start: Instant) {
    histogram!("prerender_render_duration_seconds", "mode" => mode)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_alert(kind: &str) {
    counter!("prerender_alerts_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_job(result: &'static str) {
    counter!("prerender_jobs_total", "result" => result).increment(1);
}
