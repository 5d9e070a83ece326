//! End-to-end tests: client → gateway → renderer / live application.

use std::time::Duration;

use axum::http::StatusCode;

mod common;

use common::MockResponse;

const GOOGLEBOT: &str = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";
const FIREFOX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0";
const RENDERED: &str = "<!DOCTYPE html><html><head><title>Product 1</title></head>\
<body><h1>Product 1</h1><p>Rendered by the prerender service.</p></body></html>";
const LIVE: &str = "<html><body><div id=\"app\"></div></body></html>";

#[tokio::test]
async fn test_crawler_receives_rendered_page() {
    let (upstream, upstream_log) = common::start_mock_server(|_| MockResponse::ok(LIVE)).await;
    let (renderer, renderer_log) = common::start_mock_server(|_| MockResponse::ok(RENDERED)).await;

    let mut config = common::gateway_config(upstream, renderer.port());
    config.prerender.token = Some("s3cret".to_string());
    let (gateway, shutdown) = common::start_gateway(config).await;

    let response = common::client()
        .get(format!("http://{}/products/1", gateway))
        .header("User-Agent", GOOGLEBOT)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.text().await.unwrap(), RENDERED);

    let renderer_requests = renderer_log.lock().unwrap().clone();
    assert_eq!(renderer_requests.len(), 1);
    assert_eq!(renderer_requests[0].path, "/http%3A%2F%2F127.0.0.1%2Fproducts%2F1");
    assert_eq!(renderer_requests[0].header("x-prerender-token"), Some("s3cret"));
    assert_eq!(renderer_requests[0].header("user-agent"), Some(GOOGLEBOT));
    assert!(upstream_log.lock().unwrap().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_crawler_retries_truncated_render() {
    let (upstream, _) = common::start_mock_server(|_| MockResponse::ok(LIVE)).await;
    let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = calls.clone();
    let (renderer, _) = common::start_mock_server(move |_| {
        if counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0 {
            MockResponse::ok("<html><body>Loading")
        } else {
            MockResponse::ok(RENDERED)
        }
    })
    .await;

    let (gateway, shutdown) = common::start_gateway(common::gateway_config(upstream, renderer.port())).await;

    let response = common::client()
        .get(format!("http://{}/products/1", gateway))
        .header("User-Agent", GOOGLEBOT)
        .send()
        .await
        .unwrap();

    assert_eq!(response.text().await.unwrap(), RENDERED);
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);

    shutdown.trigger();
}

#[tokio::test]
async fn test_strict_mode_passes_redirect_through() {
    let (upstream, _) = common::start_mock_server(|_| MockResponse::ok(LIVE)).await;
    let (renderer, renderer_log) =
        common::start_mock_server(|_| MockResponse::redirect(302, "https://example.com/new")).await;

    let mut config = common::gateway_config(upstream, renderer.port());
    config.prerender.soft_http_codes = false;
    let (gateway, shutdown) = common::start_gateway(config).await;

    let response = common::client()
        .get(format!("http://{}/old", gateway))
        .header("User-Agent", GOOGLEBOT)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()["location"], "https://example.com/new");
    assert_eq!(renderer_log.lock().unwrap().len(), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_strict_mode_not_found() {
    let (upstream, _) = common::start_mock_server(|_| MockResponse::ok(LIVE)).await;
    let (renderer, _) =
        common::start_mock_server(|_| MockResponse::status(404, "<html>gone</html>")).await;

    let mut config = common::gateway_config(upstream, renderer.port());
    config.prerender.soft_http_codes = false;
    let (gateway, shutdown) = common::start_gateway(config).await;

    let response = common::client()
        .get(format!("http://{}/missing", gateway))
        .header("User-Agent", GOOGLEBOT)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    shutdown.trigger();
}

#[tokio::test]
async fn test_renderer_down_serves_live_application() {
    let (upstream, upstream_log) = common::start_mock_server(|_| MockResponse::ok(LIVE)).await;
    let renderer = common::closed_port().await;

    let (gateway, shutdown) = common::start_gateway(common::gateway_config(upstream, renderer.port())).await;

    let response = common::client()
        .get(format!("http://{}/products/1", gateway))
        .header("User-Agent", GOOGLEBOT)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), LIVE);
    assert_eq!(upstream_log.lock().unwrap().len(), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_visitor_warms_cache_in_background() {
    let (upstream, upstream_log) = common::start_mock_server(|_| MockResponse::ok(LIVE)).await;
    let (renderer, renderer_log) = common::start_mock_server(|_| MockResponse::ok(RENDERED)).await;

    let (gateway, shutdown) = common::start_gateway(common::gateway_config(upstream, renderer.port())).await;
    let url = format!("http://{}/products/1?_escaped_fragment_=", gateway);
    let client = common::client();

    let first = client
        .get(&url)
        .header("User-Agent", FIREFOX)
        .send()
        .await
        .unwrap();
    assert_eq!(first.text().await.unwrap(), LIVE);

    let mut served = None;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let body = client
            .get(&url)
            .header("User-Agent", FIREFOX)
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        if body == RENDERED {
            served = Some(body);
            break;
        }
    }

    assert_eq!(served.as_deref(), Some(RENDERED));
    assert_eq!(renderer_log.lock().unwrap()[0].header("user-agent"), Some(FIREFOX));
    assert!(!upstream_log.lock().unwrap().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_ineligible_requests_reach_upstream() {
    let (upstream, upstream_log) = common::start_mock_server(|_| MockResponse::ok(LIVE)).await;
    let (renderer, renderer_log) = common::start_mock_server(|_| MockResponse::ok(RENDERED)).await;

    let (gateway, shutdown) = common::start_gateway(common::gateway_config(upstream, renderer.port())).await;
    let client = common::client();

    // Static asset, blacklisted by default.
    let asset = client
        .get(format!("http://{}/static/app.js", gateway))
        .header("User-Agent", GOOGLEBOT)
        .send()
        .await
        .unwrap();
    assert_eq!(asset.text().await.unwrap(), LIVE);

    // Not a GET.
    let post = client
        .post(format!("http://{}/products/1", gateway))
        .header("User-Agent", GOOGLEBOT)
        .send()
        .await
        .unwrap();
    assert_eq!(post.status(), StatusCode::OK);

    // Regular visitor without an explicit prerender request.
    let plain = client
        .get(format!("http://{}/products/1", gateway))
        .header("User-Agent", FIREFOX)
        .send()
        .await
        .unwrap();
    assert_eq!(plain.text().await.unwrap(), LIVE);

    assert!(renderer_log.lock().unwrap().is_empty());

    let upstream_requests = upstream_log.lock().unwrap().clone();
    assert_eq!(upstream_requests.len(), 3);
    assert_eq!(upstream_requests[0].path, "/static/app.js");
    assert_eq!(upstream_requests[1].method, "POST");
    assert_eq!(upstream_requests[2].header("x-forwarded-for"), Some("127.0.0.1"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_concurrent_crawlers() {
    let (upstream, _) = common::start_mock_server(|_| MockResponse::ok(LIVE)).await;
    let (renderer, renderer_log) = common::start_mock_server(|_| MockResponse::ok(RENDERED)).await;

    let (gateway, shutdown) = common::start_gateway(common::gateway_config(upstream, renderer.port())).await;
    let client = common::client();

    let concurrency = 10;
    let mut tasks = Vec::new();
    for i in 0..concurrency {
        let client = client.clone();
        let url = format!("http://{}/products/{}", gateway, i);
        tasks.push(tokio::spawn(async move {
            client
                .get(&url)
                .header("User-Agent", GOOGLEBOT)
                .send()
                .await
                .unwrap()
                .text()
                .await
                .unwrap()
        }));
    }

    for task in tasks {
        assert_eq!(task.await.unwrap(), RENDERED);
    }
    assert_eq!(renderer_log.lock().unwrap().len(), concurrency);

    shutdown.trigger();
}

#[tokio::test]
async fn test_stalled_renderer_falls_back_within_request_timeout() {
    let (upstream, upstream_log) = common::start_mock_server(|_| MockResponse::ok(LIVE)).await;
    let renderer = common::start_stalled_server().await;

    let mut config = common::gateway_config(upstream, renderer.port());
    config.timeouts.request_secs = 3;
    config.prerender.timeout_secs = 2;
    config.prerender.crawler_budget_secs = 1;
    assert!(prerender_gateway::config::validation::validate_config(&config).is_ok());
    let (gateway, shutdown) = common::start_gateway(config).await;

    let response = common::client()
        .get(format!("http://{}/products/1", gateway))
        .header("User-Agent", GOOGLEBOT)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), LIVE);
    assert_eq!(upstream_log.lock().unwrap().len(), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_latin1_render_relabeled_as_utf8() {
    let (upstream, _) = common::start_mock_server(|_| MockResponse::ok(LIVE)).await;
    let mut latin1 = b"<html><head><title>Menu</title></head><body><h1>Caf".to_vec();
    latin1.push(0xE9);
    latin1.extend_from_slice(b" du coin</h1><p>Rendered.</p></body></html>");
    let (renderer, _) = common::start_mock_server(move |_| {
        MockResponse::raw(200, "text/html; charset=iso-8859-1", &latin1)
    })
    .await;

    let (gateway, shutdown) = common::start_gateway(common::gateway_config(upstream, renderer.port())).await;

    let response = common::client()
        .get(format!("http://{}/menu", gateway))
        .header("User-Agent", GOOGLEBOT)
        .send()
        .await
        .unwrap();

    assert_eq!(response.headers()["content-type"], "text/html; charset=utf-8");
    let body = response.bytes().await.unwrap();
    assert!(body.windows(2).any(|w| w == [0xC3, 0xA9]));
    assert!(String::from_utf8(body.to_vec()).unwrap().contains("Café du coin"));

    shutdown.trigger();
}
