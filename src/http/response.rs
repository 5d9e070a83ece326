//! Response construction for prerendered content.
//!
//! # Responsibilities
//! - Turn cached snapshots into 200 HTML responses
//! - Turn renderer responses into client responses (status and headers kept)
//! - Map the not-found signal to a 404
//!
//! # Design Decisions
//! - Hop-by-hop, length and encoding headers are dropped; the body is re-framed
//! - Renderer status is passed through untouched, soft codes or not

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::render::{RenderOutcome, RenderedPage};
use crate::security::headers::strip_hop_by_hop;

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// A cached snapshot served as-is.
pub fn snapshot_response(html: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE))],
        html,
    )
        .into_response()
}

pub fn not_found_response() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

/// A renderer response relayed to the client.
pub fn page_response(page: RenderedPage) -> Response {
    let RenderedPage {
        status,
        mut headers,
        body,
    } = page;

    strip_hop_by_hop(&mut headers);
    headers.remove(header::CONTENT_LENGTH);
    headers.remove(header::CONTENT_ENCODING);
    if !headers.contains_key(header::CONTENT_TYPE) {
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
    }

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

pub fn outcome_response(outcome: RenderOutcome) -> Response {
    match outcome {
        RenderOutcome::Rendered(page) => page_response(page),
        RenderOutcome::NotFound => not_found_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    #[tokio::test]
    async fn test_page_response_keeps_status_and_location() {
        let mut headers = HeaderMap::new();
        headers.insert(header::LOCATION, HeaderValue::from_static("https://example.com/new"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("999"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));

        let response = page_response(RenderedPage {
            status: StatusCode::MOVED_PERMANENTLY,
            headers,
            body: String::new(),
        });

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[header::LOCATION], "https://example.com/new");
        assert!(!response.headers().contains_key(header::TRANSFER_ENCODING));
        assert!(!response.headers().contains_key(header::CONTENT_LENGTH));
        assert_eq!(response.headers()[header::CONTENT_TYPE], HTML_CONTENT_TYPE);
    }

    #[tokio::test]
    async fn test_snapshot_response_body() {
        let response = snapshot_response("<html>cached</html>".to_string());
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"<html>cached</html>");
    }

    #[test]
    fn test_not_found_outcome() {
        assert_eq!(
            outcome_response(RenderOutcome::NotFound).status(),
            StatusCode::NOT_FOUND
        );
    }
}
