//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router fronting the live application
//! - Wire up middleware (request ID, tracing, timeout, prerender)
//! - Forward everything the prerender layer passes on to the upstream
//! - Serve until the shutdown signal fires
//!
//! # Layer Order
//! ```text
//! SetRequestId → Trace → PropagateRequestId → Timeout → prerender → upstream
//! ```

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{
        uri::{Authority, InvalidUri, PathAndQuery, Scheme},
        Request, StatusCode, Uri, Version,
    },
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::prerender::{prerender_middleware, Prerender};
use crate::lifecycle::shutdown;
use crate::security::headers::{append_forwarded_for, strip_hop_by_hop};

/// State for the upstream forwarding handler.
#[derive(Clone)]
pub struct UpstreamState {
    client: Client<HttpConnector, Body>,
    authority: Authority,
}

impl UpstreamState {
    pub fn new(address: &str) -> Result<Self, InvalidUri> {
        Ok(Self {
            client: Client::builder(TokioExecutor::new()).build(HttpConnector::new()),
            authority: Authority::from_str(address)?,
        })
    }
}

/// HTTP server for the prerender gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &GatewayConfig, prerender: Arc<Prerender>) -> Result<Self, InvalidUri> {
        let upstream = UpstreamState::new(&config.upstream.address)?;
        Ok(Self {
            router: Self::build_router(config, upstream, prerender),
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, upstream: UpstreamState, prerender: Arc<Prerender>) -> Router {
        Router::new()
            .fallback(upstream_handler)
            .with_state(upstream)
            .layer(middleware::from_fn_with_state(prerender, prerender_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The assembled router, for driving the gateway without a socket.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Forward a request to the live application.
async fn upstream_handler(State(state): State<UpstreamState>, request: Request<Body>) -> Response {
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let (mut parts, body) = request.into_parts();

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(state.authority.clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::warn!(uri = %parts.uri, error = %e, "Cannot rewrite upstream URI");
            return (StatusCode::BAD_REQUEST, "Invalid request URI").into_response();
        }
    };
    parts.version = Version::HTTP_11;

    strip_hop_by_hop(&mut parts.headers);
    if let Some(ip) = client_ip {
        append_forwarded_for(&mut parts.headers, ip);
    }

    let path = parts.uri.path().to_string();
    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => relay(response),
        Err(e) => {
            tracing::error!(upstream = %state.authority, path = %path, error = %e, "Upstream error");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

/// Relay an upstream response to the client.
fn relay(response: hyper::Response<hyper::body::Incoming>) -> Response {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}
