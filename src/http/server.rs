//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the `/post` and `/put` handlers
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener
//! - Translate each inbound GET and relay it with the route's method
//!
//! Every relayed call answers 200. Target status codes are not propagated
//! and relay failures appear only as text in the body.

use axum::{
    body::{Body, Bytes},
    extract::{RawQuery, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures_util::{stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::http::request::{request_id_header, MakeRequestUuid, X_REQUEST_ID};
use crate::relay::{build_target_url, translate, Forwarder, RequestDescriptor};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<Forwarder>,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Self {
        let state = AppState {
            forwarder: Arc::new(Forwarder::from_config(&config.timeouts)),
        };

        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Only GET (and HEAD, which axum derives from it) is relayed; any other
    /// inbound method on `/post` or `/put` gets 405. Earlier deployments of
    /// this relay accepted every method on both paths.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/post", get(to_post))
            .route("/put", get(to_put))
            .with_state(state)
            .layer(PropagateRequestIdLayer::new(request_id_header()))
            .layer(SetRequestIdLayer::new(request_id_header(), MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// The configured router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream_timeout_secs = self.config.timeouts.upstream_secs,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn to_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    relay(&state, Method::POST, &headers, query).await
}

async fn to_put(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    relay(&state, Method::PUT, &headers, query).await
}

/// Translate the query, optionally dump the descriptor, then forward.
///
/// In debug mode the dump is the first body chunk and is sent before the
/// outbound request is issued; the target's body (or error text) follows.
async fn relay(
    state: &AppState,
    method: Method,
    headers: &HeaderMap,
    query: Option<String>,
) -> Response {
    let request_id = headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let descriptor = translate(method, query.as_deref().unwrap_or_default());

    tracing::debug!(
        request_id = %request_id,
        method = %descriptor.method,
        host = %descriptor.host,
        path = %descriptor.path,
        "Relaying request"
    );

    if !descriptor.debug {
        let out = outcome(&state.forwarder, descriptor, &request_id).await;
        return (StatusCode::OK, out).into_response();
    }

    let mut dump = descriptor.debug_dump();
    dump.extend_from_slice(format!("urlString: {}\n", build_target_url(&descriptor)).as_bytes());

    let forwarder = state.forwarder.clone();
    let rest = stream::once(async move {
        let out = outcome(&forwarder, descriptor, &request_id).await;
        Ok::<_, Infallible>(Bytes::from(out))
    });
    let body = stream::iter([Ok::<_, Infallible>(Bytes::from(dump))]).chain(rest);

    (StatusCode::OK, Body::from_stream(body)).into_response()
}

/// Target body on success, rendered error text otherwise.
async fn outcome(forwarder: &Forwarder, descriptor: RequestDescriptor, request_id: &str) -> Vec<u8> {
    match forwarder.forward_detached(descriptor).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(
                request_id = %request_id,
                construction = e.is_construction(),
                error = %e,
                "Relay failed"
            );
            e.render().into_bytes()
        }
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
