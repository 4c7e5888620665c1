//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the relay handler
//! - Wire up middleware (request ID, tracing, body limit)
//! - Bind server to listener
//! - Stop accepting on shutdown and drain in-flight requests

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    middleware::from_fn,
    routing::post,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::RelayConfig;
use crate::http::relay::{relay_handler, RelayState};
use crate::observability::request_id::{request_id_middleware, request_id_of};
use crate::upstream::{ReqwestUpstream, Upstream};

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a server that relays through a reqwest client.
    pub fn new(config: RelayConfig) -> Result<Self, reqwest::Error> {
        let upstream = ReqwestUpstream::new(&config.timeouts)?;
        Ok(Self::with_upstream(config, upstream))
    }

    /// Create a server that relays through the given client.
    pub fn with_upstream<U: Upstream>(config: RelayConfig, upstream: U) -> Self {
        let router = build_router(&config, upstream);
        Self { router, config }
    }

    /// Run the server until `shutdown` fires, accepting on `listener`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            path = %self.config.relay.path,
            scheme = %self.config.listener.scheme,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

/// Build the Axum router with all middleware layers.
///
/// `POST` on the relay path, with or without a trailing slash, and anything
/// below it reaches the handler.
pub fn build_router<U: Upstream>(config: &RelayConfig, upstream: U) -> Router {
    let state = Arc::new(RelayState {
        upstream,
        scheme: config.listener.scheme,
    });

    let base = config.relay.path.trim_end_matches('/');
    let mut router = Router::new()
        .route(&format!("{base}/"), post(relay_handler::<U>))
        .route(&format!("{base}/{{*rest}}"), post(relay_handler::<U>));
    if !base.is_empty() {
        router = router.route(base, post(relay_handler::<U>));
    }
    let router = router.with_state(state);

    router
        .layer(DefaultBodyLimit::max(config.relay.max_body_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "relay",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id_of(request),
                    )
                })),
        )
}
