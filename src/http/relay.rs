//! The relay handler.
//!
//! # Data Flow
//! ```text
//! POST body (raw bytes)
//!     → extract_destination (<redirect_url>…</redirect_url>)
//!     → outbound headers (filtered + X-Forwarded-*)
//!     → Upstream::post (exactly one attempt)
//!     → relay_response (status, filtered headers, streamed body)
//! ```
//!
//! # Failure Handling
//! - No `<redirect_url>`, or a destination that is not an http(s) URL: 400
//! - `<redirect_url>` with no closing marker: `RelayError`, answered as 500
//! - Upstream failure: the status carried by `UpstreamError`

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::config::Scheme;
use crate::http::request::{extract_destination, parse_destination, InboundRequest, UnterminatedMarker};
use crate::http::response::relay_response;
use crate::observability::metrics::{self, Outcome};
use crate::upstream::Upstream;

/// Body sent back when the request carries no destination.
pub const NO_DESTINATION_BODY: &str = "No proxy address specified\n";

/// Shared, read-only handler state.
pub struct RelayState<U> {
    pub upstream: U,
    pub scheme: Scheme,
}

/// Failures the handler does not recover from. Answered as a bare 500.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("malformed destination marker: {0}")]
    UnterminatedMarker(#[from] UnterminatedMarker),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Relay failed");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

/// Axum entry point for `POST` on the relay path.
pub async fn relay_handler<U: Upstream>(
    State(state): State<Arc<RelayState<U>>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RelayError> {
    let inbound = InboundRequest {
        headers,
        body,
        remote_addr: peer.ip().to_canonical(),
        scheme: state.scheme,
    };
    relay(&state.upstream, inbound).await
}

/// Relay one request to the destination named in its body.
pub async fn relay<U: Upstream>(
    upstream: &U,
    inbound: InboundRequest,
) -> Result<Response, RelayError> {
    let start_time = Instant::now();

    tracing::debug!(
        remote_addr = %inbound.remote_addr,
        body_len = inbound.body.len(),
        content_type = ?inbound.headers.get(CONTENT_TYPE),
        "Relay request received"
    );

    let destination = match extract_destination(&inbound.body_text()) {
        Ok(Some(text)) => parse_destination(text),
        Ok(None) => {
            tracing::warn!(remote_addr = %inbound.remote_addr, "No proxy address in request body");
            metrics::record_request(StatusCode::BAD_REQUEST, Outcome::NoDestination, start_time);
            return Ok((StatusCode::BAD_REQUEST, NO_DESTINATION_BODY).into_response());
        }
        Err(err) => {
            metrics::record_request(StatusCode::INTERNAL_SERVER_ERROR, Outcome::Failed, start_time);
            return Err(err.into());
        }
    };

    let destination = match destination {
        Ok(url) => url,
        Err(err) => {
            tracing::warn!(error = %err, "Invalid proxy address in request body");
            metrics::record_request(StatusCode::BAD_REQUEST, Outcome::InvalidDestination, start_time);
            return Ok((StatusCode::BAD_REQUEST, format!("Invalid proxy address: {err}\n")).into_response());
        }
    };

    let headers = inbound.outbound_headers();
    tracing::debug!(
        destination = %destination,
        header_count = headers.len(),
        "Request headers extracted"
    );

    match upstream.post(destination.clone(), headers, inbound.body).await {
        Ok(response) => {
            tracing::info!(
                destination = %destination,
                status = response.status.as_u16(),
                "Upstream responded"
            );
            metrics::record_request(response.status, Outcome::Relayed, start_time);
            Ok(relay_response(response))
        }
        Err(err) => {
            tracing::warn!(
                destination = %destination,
                status = err.status.as_u16(),
                error = %err.message,
                "Upstream call failed"
            );
            metrics::record_request(err.status, Outcome::UpstreamError, start_time);
            Ok(err.status.into_response())
        }
    }
}
