//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): requests by status and outcome
//! - `relay_request_duration_seconds` (histogram): time until the response
//!   head is ready, by outcome
//! - `relay_response_bytes_total` (counter): body bytes copied to callers

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::StatusCode;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// How a relay request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Relayed,
    NoDestination,
    InvalidDestination,
    UpstreamError,
    Failed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Relayed => "relayed",
            Outcome::NoDestination => "no_destination",
            Outcome::InvalidDestination => "invalid_destination",
            Outcome::UpstreamError => "upstream_error",
            Outcome::Failed => "failed",
        }
    }
}

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(status: StatusCode, outcome: Outcome, start_time: Instant) {
    counter!(
        "relay_requests_total",
        "status" => status.as_u16().to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
    histogram!("relay_request_duration_seconds", "outcome" => outcome.as_str())
        .record(start_time.elapsed().as_secs_f64());
}

pub fn record_response_bytes(bytes: u64) {
    counter!("relay_response_bytes_total").increment(bytes);
}
