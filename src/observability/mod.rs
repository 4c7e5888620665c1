//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Relay handler and HTTP layers produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, histograms via `metrics`)
//!     → request_id.rs (x-request-id on every request span)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Logging never changes control flow or response content
//! - Request ID flows from the inbound request to the destination
//! - Metrics are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
pub mod request_id;
