//! Outbound HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! relay handler
//!     → Upstream::post(destination, headers, body)
//!     → client.rs (reqwest, one POST, no retry)
//!     → UpstreamResponse { status, headers, streaming body }
//!       or UpstreamError { status, message }
//! ```
//!
//! # Design Decisions
//! - The handler depends on the `Upstream` trait, not on reqwest, so tests
//!   can swap in a recording fake
//! - Every transport failure is mapped to an HTTP status here; the handler
//!   never inspects client-specific error types

pub mod client;

pub use client::ReqwestUpstream;

use std::future::Future;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, StatusCode};
use url::Url;

/// Response produced by the destination.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
}

/// Failure of the outbound call, already mapped to a status code.
///
/// `message` is diagnostic text for logs only.
#[derive(Debug, thiserror::Error)]
#[error("upstream call failed with {status}: {message}")]
pub struct UpstreamError {
    pub status: StatusCode,
    pub message: String,
}

impl UpstreamError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// The outbound HTTP client contract: one POST per call.
pub trait Upstream: Send + Sync + 'static {
    fn post(
        &self,
        destination: Url,
        headers: HeaderMap,
        body: Bytes,
    ) -> impl Future<Output = Result<UpstreamResponse, UpstreamError>> + Send;
}

impl<T: Upstream> Upstream for Arc<T> {
    fn post(
        &self,
        destination: Url,
        headers: HeaderMap,
        body: Bytes,
    ) -> impl Future<Output = Result<UpstreamResponse, UpstreamError>> + Send {
        (**self).post(destination, headers, body)
    }
}
