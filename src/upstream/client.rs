//! reqwest-backed outbound client.
//!
//! # Responsibilities
//! - Issue the single outbound POST
//! - Hand the response body back as a stream, unbuffered
//! - Map transport failures to gateway status codes
//!
//! # Design Decisions
//! - Redirects are not followed; 3xx responses go back to the caller as-is
//! - Destinations are dialed directly; `HTTP_PROXY` and friends are ignored
//! - `Host` comes from the destination URL, never from the inbound request.
//!   It survives the request exclusion set, so it is removed here; a copied
//!   `Host` would name the relay instead of the destination
//! - Header names go out title-cased (`X-Forwarded-For`) on HTTP/1
//! - Timeouts are only set when configured

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header::HOST, HeaderMap, StatusCode};
use reqwest::redirect::Policy;
use url::Url;

use crate::config::TimeoutConfig;
use crate::upstream::{Upstream, UpstreamError, UpstreamResponse};

/// Production [`Upstream`] built on a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestUpstream {
    client: reqwest::Client,
}

impl ReqwestUpstream {
    /// Build the client, applying any configured timeouts.
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .redirect(Policy::none())
            .no_proxy()
            .http1_title_case_headers();

        if let Some(secs) = timeouts.connect_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = timeouts.request_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl Upstream for ReqwestUpstream {
    async fn post(
        &self,
        destination: Url,
        mut headers: HeaderMap,
        body: Bytes,
    ) -> Result<UpstreamResponse, UpstreamError> {
        headers.remove(HOST);

        let response = self
            .client
            .post(destination)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = Body::from_stream(response.bytes_stream());

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        let status = if err.is_timeout() {
            StatusCode::GATEWAY_TIMEOUT
        } else {
            StatusCode::BAD_GATEWAY
        };
        UpstreamError::new(status, err.to_string())
    }
}
