//! Inbound request handling.
//!
//! # Responsibilities
//! - Hold the parts of the inbound request the relay needs
//! - Find the destination URL embedded in the XML body
//! - Prepare the header map for the outbound request
//!
//! # Design Decisions
//! - The body is taken as raw bytes; `Content-Type` is ignored because the
//!   client labels XML as `application/x-www-form-urlencoded`
//! - The destination is found by plain text search, not XML parsing
//! - A missing closing marker is an error, a missing opening marker is not

use std::borrow::Cow;
use std::net::IpAddr;

use axum::body::Bytes;
use axum::http::HeaderMap;
use url::Url;

use crate::config::Scheme;
use crate::http::headers::{filter_headers, set_forwarding_headers, REQUEST_HEADERS_TO_EXCLUDE};

pub const REDIRECT_URL_OPEN: &str = "<redirect_url>";
pub const REDIRECT_URL_CLOSE: &str = "</redirect_url>";

/// The inbound request as seen by the relay.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub headers: HeaderMap,
    pub body: Bytes,
    pub remote_addr: IpAddr,
    pub scheme: Scheme,
}

impl InboundRequest {
    /// Text view of the body used for marker search. Invalid UTF-8 is
    /// replaced; the forwarded body is always the original bytes.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Filtered inbound headers plus the forwarding headers.
    pub fn outbound_headers(&self) -> HeaderMap {
        let mut headers = filter_headers(&self.headers, REQUEST_HEADERS_TO_EXCLUDE);
        set_forwarding_headers(&mut headers, &self.headers, self.remote_addr, self.scheme);
        headers
    }
}

/// `<redirect_url>` was found without a usable `</redirect_url>` after it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`<redirect_url>` at byte {open} has no `</redirect_url>` after it")]
pub struct UnterminatedMarker {
    pub open: usize,
}

/// Destination text that is not a URL the relay can POST to.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidDestination {
    #[error("not an absolute URL: {0}")]
    Parse(#[from] url::ParseError),

    #[error("unsupported scheme `{0}`")]
    UnsupportedScheme(String),
}

/// Find the destination between the first `<redirect_url>` and the first
/// `</redirect_url>` in `body`.
///
/// Returns `Ok(None)` when there is no opening marker. Both markers are
/// searched from the start of the body, so a closing marker that only
/// appears before the opening one is also an error.
pub fn extract_destination(body: &str) -> Result<Option<&str>, UnterminatedMarker> {
    let Some(open) = body.find(REDIRECT_URL_OPEN) else {
        return Ok(None);
    };
    let start = open + REDIRECT_URL_OPEN.len();
    match body.find(REDIRECT_URL_CLOSE) {
        Some(end) if end >= start => Ok(Some(&body[start..end])),
        _ => Err(UnterminatedMarker { open }),
    }
}

/// Parse extracted destination text into an absolute http(s) URL.
pub fn parse_destination(destination: &str) -> Result<Url, InvalidDestination> {
    let url = Url::parse(destination)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(InvalidDestination::UnsupportedScheme(other.to_string())),
    }
}
