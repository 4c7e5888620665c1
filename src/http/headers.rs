//! Header filtering across the relay boundary.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Strip `Content-Length`/`Cookie` going out and `Set-Cookie` coming back
//! - Add X-Forwarded-For and X-Forwarded-Proto to the outbound request
//!
//! # Design Decisions
//! - Exclusion lists are constants; names compare case-insensitively
//! - Every value of a multi-valued header is kept, in arrival order

use std::net::IpAddr;

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::config::Scheme;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Never copied from the inbound request to the outbound one.
pub const REQUEST_HEADERS_TO_EXCLUDE: &[&str] = &[
    "Connection",
    "Keep-Alive",
    "Proxy-Authenticate",
    "Proxy-Authorization",
    "TE",
    "Trailers",
    "Transfer-Encoding",
    "Upgrade",
    "Content-Length",
    "Cookie",
];

/// Never copied from the outbound response to the inbound one.
pub const RESPONSE_HEADERS_TO_EXCLUDE: &[&str] = &[
    "Connection",
    "Keep-Alive",
    "Proxy-Authenticate",
    "Proxy-Authorization",
    "TE",
    "Trailers",
    "Transfer-Encoding",
    "Upgrade",
    "Set-Cookie",
];

pub fn is_excluded(name: &str, excluded: &[&str]) -> bool {
    excluded.iter().any(|h| name.eq_ignore_ascii_case(h))
}

/// Copy every header value whose name is not in `excluded`.
pub fn filter_headers(source: &HeaderMap, excluded: &[&str]) -> HeaderMap {
    let mut filtered = HeaderMap::with_capacity(source.len());
    for (name, value) in source {
        if !is_excluded(name.as_str(), excluded) {
            filtered.append(name.clone(), value.clone());
        }
    }
    filtered
}

/// Set the forwarding headers on an outbound header map.
///
/// The caller's address is appended to the first inbound `X-Forwarded-For`
/// value. Both headers replace whatever was copied from the inbound request,
/// so the destination sees exactly one of each.
pub fn set_forwarding_headers(
    outbound: &mut HeaderMap,
    inbound: &HeaderMap,
    remote_addr: IpAddr,
    scheme: Scheme,
) {
    let remote = remote_addr.to_string();
    let chain = inbound
        .get(&X_FORWARDED_FOR)
        .and_then(|existing| {
            let mut value = existing.as_bytes().to_vec();
            value.extend_from_slice(b", ");
            value.extend_from_slice(remote.as_bytes());
            HeaderValue::from_bytes(&value).ok()
        })
        .or_else(|| HeaderValue::from_str(&remote).ok());

    if let Some(chain) = chain {
        outbound.insert(X_FORWARDED_FOR, chain);
    }
    outbound.insert(X_FORWARDED_PROTO, HeaderValue::from_static(scheme.as_str()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        map
    }

    #[test]
    fn request_filter_drops_every_excluded_name() {
        let inbound = headers(&[
            ("connection", "keep-alive"),
            ("keep-alive", "timeout=5"),
            ("proxy-authenticate", "Basic"),
            ("proxy-authorization", "Basic Zm9v"),
            ("te", "trailers"),
            ("trailers", "x-checksum"),
            ("transfer-encoding", "chunked"),
            ("upgrade", "h2c"),
            ("content-length", "42"),
            ("cookie", "JSESSIONID=abc"),
            ("content-type", "application/x-www-form-urlencoded"),
            ("x-custom", "kept"),
        ]);

        let filtered = filter_headers(&inbound, REQUEST_HEADERS_TO_EXCLUDE);

        assert_eq!(filtered.len(), 2);
        assert_eq!(
            filtered["content-type"],
            "application/x-www-form-urlencoded"
        );
        assert_eq!(filtered["x-custom"], "kept");
    }

    #[test]
    fn response_filter_keeps_cookie_and_length_but_drops_set_cookie() {
        let outbound = headers(&[
            ("set-cookie", "a=1"),
            ("set-cookie", "b=2"),
            ("transfer-encoding", "chunked"),
            ("content-length", "10"),
            ("cookie", "odd-but-allowed"),
        ]);

        let filtered = filter_headers(&outbound, RESPONSE_HEADERS_TO_EXCLUDE);

        assert!(filtered.get("set-cookie").is_none());
        assert!(filtered.get("transfer-encoding").is_none());
        assert_eq!(filtered["content-length"], "10");
        assert_eq!(filtered["cookie"], "odd-but-allowed");
    }

    #[test]
    fn multi_valued_headers_keep_all_values_in_order() {
        let inbound = headers(&[
            ("accept", "text/xml"),
            ("x-trace", "one"),
            ("accept", "application/xml"),
            ("x-trace", "two"),
        ]);

        let filtered = filter_headers(&inbound, REQUEST_HEADERS_TO_EXCLUDE);

        let accept: Vec<_> = filtered.get_all("accept").iter().collect();
        assert_eq!(accept, vec!["text/xml", "application/xml"]);
        let trace: Vec<_> = filtered.get_all("x-trace").iter().collect();
        assert_eq!(trace, vec!["one", "two"]);
    }

    #[test]
    fn exclusion_is_case_insensitive() {
        assert!(is_excluded("CONNECTION", REQUEST_HEADERS_TO_EXCLUDE));
        assert!(is_excluded("te", REQUEST_HEADERS_TO_EXCLUDE));
        assert!(is_excluded("Set-cookie", RESPONSE_HEADERS_TO_EXCLUDE));
        assert!(!is_excluded("Cookie", RESPONSE_HEADERS_TO_EXCLUDE));
        assert!(!is_excluded("Set-Cookie", REQUEST_HEADERS_TO_EXCLUDE));
    }

    #[test]
    fn forwarded_for_appends_caller_to_existing_chain() {
        let inbound = headers(&[("x-forwarded-for", "10.0.0.5")]);
        let mut outbound = filter_headers(&inbound, REQUEST_HEADERS_TO_EXCLUDE);

        set_forwarding_headers(
            &mut outbound,
            &inbound,
            "10.0.0.9".parse().unwrap(),
            Scheme::Http,
        );

        let chain: Vec<_> = outbound.get_all(&X_FORWARDED_FOR).iter().collect();
        assert_eq!(chain, vec!["10.0.0.5, 10.0.0.9"]);
        assert_eq!(outbound[&X_FORWARDED_PROTO], "http");
    }

    #[test]
    fn forwarded_for_starts_chain_when_absent() {
        let mut outbound = HeaderMap::new();

        set_forwarding_headers(
            &mut outbound,
            &HeaderMap::new(),
            "2001:db8::1".parse().unwrap(),
            Scheme::Https,
        );

        assert_eq!(outbound[&X_FORWARDED_FOR], "2001:db8::1");
        assert_eq!(outbound[&X_FORWARDED_PROTO], "https");
    }

    #[test]
    fn forwarded_proto_replaces_inbound_value() {
        let inbound = headers(&[("x-forwarded-proto", "https")]);
        let mut outbound = filter_headers(&inbound, REQUEST_HEADERS_TO_EXCLUDE);

        set_forwarding_headers(
            &mut outbound,
            &inbound,
            "127.0.0.1".parse().unwrap(),
            Scheme::Http,
        );

        let proto: Vec<_> = outbound.get_all(&X_FORWARDED_PROTO).iter().collect();
        assert_eq!(proto, vec!["http"]);
    }
}
