//! Request ID generation.
//!
//! Every request is tagged with an ID for its log span and response. A
//! caller-sent `x-request-id` is reused as-is. Otherwise a UUID v4 is
//! generated and kept in a request extension only: the inbound headers are
//! never modified, so a generated ID is not forwarded to the destination.

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// The ID assigned to the current request.
#[derive(Debug, Clone)]
pub struct RequestId(pub HeaderValue);

/// A fresh UUID v4 request ID.
pub fn new_request_id() -> HeaderValue {
    HeaderValue::from_str(&Uuid::new_v4().to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
}

/// Tag the request with an ID and copy it onto the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(&X_REQUEST_ID)
        .cloned()
        .unwrap_or_else(new_request_id);
    request.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next.run(request).await;
    response.headers_mut().entry(X_REQUEST_ID).or_insert(id);
    response
}

/// The request's ID for log spans, or `"unknown"`.
pub fn request_id_of(request: &axum::http::Request<Body>) -> &str {
    request
        .extensions()
        .get::<RequestId>()
        .map(|id| &id.0)
        .or_else(|| request.headers().get(&X_REQUEST_ID))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, middleware::from_fn, routing::post, Router};
    use tower::ServiceExt;

    async fn seen_header(request: axum::http::Request<Body>) -> (StatusCode, String) {
        let sent = request.headers().contains_key(&X_REQUEST_ID);
        (StatusCode::OK, format!("{sent}:{}", request_id_of(&request)))
    }

    fn app() -> Router {
        Router::new()
            .route("/", post(seen_header))
            .layer(from_fn(request_id_middleware))
    }

    #[test]
    fn generates_distinct_uuids() {
        let a = new_request_id();
        let b = new_request_id();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.to_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn generated_id_stays_out_of_request_headers() {
        let response = app()
            .oneshot(axum::http::Request::post("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let id = response.headers()[&X_REQUEST_ID].to_str().unwrap().to_string();
        assert!(Uuid::parse_str(&id).is_ok());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, format!("false:{id}").as_bytes());
    }

    #[tokio::test]
    async fn caller_id_is_reused() {
        let response = app()
            .oneshot(
                axum::http::Request::post("/")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[&X_REQUEST_ID], "abc-123");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"true:abc-123");
    }

    #[test]
    fn unknown_without_id() {
        let request = axum::http::Request::new(Body::empty());
        assert_eq!(request_id_of(&request), "unknown");
    }
}
