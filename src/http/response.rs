//! Response handling and transformation.
//!
//! # Responsibilities
//! - Mirror the destination's status onto the caller's response
//! - Copy destination headers minus hop-by-hop headers and `Set-Cookie`
//! - Stream the destination body through unchanged
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Chunks are re-sliced to at most `COPY_BUFFER_SIZE` bytes
//! - A mid-stream upstream failure is passed on, never masked

use axum::body::{Body, Bytes};
use axum::response::Response;
use futures_util::stream::{self, Stream, StreamExt};

use crate::http::headers::{filter_headers, RESPONSE_HEADERS_TO_EXCLUDE};
use crate::observability::metrics;
use crate::upstream::UpstreamResponse;

/// Largest chunk handed to the caller's connection in one write.
pub const COPY_BUFFER_SIZE: usize = 4 * 1024;

/// Build the caller's response from the destination's.
///
/// Status and filtered headers are set before the body starts streaming.
pub fn relay_response(upstream: UpstreamResponse) -> Response {
    let mut response = Response::new(copy_body(upstream.body));
    *response.status_mut() = upstream.status;
    *response.headers_mut() = filter_headers(&upstream.headers, RESPONSE_HEADERS_TO_EXCLUDE);
    response
}

fn copy_body(body: Body) -> Body {
    Body::from_stream(bounded_copy(body.into_data_stream(), |copied| {
        tracing::debug!(bytes = copied, "Response body copied");
        metrics::record_response_bytes(copied);
    }))
}

struct CopyState<S> {
    inner: S,
    pending: Bytes,
    copied: u64,
    on_complete: Option<Box<dyn FnOnce(u64) + Send>>,
    failed: bool,
}

/// Re-chunk `inner` into pieces of at most [`COPY_BUFFER_SIZE`] bytes.
///
/// `on_complete` receives the total byte count once `inner` ends cleanly.
/// After an error from `inner` the stream yields that error and stops.
pub fn bounded_copy<S, E, F>(inner: S, on_complete: F) -> impl Stream<Item = Result<Bytes, E>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin,
    E: Send,
    F: FnOnce(u64) + Send + 'static,
{
    let state = CopyState {
        inner,
        pending: Bytes::new(),
        copied: 0,
        on_complete: Some(Box::new(on_complete)),
        failed: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.failed {
            return None;
        }
        loop {
            if !state.pending.is_empty() {
                let len = state.pending.len().min(COPY_BUFFER_SIZE);
                let chunk = state.pending.split_to(len);
                state.copied += len as u64;
                return Some((Ok(chunk), state));
            }

            match state.inner.next().await {
                Some(Ok(bytes)) => state.pending = bytes,
                Some(Err(err)) => {
                    tracing::warn!(bytes = state.copied, "Upstream body failed mid-stream");
                    state.failed = true;
                    return Some((Err(err), state));
                }
                None => {
                    if let Some(on_complete) = state.on_complete.take() {
                        on_complete(state.copied);
                    }
                    return None;
                }
            }
        }
    })
}
