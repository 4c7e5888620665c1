//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, graceful shutdown)
//!     → relay.rs (one inbound POST → one outbound POST)
//!         → request.rs (raw body, destination, outbound headers)
//!         → headers.rs (exclusion sets, X-Forwarded-*)
//!         → [upstream client performs the call]
//!         → response.rs (status, filtered headers, bounded body copy)
//!     → Send to client
//! ```

pub mod headers;
pub mod relay;
pub mod request;
pub mod response;
pub mod server;

pub use relay::{relay, relay_handler, RelayError, RelayState};
pub use request::InboundRequest;
pub use server::{build_router, HttpServer};
