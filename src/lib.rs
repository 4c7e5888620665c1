//! XML relay library.
//!
//! Accepts POSTs whose XML body names a destination in `<redirect_url>`,
//! forwards body and filtered headers there, and mirrors the response back.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod upstream;

pub use config::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
