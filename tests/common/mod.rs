//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use xml_relay::config::RelayConfig;
use xml_relay::http::HttpServer;
use xml_relay::lifecycle::Shutdown;

/// What the echo backend saw.
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub type Received = Arc<Mutex<Vec<ReceivedRequest>>>;

async fn echo(
    State(received): State<Received>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let content_type = headers
        .get("content-type")
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));
    received.lock().unwrap().push(ReceivedRequest {
        headers,
        body: body.clone(),
    });

    let mut response_headers = HeaderMap::new();
    response_headers.insert("content-type", content_type);
    response_headers.insert("x-backend", HeaderValue::from_static("echo"));
    response_headers.append("x-multi", HeaderValue::from_static("one"));
    response_headers.append("x-multi", HeaderValue::from_static("two"));
    response_headers.insert("set-cookie", HeaderValue::from_static("JSESSIONID=backend"));
    (StatusCode::OK, response_headers, body)
}

/// Start a backend that records each request and echoes its body.
pub async fn start_echo_backend() -> (SocketAddr, Received) {
    let received: Received = Arc::default();
    let app = Router::new()
        .route("/", post(echo))
        .route("/{*path}", post(echo))
        .with_state(received.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, received)
}

/// Start a raw backend that answers every connection with a fixed response,
/// optionally after a delay.
pub async fn start_fixed_backend(status_line: &'static str, body: &'static str, delay: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 8192];
                        let _ = socket.read(&mut buf).await;
                        tokio::time::sleep(delay).await;
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\nKeep-Alive: timeout=5\r\n\r\n{}",
                            status_line,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });
    addr
}

/// Start the relay on an ephemeral port.
pub async fn start_relay(mut config: RelayConfig) -> (SocketAddr, Shutdown) {
    config.listener.bind_address = "127.0.0.1:0".into();
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    (addr, shutdown)
}

/// Client that never goes through an environment proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// An i2b2-style request body pointing at `destination`.
pub fn xml_for(destination: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <i2b2:request xmlns:i2b2=\"http://www.i2b2.org/xsd/hive/msg/1.1/\">\n\
         <message_header><proxy><redirect_url>{destination}</redirect_url></proxy></message_header>\n\
         <message_body><pm:get_user_configuration/></message_body>\n\
         </i2b2:request>"
    )
}
