//! Shared utilities for integration testing.

use axum::{
    body::Bytes,
    http::{HeaderMap, Method, Uri},
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use method_relay::config::RelayConfig;
use method_relay::http::HttpServer;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Start the relay on an ephemeral port and return its address.
pub async fn start_relay(config: RelayConfig) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config);

    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });
    addr
}

/// Describe the request a backend received, one item per line.
async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Vec<u8> {
    let mut out = format!("method: {}\nuri: {}\n", method, uri).into_bytes();
    for (name, value) in headers.iter() {
        out.extend_from_slice(format!("header {}: ", name).as_bytes());
        out.extend_from_slice(value.as_bytes());
        out.push(b'\n');
    }
    out.extend_from_slice(b"body: ");
    out.extend_from_slice(&body);
    out.push(b'\n');
    out
}

fn echo_router() -> Router {
    Router::new().fallback(echo)
}

/// Start a plain HTTP backend that echoes what it received.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = axum::serve(listener, echo_router()).await;
    });
    addr
}

/// Start an HTTPS echo backend with a self-signed certificate.
pub async fn start_tls_echo_backend() -> SocketAddr {
    let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let config = RustlsConfig::from_pem_file(fixtures.join("cert.pem"), fixtures.join("key.pem"))
        .await
        .unwrap();

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = axum_server::from_tcp_rustls(listener, config)
            .serve(echo_router().into_make_service())
            .await;
    });
    addr
}

/// Start a backend that answers every connection with a fixed status and body.
pub async fn start_fixed_backend(status_line: &'static str, body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;
                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_line,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });
    addr
}

/// Start a backend that accepts connections and never answers.
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// Client used to call the relay.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(20))
        .build()
        .unwrap()
}
