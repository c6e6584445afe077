//! GET-to-method relay.
//!
//! Accepts `GET /post` and `GET /put`, rebuilds a full outbound request from
//! the query string and relays the target's body back.
//!
//! ```text
//! GET /post?protocol=https&host=api.example.com&path=/v1/items&_X-Key=k
//!     → http::server (route fixes the method)
//!     → relay::translate (query → descriptor)
//!     → relay::forward (reqwest, 30s timeout, optional TLS bypass)
//!     → POST https://api.example.com/v1/items
//!     ← 200 + target body (or error text)
//! ```

use tokio::net::TcpListener;

use method_relay::config::RelayConfig;
use method_relay::http::HttpServer;
use method_relay::observability::init_logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = RelayConfig::default();
    init_logging(&config.observability);

    tracing::info!("method-relay v{} starting", env!("CARGO_PKG_VERSION"));

    let listener = match TcpListener::bind(&config.listener.bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(
                bind_address = %config.listener.bind_address,
                error = %e,
                "Failed to bind listener"
            );
            return Err(e.into());
        }
    };

    let local_addr = listener.local_addr()?;
    tracing::info!(
        address = %local_addr,
        "Starting server on port {}",
        local_addr.port()
    );

    let server = HttpServer::new(config);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
