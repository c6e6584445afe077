//! Outbound request execution.
//!
//! # Responsibilities
//! - Build a client per call (fixed total timeout, optional TLS bypass)
//! - Construct the request: method, target URL, body, headers
//! - Execute and read the whole response body into memory
//!
//! # Design Decisions
//! - No retries; the first failure ends the call
//! - The target's status and headers are dropped, only the body is relayed
//! - Errors are rendered as text by the caller, never as a status code

use std::time::Duration;

use thiserror::Error;

use crate::config::TimeoutConfig;
use crate::relay::descriptor::RequestDescriptor;
use crate::relay::target::build_target_url;

/// Failures while relaying one request.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The outbound client could not be built.
    #[error("building client: {0}")]
    Client(#[source] reqwest::Error),

    /// The assembled target URL does not parse.
    #[error("parse {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Request construction failed (bad header name or value).
    #[error("{0}")]
    Request(#[source] reqwest::Error),

    /// Network, TLS or timeout failure while executing the request.
    #[error("{0}")]
    Send(#[source] reqwest::Error),

    /// The target's response body could not be read.
    #[error("{0}")]
    Body(#[source] reqwest::Error),

    /// The detached relay task panicked.
    #[error("relay task failed: {0}")]
    Task(#[source] tokio::task::JoinError),
}

impl RelayError {
    /// Whether the failure happened before the request was sent.
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            RelayError::Client(_) | RelayError::InvalidUrl { .. } | RelayError::Request(_)
        )
    }

    /// Text written into the relay response for this failure.
    pub fn render(&self) -> String {
        match self {
            RelayError::Body(_) => self.to_string(),
            _ => format!("{}\n", self),
        }
    }
}

/// Executes descriptors against their target servers.
#[derive(Debug, Clone)]
pub struct Forwarder {
    timeout: Duration,
}

impl Forwarder {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_config(config: &TimeoutConfig) -> Self {
        Self::new(config.upstream())
    }

    /// Build the client for one call. Certificate validation is skipped
    /// only for https targets with `ignoreSslErrors` set.
    fn client_for(&self, descriptor: &RequestDescriptor) -> Result<reqwest::Client, RelayError> {
        let mut builder = reqwest::Client::builder().timeout(self.timeout);
        if descriptor.skips_tls_verification() {
            builder = builder.danger_accept_invalid_certs(true);
        }
        builder.build().map_err(RelayError::Client)
    }

    fn build_request(
        client: &reqwest::Client,
        descriptor: &RequestDescriptor,
        url: &str,
    ) -> Result<reqwest::Request, RelayError> {
        let target = reqwest::Url::parse(url).map_err(|source| RelayError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let mut request = client.request(descriptor.method.clone(), target);
        if !descriptor.body.is_empty() {
            request = request.body(descriptor.body.clone());
        }
        // RequestBuilder::header appends, so repeated names accumulate.
        for (name, value) in &descriptor.headers {
            request = request.header(name.as_str(), value.as_slice());
        }

        request.build().map_err(RelayError::Request)
    }

    /// Issue the outbound request and return the target's body.
    pub async fn forward(&self, descriptor: &RequestDescriptor) -> Result<Vec<u8>, RelayError> {
        let client = self.client_for(descriptor)?;
        let url = build_target_url(descriptor);
        let request = Self::build_request(&client, descriptor, &url)?;

        tracing::debug!(
            method = %descriptor.method,
            url = %url,
            skip_tls_verify = descriptor.skips_tls_verification(),
            "Forwarding request"
        );

        let response = client.execute(request).await.map_err(RelayError::Send)?;
        let status = response.status();
        let body = response.bytes().await.map_err(RelayError::Body)?;

        tracing::debug!(url = %url, status = %status, bytes = body.len(), "Target responded");
        Ok(body.to_vec())
    }

    /// Like [`Forwarder::forward`], but the call runs on its own task so it
    /// completes (or times out) even if the caller is dropped.
    pub async fn forward_detached(
        &self,
        descriptor: RequestDescriptor,
    ) -> Result<Vec<u8>, RelayError> {
        let forwarder = self.clone();
        tokio::spawn(async move { forwarder.forward(&descriptor).await })
            .await
            .map_err(RelayError::Task)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::descriptor::translate;
    use reqwest::Method;

    fn forwarder() -> Forwarder {
        Forwarder::new(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn malformed_url_is_construction_error() {
        let d = translate(Method::POST, "host=example.com");
        let err = forwarder().forward(&d).await.unwrap_err();
        assert!(matches!(err, RelayError::InvalidUrl { .. }));
        assert!(err.is_construction());
        assert!(err.render().starts_with("parse \"://example.com\": "));
        assert!(err.render().ends_with('\n'));
    }

    #[tokio::test]
    async fn invalid_header_name_is_construction_error() {
        let d = translate(Method::POST, "protocol=http&host=127.0.0.1&port=1&_Bad%20Name=1");
        let err = forwarder().forward(&d).await.unwrap_err();
        assert!(matches!(err, RelayError::Request(_)));
        assert!(err.is_construction());
    }

    #[tokio::test]
    async fn unreachable_target_is_send_error() {
        let d = translate(Method::PUT, "protocol=http&host=127.0.0.1&port=1&path=/");
        let err = forwarder().forward(&d).await.unwrap_err();
        assert!(matches!(err, RelayError::Send(_)));
        assert!(!err.is_construction());
        assert!(err.render().ends_with('\n'));
    }

    #[tokio::test]
    async fn detached_forward_reports_same_errors() {
        let d = translate(Method::POST, "protocol=http&host=127.0.0.1&port=1");
        let err = forwarder().forward_detached(d).await.unwrap_err();
        assert!(matches!(err, RelayError::Send(_)));
    }

    #[test]
    fn timeout_comes_from_config() {
        let forwarder = Forwarder::from_config(&TimeoutConfig { upstream_secs: 7 });
        assert_eq!(forwarder.timeout, Duration::from_secs(7));
    }
}
