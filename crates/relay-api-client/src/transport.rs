//! Transport layer abstraction for service communication.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::{body::Bytes, Request, Response, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

/// Response with its body collected in full.
pub type RelayResponse = Response<Bytes>;

/// Transport options for reaching the conversion service.
#[derive(Debug, Clone, Default)]
pub struct TransportConfig {
    /// Upper bound for establishing the TCP connection. `None` waits for the
    /// operating system's own timeout.
    pub connect_timeout: Option<Duration>,
}

impl TransportConfig {
    pub fn with_connect_timeout(timeout: Duration) -> Self {
        Self {
            connect_timeout: Some(timeout),
        }
    }

    /// Get a human-readable description of this transport.
    pub fn description(&self) -> String {
        match self.connect_timeout {
            Some(timeout) => format!("HTTP/1.1 (connect timeout {}s)", timeout.as_secs()),
            None => "HTTP/1.1".to_string(),
        }
    }
}

/// Common interface implemented by each transport connector.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Human-readable endpoint for diagnostics.
    fn endpoint(&self) -> Option<String>;

    /// Parse and validate the absolute URL of a request.
    fn build_uri(&self, url: &str) -> Result<Uri>;

    /// Allow the connector to adjust the request prior to dispatch (headers, etc.).
    fn prepare_request(&self, _request: &mut Request<Full<Bytes>>) {}

    /// Execute the HTTP request and collect the response body.
    async fn execute(&self, request: Request<Full<Bytes>>) -> Result<RelayResponse>;
}

struct HttpConnectorImpl {
    client: Client<HttpConnector, Full<Bytes>>,
    connect_timeout: Option<Duration>,
}

#[async_trait]
impl Connector for HttpConnectorImpl {
    fn endpoint(&self) -> Option<String> {
        Some(TransportConfig {
            connect_timeout: self.connect_timeout,
        }
        .description())
    }

    fn build_uri(&self, url: &str) -> Result<Uri> {
        let uri: Uri = url
            .parse()
            .with_context(|| format!("Failed to parse service URL {url}"))?;
        match uri.scheme_str() {
            Some("http") => {}
            Some(other) => {
                return Err(anyhow!(
                    "Unsupported scheme '{other}' in {url}; only http:// is supported"
                ))
            }
            None => return Err(anyhow!("Service URL {url} has no scheme")),
        }
        if uri.host().is_none() {
            return Err(anyhow!("Service URL {url} has no host"));
        }
        Ok(uri)
    }

    fn prepare_request(&self, request: &mut Request<Full<Bytes>>) {
        let Some(authority) = request.uri().authority().map(|a| a.to_string()) else {
            return;
        };
        if let Ok(value) = hyper::header::HeaderValue::from_str(&authority) {
            request
                .headers_mut()
                .entry(hyper::header::HOST)
                .or_insert(value);
        }
    }

    async fn execute(&self, request: Request<Full<Bytes>>) -> Result<RelayResponse> {
        let response = self
            .client
            .request(request)
            .await
            .context("Failed to send request over HTTP")?;
        let (parts, body) = response.into_parts();
        let bytes = body
            .collect()
            .await
            .context("Failed to read response body")?
            .to_bytes();
        Ok(Response::from_parts(parts, bytes))
    }
}

/// Build a connector implementation for the requested transport.
pub fn build_connector(config: &TransportConfig) -> Box<dyn Connector> {
    let mut http_connector = HttpConnector::new();
    http_connector.set_connect_timeout(config.connect_timeout);
    let client = Client::builder(TokioExecutor::new()).build(http_connector);
    Box::new(HttpConnectorImpl {
        client,
        connect_timeout: config.connect_timeout,
    })
}
