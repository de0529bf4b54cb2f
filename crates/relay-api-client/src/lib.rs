//! Client for the remote conversion service.
//!
//! This crate posts JSON conversion requests to the service behind a
//! command's base URL and hands back the raw response. Interpreting the
//! status code is left to the caller.

use std::sync::Arc;

use anyhow::{Context, Result};
use http_body_util::Full;
use hyper::{body::Bytes, Method, Request};
use relay_api_types::RelayRequest;
use serde::Serialize;

pub mod transport;

pub use transport::{build_connector, Connector, RelayResponse, TransportConfig};

/// Client for communicating with the conversion service.
pub struct RelayClient {
    config: TransportConfig,
    connector: Arc<dyn Connector>,
}

impl RelayClient {
    /// Create a new client with the given transport settings.
    pub fn new(config: TransportConfig) -> Self {
        let connector = build_connector(&config);
        Self {
            config,
            connector: Arc::from(connector),
        }
    }

    /// Create a client over a caller-supplied connector.
    pub fn with_connector(connector: Arc<dyn Connector>) -> Self {
        Self {
            config: TransportConfig::default(),
            connector,
        }
    }

    /// Access the transport configuration used by this client.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Optional human-readable endpoint for telemetry.
    pub fn transport_endpoint(&self) -> Option<String> {
        self.connector.endpoint()
    }

    /// Send a conversion request to the service rooted at `base_url`.
    pub async fn convert(&self, base_url: &str, request: &RelayRequest) -> Result<RelayResponse> {
        let url = request.endpoint().url(base_url);
        self.post_json(&url, request)
            .await
            .with_context(|| format!("Failed to reach conversion service at {url}"))
    }

    /// Make a POST request with JSON body.
    pub async fn post_json<T: Serialize>(&self, url: &str, body: &T) -> Result<RelayResponse> {
        let uri = self
            .connector
            .build_uri(url)
            .context("Failed to build POST URI")?;
        let json_body = serde_json::to_vec(body).context("Failed to serialize request body")?;

        let mut request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Full::new(Bytes::from(json_body)))
            .context("Failed to build POST request")?;

        self.connector.prepare_request(&mut request);

        tracing::debug!(target: "cmdrelay::client", url, "posting conversion request");
        self.connector
            .execute(request)
            .await
            .context("Failed to send POST request")
    }
}

impl Default for RelayClient {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use relay_api_types::{PdfFromHtmlRequest, PdfFromUrlRequest};
    use serde_json::json;

    #[tokio::test]
    async fn convert_posts_url_request_as_json() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/pdf-from-url")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "url": "https://x.test/doc",
                "options": "--quiet"
            })))
            .with_status(200)
            .with_body("%PDF-1.7")
            .create_async()
            .await;

        let client = RelayClient::default();
        let request = RelayRequest::FromUrl(PdfFromUrlRequest {
            url: "https://x.test/doc".to_string(),
            options: "--quiet".to_string(),
        });
        let response = client.convert(&server.url(), &request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.status(), 200);
        assert_eq!(response.body().as_ref(), b"%PDF-1.7");
    }

    #[tokio::test]
    async fn convert_returns_error_statuses_without_failing() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/pdf-from-html")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = RelayClient::default();
        let request = RelayRequest::FromHtml(PdfFromHtmlRequest {
            html_content: Some("<p>hi</p>".to_string()),
            options: String::new(),
        });
        let response = client.convert(&server.url(), &request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.status(), 500);
    }

    #[tokio::test]
    async fn unreachable_service_is_an_error() {
        let client = RelayClient::new(TransportConfig::with_connect_timeout(
            std::time::Duration::from_secs(2),
        ));
        let request = RelayRequest::FromHtml(PdfFromHtmlRequest {
            html_content: None,
            options: String::new(),
        });
        // Port 9 (discard) on localhost is expected to refuse connections.
        let err = client
            .convert("http://127.0.0.1:9", &request)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("Failed to reach conversion service"));
    }

    #[tokio::test]
    async fn test_client_reports_transport() {
        let client = RelayClient::default();
        assert_eq!(client.transport_endpoint().as_deref(), Some("HTTP/1.1"));
        assert!(client.config().connect_timeout.is_none());
    }
}
