//! Single-attempt dispatch of an assembled command to the conversion service.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use hyper::body::Bytes;
use hyper::StatusCode;
use relay_api_client::{Connector, RelayClient, TransportConfig};
use relay_api_types::{PdfFromHtmlRequest, PdfFromUrlRequest, RelayRequest};
use tokio::runtime::{self, Handle, Runtime, RuntimeFlavor};
use tracing::{debug, info};

/// Result of one round trip. Only `200 OK` counts as success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Succeeded(Bytes),
    Rejected(StatusCode),
}

/// Whether `candidate` is an absolute URL with a host.
pub fn is_remote_url(candidate: &str) -> bool {
    url::Url::parse(candidate)
        .map(|url| url.has_host())
        .unwrap_or(false)
}

/// Choose the endpoint and body for one dispatch.
///
/// A remote target that is still a valid URL is converted by address;
/// anything else, including no target at all, is sent as HTML content.
pub fn plan_request(remote_target: Option<&str>, options: String) -> RelayRequest {
    match remote_target {
        Some(target) if is_remote_url(target) => RelayRequest::FromUrl(PdfFromUrlRequest {
            url: target.to_string(),
            options,
        }),
        other => RelayRequest::FromHtml(PdfFromHtmlRequest {
            html_content: other.map(str::to_string),
            options,
        }),
    }
}

/// Blocking front for [`RelayClient`].
///
/// Usable from plain threads and from inside a tokio runtime of either
/// flavor. A runtime built for one dispatch is always dropped outside of
/// async context.
pub struct Dispatcher {
    client: RelayClient,
}

fn dispatch_runtime() -> Result<Runtime> {
    runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to construct dispatch runtime")
}

impl Dispatcher {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            client: RelayClient::new(config),
        }
    }

    pub fn with_connector(connector: Arc<dyn Connector>) -> Self {
        Self {
            client: RelayClient::with_connector(connector),
        }
    }

    fn block_on<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
        T: Send,
    {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(fut))
            }
            Ok(_) => {
                // a current-thread runtime cannot be blocked; drive the
                // request on a helper thread that owns its own runtime
                std::thread::scope(|scope| {
                    let worker = scope.spawn(|| dispatch_runtime()?.block_on(fut));
                    match worker.join() {
                        Ok(result) => result,
                        Err(panic) => std::panic::resume_unwind(panic),
                    }
                })
            }
            Err(_) => dispatch_runtime()?.block_on(fut),
        }
    }

    /// Send `request` to the service rooted at `base_url`, exactly once.
    ///
    /// `Err` means no HTTP response was obtained at all.
    pub fn dispatch(&self, base_url: &str, request: &RelayRequest) -> Result<DispatchOutcome> {
        let started = Instant::now();
        debug!(
            target: "cmdrelay::dispatch",
            endpoint = request.endpoint().path(),
            transport = ?self.client.transport_endpoint(),
            "dispatching command"
        );

        let response = self.block_on(self.client.convert(base_url, request))?;
        let status = response.status();
        info!(
            target: "cmdrelay::dispatch",
            endpoint = request.endpoint().path(),
            status = status.as_u16(),
            duration_ms = started.elapsed().as_millis() as u64,
            "conversion service responded"
        );

        if status == StatusCode::OK {
            Ok(DispatchOutcome::Succeeded(response.into_body()))
        } else {
            Ok(DispatchOutcome::Rejected(status))
        }
    }
}
