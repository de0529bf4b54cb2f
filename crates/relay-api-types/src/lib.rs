//! Request models for the remote conversion service.

use serde::{Deserialize, Serialize};

/// Conversion endpoints exposed by the service, relative to its base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    PdfFromUrl,
    PdfFromHtml,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Self::PdfFromUrl => "/pdf-from-url",
            Self::PdfFromHtml => "/pdf-from-html",
        }
    }

    /// Join this endpoint onto a base URL, tolerating a trailing slash.
    pub fn url(&self, base: &str) -> String {
        format!("{}{}", base.trim_end_matches('/'), self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfFromUrlRequest {
    pub url: String,
    /// Escaped argument tokens joined by single spaces.
    pub options: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfFromHtmlRequest {
    pub html_content: Option<String>,
    /// Escaped argument tokens joined by single spaces.
    pub options: String,
}

/// One conversion request, serialized as the bare body of its endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RelayRequest {
    FromUrl(PdfFromUrlRequest),
    FromHtml(PdfFromHtmlRequest),
}

impl RelayRequest {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::FromUrl(_) => Endpoint::PdfFromUrl,
            Self::FromHtml(_) => Endpoint::PdfFromHtml,
        }
    }

    pub fn options(&self) -> &str {
        match self {
            Self::FromUrl(req) => &req.options,
            Self::FromHtml(req) => &req.options,
        }
    }
}
