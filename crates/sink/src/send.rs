//! Download responses for a [`TempFile`].

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{self, HeaderMap, HeaderName, HeaderValue};
use hyper::Response;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::debug;

use crate::{sniff_content_type, SinkError, TempFile};

/// Headers sent with every download unless the caller overrides them.
pub const DEFAULT_HEADERS: &[(&str, &str)] = &[
    ("pragma", "public"),
    ("expires", "0"),
    ("cache-control", "must-revalidate, post-check=0, pre-check=0"),
    ("content-transfer-encoding", "binary"),
];

// RFC 5987 attr-char
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

const IOS_AGENTS: &[&str] = &["iphone", "ipad", "ipod"];

/// Caller-supplied value for one response header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderOverride {
    Value(String),
    /// Suppress the header entirely, including defaults and computed ones.
    Omit,
}

impl From<&str> for HeaderOverride {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Name offered to the client; enables `Content-Disposition`.
    pub filename: Option<String>,
    /// Explicit content type; sniffed from the file when unset.
    pub content_type: Option<String>,
    /// Ask the client to display rather than download.
    pub inline: bool,
    pub headers: Vec<(String, HeaderOverride)>,
}

impl SendOptions {
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn inline(mut self, inline: bool) -> Self {
        self.inline = inline;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<HeaderOverride>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

fn is_ios_client(request_headers: &HeaderMap) -> bool {
    request_headers
        .get(header::USER_AGENT)
        .and_then(|agent| agent.to_str().ok())
        .map(|agent| {
            let agent = agent.to_ascii_lowercase();
            IOS_AGENTS.iter().any(|device| agent.contains(device))
        })
        .unwrap_or(false)
}

fn content_disposition(filename: Option<&str>, inline: bool) -> String {
    let kind = if inline { "inline" } else { "attachment" };
    match filename {
        Some(name) => {
            let plain: String = name
                .chars()
                .map(|ch| if ch.is_ascii() && ch != '"' && ch != '\\' { ch } else { '_' })
                .collect();
            let encoded = utf8_percent_encode(name, ATTR_CHAR);
            format!("{kind}; filename=\"{plain}\"; filename*=UTF-8''{encoded}")
        }
        None => kind.to_string(),
    }
}

fn header_name(name: &str) -> Result<HeaderName, SinkError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|err| SinkError::InvalidHeader {
        name: name.to_string(),
        reason: err.to_string(),
    })
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, SinkError> {
    HeaderValue::from_str(value).map_err(|err| SinkError::InvalidHeader {
        name: name.to_string(),
        reason: err.to_string(),
    })
}

impl TempFile {
    /// Build a download response carrying the whole file.
    ///
    /// `request_headers` are those of the incoming request; only
    /// `User-Agent` is consulted, to leave out `Content-Length` for iOS
    /// clients. The body is read up front, so the file may be dropped as
    /// soon as this returns.
    pub fn send(
        &self,
        request_headers: &HeaderMap,
        options: &SendOptions,
    ) -> Result<Response<Full<Bytes>>, SinkError> {
        let body = self.content()?;
        let mut headers = HeaderMap::new();

        for &(name, value) in DEFAULT_HEADERS {
            headers.insert(header_name(name)?, HeaderValue::from_static(value));
        }

        let content_type = options
            .content_type
            .clone()
            .unwrap_or_else(|| sniff_content_type(&body).to_string());
        headers.insert(
            header::CONTENT_TYPE,
            header_value("content-type", &content_type)?,
        );

        if !is_ios_client(request_headers) {
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
        }

        if options.filename.is_some() || options.inline {
            let disposition = content_disposition(options.filename.as_deref(), options.inline);
            headers.insert(
                header::CONTENT_DISPOSITION,
                header_value("content-disposition", &disposition)?,
            );
        }

        for (name, value) in &options.headers {
            let key = header_name(name)?;
            match value {
                HeaderOverride::Value(value) => {
                    headers.insert(key, header_value(name, value)?);
                }
                HeaderOverride::Omit => {
                    headers.remove(key);
                }
            }
        }

        debug!(
            target: "cmdrelay::sink",
            path = %self.path().display(),
            bytes = body.len(),
            content_type = %content_type,
            "sending temporary file"
        );

        let mut response = Response::builder().body(Full::new(Bytes::from(body)))?;
        *response.headers_mut() = headers;
        Ok(response)
    }
}
