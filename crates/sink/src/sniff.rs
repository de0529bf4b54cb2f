//! Content-type detection from leading bytes.

pub const OCTET_STREAM: &str = "application/octet-stream";

const SNIFF_WINDOW: usize = 512;

const SIGNATURES: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1f\x8b", "application/gzip"),
    (b"%!PS", "application/postscript"),
];

/// Guess the MIME type of `bytes`, falling back to [`OCTET_STREAM`].
pub fn sniff_content_type(bytes: &[u8]) -> &'static str {
    if let Some((_, mime)) = SIGNATURES.iter().find(|(magic, _)| bytes.starts_with(magic)) {
        return mime;
    }
    if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return "image/webp";
    }

    let head = &bytes[..bytes.len().min(SNIFF_WINDOW)];
    let text = match std::str::from_utf8(head) {
        Ok(text) => text,
        // a multi-byte character cut by the window edge
        Err(err) if err.error_len().is_none() => {
            std::str::from_utf8(&head[..err.valid_up_to()]).unwrap_or_default()
        }
        Err(_) => return OCTET_STREAM,
    };
    let lowered = text.trim_start().to_ascii_lowercase();
    if lowered.starts_with("<!doctype html") || lowered.starts_with("<html") {
        "text/html"
    } else if lowered.starts_with("<svg") {
        "image/svg+xml"
    } else if lowered.starts_with("<?xml") {
        if lowered.contains("<svg") {
            "image/svg+xml"
        } else {
            "application/xml"
        }
    } else if !text.is_empty() && !text.contains('\0') {
        "text/plain"
    } else {
        OCTET_STREAM
    }
}
