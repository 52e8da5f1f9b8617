//! Conditional response building.
//!
//! Every served file is fingerprinted with a weak validator computed over
//! its full content. A matching `If-None-Match` turns the response into a
//! bodyless `304` carrying only the validator; everything else is a `200`
//! with explicit type, length, validator and cache policy. Generated files
//! are small, so content is read whole rather than streamed.

use std::io;
use std::path::Path;

use bytes::Bytes;
use http::{Response, StatusCode, header};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::mime::mime_for;

/// Policy for filenames that embed a content hash: any change produces a new
/// name, so clients may cache forever.
const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Policy for everything else: one hour, revalidated via the ETag after.
const CACHE_SHORT: &str = "public, max-age=3600";

/// A dot-separated run of at least 8 hex characters right before a known
/// static-asset extension, e.g. `style.abcd1234.css`.
static HASHED_ASSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.[0-9a-fA-F]{8,}\.(js|css|png|jpg|jpeg|gif|svg|woff|woff2)$").unwrap());

/// Builds the full GET/HEAD response for a located file.
///
/// HEAD runs the identical computation so its headers, including
/// `Content-Length` and `ETag`, match what GET would produce byte for byte;
/// only the body is omitted. I/O failures bubble up for the dispatcher to
/// turn into a 500.
pub async fn build_response(path: &Path, if_none_match: Option<&str>, head: bool) -> io::Result<Response<Bytes>> {
    let content = tokio::fs::read(path).await?;
    let etag = compute_etag(&content);

    if if_none_match == Some(etag.as_str()) {
        // validator only; no body, no content headers
        let response = Response::builder().status(StatusCode::NOT_MODIFIED).header(header::ETAG, etag.as_str()).body(Bytes::new()).unwrap();
        return Ok(response);
    }

    let length = content.len();
    let body = if head { Bytes::new() } else { Bytes::from(content) };
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime_for(path).as_ref())
        .header(header::CONTENT_LENGTH, length)
        .header(header::ETAG, etag.as_str())
        .header(header::CACHE_CONTROL, cache_control_for(path))
        .body(body)
        .unwrap();

    Ok(response)
}

/// Weak content fingerprint: `W/"<sha256-hex>"`.
///
/// Identical content always yields an identical validator; any one-byte
/// change yields a different one.
pub fn compute_etag(content: &[u8]) -> String {
    format!("W/\"{:x}\"", Sha256::digest(content))
}

fn cache_control_for(path: &Path) -> &'static str {
    let hashed = path.file_name().and_then(|name| name.to_str()).is_some_and(|name| HASHED_ASSET.is_match(name));
    if hashed { CACHE_IMMUTABLE } else { CACHE_SHORT }
}
