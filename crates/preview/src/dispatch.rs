//! The per-request state machine.
//!
//! One dispatcher serves every connection; it holds nothing but the
//! immutable serving root, so requests share no state and cannot race. Each
//! request walks the same ladder and every rung maps a failure to a status:
//!
//! 1. method check — anything but GET/HEAD is `405` with `Allow: GET, HEAD`
//! 2. percent-decode — a malformed escape or non-UTF-8 result is `400`
//! 3. null-byte strip — decoded NUL bytes are removed before any
//!    filesystem join
//! 4. resolve and certify — a path outside the root is `403`
//! 5. locate — no servable file is `404`
//! 6. conditional build — `200` or `304`
//!
//! Decoding is deliberately single-pass: `%252e%252e` decodes once to the
//! literal text `%2e%2e`, which is just a nonexistent filename, not a
//! traversal. Recursive decoding would reclassify such inputs and is out.

use std::borrow::Cow;
use std::convert::Infallible;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderValue, Method, Response, StatusCode, header};
use percent_encoding::percent_decode_str;
use tracing::{debug, error, warn};

use transcript_http::handler::Handler;
use transcript_http::protocol::RequestHeader;

use crate::conditional::build_response;
use crate::locate::locate;
use crate::resolve::{is_within_root, normalize};

/// Top-level request handler for the preview server.
pub struct Dispatcher {
    root: PathBuf,
}

impl Dispatcher {
    /// Creates a dispatcher serving `root`, which must already be absolute
    /// and canonical (the binary canonicalizes before the server starts).
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    async fn respond(&self, request: &RequestHeader) -> Response<Bytes> {
        let head = match request.method() {
            &Method::GET => false,
            &Method::HEAD => true,
            method => {
                debug!(%method, "method not allowed");
                return method_not_allowed();
            }
        };

        let raw_path = request.uri().path();
        let decoded = match decode_path(raw_path) {
            Some(decoded) => decoded,
            None => {
                debug!(path = raw_path, "malformed percent-encoding");
                return status_only(StatusCode::BAD_REQUEST);
            }
        };

        // NUL can truncate paths inside OS file APIs; drop it after
        // decoding and before any filesystem join
        let sanitized = decoded.replace('\0', "");
        let wants_dir = sanitized.ends_with('/');

        let resolved = normalize(&self.root.join(sanitized.trim_start_matches('/')));
        if !is_within_root(&self.root, &resolved) {
            warn!(path = raw_path, "rejected path escaping the preview root");
            return status_only(StatusCode::FORBIDDEN);
        }

        let file = match locate(&resolved, wants_dir).await {
            Some(file) => file,
            None => return status_only(StatusCode::NOT_FOUND),
        };

        match build_response(&file, request.if_none_match(), head).await {
            Ok(response) => response,
            Err(e) => {
                error!(cause = %e, file = %file.display(), "failed to build response");
                status_only(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

#[async_trait]
impl Handler for Dispatcher {
    type Error = Infallible;

    async fn call(&self, request: RequestHeader) -> Result<Response<Bytes>, Self::Error> {
        Ok(self.respond(&request).await)
    }
}

/// Single-pass percent-decoding with strict escape validation.
///
/// The decoder itself passes malformed escapes through untouched, which
/// would quietly turn a client error into a 404; scan for them first so a
/// bad escape is a `None` (and a 400 upstream). Non-UTF-8 results are
/// refused the same way.
fn decode_path(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if !(bytes.get(i + 1)?.is_ascii_hexdigit() && bytes.get(i + 2)?.is_ascii_hexdigit()) {
                return None;
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    match percent_decode_str(raw).decode_utf8() {
        Ok(Cow::Borrowed(s)) => Some(s.to_owned()),
        Ok(Cow::Owned(s)) => Some(s),
        Err(_) => None,
    }
}

fn status_only(status: StatusCode) -> Response<Bytes> {
    Response::builder().status(status).body(Bytes::new()).unwrap()
}

fn method_not_allowed() -> Response<Bytes> {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header(header::ALLOW, HeaderValue::from_static("GET, HEAD"))
        .body(Bytes::new())
        .unwrap()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use http::Request;
    use tempfile::TempDir;

    use super::*;

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<html>root</html>").unwrap();
        fs::write(dir.path().join("test.txt"), "Hello World").unwrap();
        fs::write(dir.path().join("secret.txt"), "classified").unwrap();
        fs::write(dir.path().join("style.abcd1234.css"), "body{}").unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();
        fs::write(dir.path().join("subdir/index.html"), "<html>sub</html>").unwrap();
        dir
    }

    fn request(method: &str, path: &str) -> RequestHeader {
        RequestHeader::from(Request::builder().method(method).uri(path).body(()).unwrap())
    }

    async fn dispatch(dir: &TempDir, method: &str, path: &str) -> Response<Bytes> {
        let dispatcher = Dispatcher::new(dir.path().canonicalize().unwrap());
        dispatcher.respond(&request(method, path)).await
    }

    #[tokio::test]
    async fn plain_file_is_served() {
        let dir = site();
        let response = dispatch(&dir, "GET", "/test.txt").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "11");
        assert_eq!(response.body().as_ref(), b"Hello World");
    }

    #[tokio::test]
    async fn root_serves_index_html() {
        let dir = site();
        let response = dispatch(&dir, "GET", "/").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), b"<html>root</html>");
    }

    #[tokio::test]
    async fn subdir_with_slash_serves_its_index() {
        let dir = site();
        let response = dispatch(&dir, "GET", "/subdir/").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), b"<html>sub</html>");
    }

    #[tokio::test]
    async fn encoded_traversal_is_forbidden() {
        let dir = site();
        let response = dispatch(&dir, "GET", "/%2e%2e%2fetc/passwd").await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn plain_traversal_is_forbidden() {
        let dir = site();
        let response = dispatch(&dir, "GET", "/../outside.txt").await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn collapsed_traversal_inside_root_is_not_found() {
        // a browser collapses /subdir/%2e%2e/%2e%2e/etc/passwd before
        // sending; the surviving path sits inside the root but names
        // nothing on disk
        let dir = site();
        let response = dispatch(&dir, "GET", "/etc/passwd").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn double_encoded_traversal_is_just_a_filename() {
        let dir = site();
        let response = dispatch(&dir, "GET", "/%252e%252e/etc/passwd").await;

        // single-pass decode leaves the literal text "%2e%2e", which does
        // not exist on disk
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_escape_is_bad_request() {
        let dir = site();
        assert_eq!(dispatch(&dir, "GET", "/bad%zz").await.status(), StatusCode::BAD_REQUEST);
        assert_eq!(dispatch(&dir, "GET", "/truncated%2").await.status(), StatusCode::BAD_REQUEST);
        assert_eq!(dispatch(&dir, "GET", "/lone%").await.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_utf8_escape_is_bad_request() {
        let dir = site();
        let response = dispatch(&dir, "GET", "/%ff%fe").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn null_byte_cannot_truncate_a_path() {
        let dir = site();
        // stripping the NUL yields "secret.ignored", which must miss; the
        // NUL must never make the OS open "secret.txt"
        let response = dispatch(&dir, "GET", "/secret%00.ignored").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn post_is_method_not_allowed() {
        let dir = site();
        let response = dispatch(&dir, "POST", "/test.txt").await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, HEAD");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = site();
        assert_eq!(dispatch(&dir, "GET", "/missing.txt").await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn head_has_headers_but_no_body() {
        let dir = site();
        let get = dispatch(&dir, "GET", "/test.txt").await;
        let head = dispatch(&dir, "HEAD", "/test.txt").await;

        assert_eq!(get.status(), StatusCode::OK);
        assert_eq!(head.status(), StatusCode::OK);
        assert_eq!(get.headers(), head.headers());
        assert!(head.body().is_empty());
    }

    #[tokio::test]
    async fn hashed_asset_is_long_cached() {
        let dir = site();
        let response = dispatch(&dir, "GET", "/style.abcd1234.css").await;

        assert_eq!(response.headers()[header::CACHE_CONTROL], "public, max-age=31536000, immutable");
    }

    #[test]
    fn decode_path_behavior() {
        assert_eq!(decode_path("/plain/path"), Some("/plain/path".to_string()));
        assert_eq!(decode_path("/a%20b"), Some("/a b".to_string()));
        assert_eq!(decode_path("/%2e%2e/x"), Some("/../x".to_string()));
        // one decoding pass only
        assert_eq!(decode_path("/%252e%252e"), Some("/%2e%2e".to_string()));
        assert_eq!(decode_path("/bad%zz"), None);
        assert_eq!(decode_path("/short%2"), None);
        assert_eq!(decode_path("/%ff"), None);
    }
}
