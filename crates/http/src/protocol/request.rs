//! HTTP request head handling.
//!
//! This server never carries request bodies, so a request is fully described
//! by its head. [`RequestHeader`] wraps `http::Request<()>` and adds the
//! accessors the preview layer cares about.

use http::header;
use http::request::Parts;
use http::{HeaderMap, Method, Request, Uri, Version};

/// A decoded HTTP request head.
#[derive(Debug)]
pub struct RequestHeader {
    inner: Request<()>,
}

impl AsRef<Request<()>> for RequestHeader {
    fn as_ref(&self) -> &Request<()> {
        &self.inner
    }
}

impl RequestHeader {
    /// Consumes the header and returns the inner `Request<()>`.
    pub fn into_inner(self) -> Request<()> {
        self.inner
    }

    /// Returns a reference to the request's HTTP method.
    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    /// Returns a reference to the request's URI.
    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    /// Returns the request's HTTP version.
    pub fn version(&self) -> Version {
        self.inner.version()
    }

    /// Returns a reference to the request's headers.
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Returns the `If-None-Match` validator, if the client sent one that is
    /// valid visible ASCII.
    pub fn if_none_match(&self) -> Option<&str> {
        self.headers().get(header::IF_NONE_MATCH).and_then(|value| value.to_str().ok())
    }

    /// Whether the head announces a message body.
    ///
    /// Any `Transfer-Encoding` counts, as does a `Content-Length` other than
    /// a literal zero. An unparseable `Content-Length` counts as well, so the
    /// decoder refuses it rather than misreading the framing.
    pub fn declares_body(&self) -> bool {
        if self.headers().contains_key(header::TRANSFER_ENCODING) {
            return true;
        }

        match self.headers().get(header::CONTENT_LENGTH) {
            None => false,
            Some(value) => match value.to_str().ok().and_then(|s| s.trim().parse::<u64>().ok()) {
                Some(length) => length > 0,
                None => true,
            },
        }
    }
}

/// Converts request parts into a RequestHeader.
impl From<Parts> for RequestHeader {
    #[inline]
    fn from(parts: Parts) -> Self {
        Self { inner: Request::from_parts(parts, ()) }
    }
}

/// Converts a bodyless request into a RequestHeader.
impl From<Request<()>> for RequestHeader {
    #[inline]
    fn from(inner: Request<()>) -> Self {
        Self { inner }
    }
}
